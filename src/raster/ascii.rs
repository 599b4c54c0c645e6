use std::fmt::Write;

use nom::{
    branch::alt,
    bytes::complete::tag_no_case,
    character::complete::{line_ending, space0, space1, u32 as u32_parser},
    combinator::{eof, map},
    error::ParseError,
    multi::separated_list0,
    number::complete::double,
    sequence::{delimited, preceded, terminated, tuple},
    IResult, Parser,
};

use super::{GeoTransform, RasterGrid};


#[derive(thiserror::Error, Debug)]
pub enum AsciiGridError {
    #[error("Missing NCOLS-Header")]
    MissingNColsHeader,

    #[error("Missing NROWS-Header")]
    MissingNRowsHeader,

    #[error("Missing CELLSIZE-Header (or DX- & DY-Header)")]
    MissingCellSizeHeader,

    #[error("Expected either XLLCENTER- & YLLCENTER-Header or XLLCORNER- & YLLCORNER-Header")]
    MissingOrigin,

    #[error("Row {} is too short", .0)]
    RowTooShort(usize),

    #[error("One or more rows are missing")]
    MissingRow,

    #[error("Cell size must be > 0")]
    CellSizeInvalid,

    #[error("Grid can't be stored as ASCII grid: {}", .0)]
    Unwritable(String),

    #[error("NOM returned an incomplete-error")]
    NomIncomplete,

    #[error("NOM returned an error: {}", .0.description())]
    Nom(nom::error::ErrorKind),
}

impl<I> ParseError<I> for AsciiGridError {
    fn from_error_kind(_: I, kind: nom::error::ErrorKind) -> Self {
        AsciiGridError::Nom(kind)
    }

    fn append(_: I, _: nom::error::ErrorKind, other: Self) -> Self {
        other
    }
}

impl From<AsciiGridError> for nom::Err<AsciiGridError> {
    fn from(e: AsciiGridError) -> Self {
        nom::Err::Failure(e)
    }
}

impl From<nom::Err<AsciiGridError>> for AsciiGridError {
    fn from(e: nom::Err<AsciiGridError>) -> Self {
        match e {
            nom::Err::Incomplete(_) => Self::NomIncomplete,
            nom::Err::Error(grid_err) => grid_err,
            nom::Err::Failure(grid_err) => grid_err,
        }
    }
}

#[derive(Debug)]
enum Header {
    NCols(usize),
    NRows(usize),
    XLLCenter(f64),
    XLLCorner(f64),
    YLLCenter(f64),
    YLLCorner(f64),
    CellSize(f64),
    Dx(f64),
    Dy(f64),
    NoDataValue(f64),
}

struct HeaderValues {
    columns: usize,
    rows: usize,
    left: f64,
    bottom: f64,
    dx: f64,
    dy: f64,
    no_data_value: f64,
}

const DEFAULT_NODATA: f64 = -9999.0;

/// Reader and writer for ESRI ASCII grids.
#[derive(Debug)]
pub struct AsciiGridParser {}

impl AsciiGridParser {
    fn header_line<'a, O, P>(
        name: &'static str,
        value: P,
    ) -> impl FnMut(&'a str) -> IResult<&'a str, O, AsciiGridError>
    where
        P: Parser<&'a str, O, AsciiGridError>,
    {
        delimited(
            tuple((space0, tag_no_case(name), space1)),
            value,
            tuple((space0, line_ending)),
        )
    }

    fn header_line_any(input: &str) -> IResult<&str, Header, AsciiGridError> {
        alt((
            map(Self::header_line("NCOLS", u32_parser), |v| Header::NCols(v as usize)),
            map(Self::header_line("NROWS", u32_parser), |v| Header::NRows(v as usize)),
            map(Self::header_line("XLLCENTER", double), Header::XLLCenter),
            map(Self::header_line("XLLCORNER", double), Header::XLLCorner),
            map(Self::header_line("YLLCENTER", double), Header::YLLCenter),
            map(Self::header_line("YLLCORNER", double), Header::YLLCorner),
            map(Self::header_line("CELLSIZE", double), Header::CellSize),
            map(Self::header_line("DX", double), Header::Dx),
            map(Self::header_line("DY", double), Header::Dy),
            map(Self::header_line("NODATA_VALUE", double), Header::NoDataValue),
        ))(input)
    }

    fn data_line(input: &str) -> IResult<&str, Vec<f64>, AsciiGridError> {
        terminated(
            preceded(space0, separated_list0(space1, double)),
            preceded(space0, alt((line_ending, eof))),
        )(input)
    }

    fn header(mut input: &str) -> IResult<&str, HeaderValues, AsciiGridError> {
        let mut columns: Option<usize> = None;
        let mut rows: Option<usize> = None;
        let mut x_center: Option<f64> = None;
        let mut y_center: Option<f64> = None;
        let mut x_corner: Option<f64> = None;
        let mut y_corner: Option<f64> = None;
        let mut cell_size: Option<f64> = None;
        let mut dx: Option<f64> = None;
        let mut dy: Option<f64> = None;
        let mut no_data_value: Option<f64> = None;

        loop {
            match Self::header_line_any(input) {
                Err(nom::Err::Error(_)) => break, // not a header line, the data starts here
                Err(err) => return Err(err),
                Ok((remaining_input, header)) => {
                    input = remaining_input;

                    match header {
                        Header::NCols(val) => columns = Some(val),
                        Header::NRows(val) => rows = Some(val),
                        Header::XLLCenter(val) => x_center = Some(val),
                        Header::XLLCorner(val) => x_corner = Some(val),
                        Header::YLLCenter(val) => y_center = Some(val),
                        Header::YLLCorner(val) => y_corner = Some(val),
                        Header::CellSize(val) => cell_size = Some(val),
                        Header::Dx(val) => dx = Some(val),
                        Header::Dy(val) => dy = Some(val),
                        Header::NoDataValue(val) => no_data_value = Some(val),
                    }
                }
            }
        }

        let columns = columns.ok_or(AsciiGridError::MissingNColsHeader)?;
        let rows = rows.ok_or(AsciiGridError::MissingNRowsHeader)?;

        let (dx, dy) = match (cell_size, dx, dy) {
            (Some(size), _, _) => (size, size),
            (None, Some(dx), Some(dy)) => (dx, dy),
            _ => return Err(AsciiGridError::MissingCellSizeHeader.into()),
        };

        if dx <= 0.0 || dy <= 0.0 {
            return Err(AsciiGridError::CellSizeInvalid.into());
        }

        // the *center headers name the centre of the lower left cell
        let (left, bottom) = match (x_center, y_center, x_corner, y_corner) {
            (Some(x), Some(y), _, _) => (x - dx / 2.0, y - dy / 2.0),
            (_, _, Some(x), Some(y)) => (x, y),
            _ => return Err(AsciiGridError::MissingOrigin.into()),
        };

        Ok((
            input,
            HeaderValues {
                columns,
                rows,
                left,
                bottom,
                dx,
                dy,
                no_data_value: no_data_value.unwrap_or(DEFAULT_NODATA),
            },
        ))
    }

    pub fn parse(i: &str, epsg: u32) -> Result<RasterGrid, AsciiGridError> {
        let (mut input, header) = Self::header(i)?;

        let mut cells: Vec<Option<f64>> = Vec::with_capacity(header.columns * header.rows);

        for row_index in 0..header.rows {
            if input.trim().is_empty() {
                return Err(AsciiGridError::MissingRow);
            }

            let (remaining_input, mut values) = Self::data_line(input)?;
            input = remaining_input;

            if values.len() < header.columns {
                return Err(AsciiGridError::RowTooShort(row_index));
            }
            values.truncate(header.columns);

            cells.extend(values.into_iter().map(|v| {
                if v.is_nan() || v == header.no_data_value {
                    None
                } else {
                    Some(v)
                }
            }));
        }

        let transform = GeoTransform {
            origin_x: header.left,
            pixel_width: header.dx,
            row_rotation: 0.0,
            origin_y: header.bottom + header.rows as f64 * header.dy,
            column_rotation: 0.0,
            pixel_height: -header.dy,
        };

        Ok(RasterGrid::new(header.rows, header.columns, transform, epsg, cells))
    }

    /// Serializes `grid`, writing missing cells as `no_data_value`.
    pub fn write(grid: &RasterGrid, no_data_value: f64) -> Result<String, AsciiGridError> {
        let transform = &grid.transform;
        if transform.is_rotated() {
            return Err(AsciiGridError::Unwritable("grid is rotated".to_string()));
        }
        if transform.pixel_width <= 0.0 || transform.pixel_height >= 0.0 {
            return Err(AsciiGridError::Unwritable("grid is not north-up".to_string()));
        }

        let (rows, columns) = grid.dimensions();
        let dx = transform.pixel_width;
        let dy = -transform.pixel_height;
        let bottom = transform.origin_y - rows as f64 * dy;

        let mut out = String::new();
        let fmt_err = |e: std::fmt::Error| AsciiGridError::Unwritable(e.to_string());

        writeln!(out, "ncols {}", columns).map_err(fmt_err)?;
        writeln!(out, "nrows {}", rows).map_err(fmt_err)?;
        writeln!(out, "xllcorner {}", transform.origin_x).map_err(fmt_err)?;
        writeln!(out, "yllcorner {}", bottom).map_err(fmt_err)?;
        if dx == dy {
            writeln!(out, "cellsize {}", dx).map_err(fmt_err)?;
        } else {
            writeln!(out, "dx {}", dx).map_err(fmt_err)?;
            writeln!(out, "dy {}", dy).map_err(fmt_err)?;
        }
        writeln!(out, "NODATA_value {}", no_data_value).map_err(fmt_err)?;

        for row in grid.to_rows() {
            let line: Vec<String> = row
                .iter()
                .map(|cell| cell.unwrap_or(no_data_value).to_string())
                .collect();
            writeln!(out, "{}", line.join(" ")).map_err(fmt_err)?;
        }

        Ok(out)
    }
}
