use std::ops::Range;

use geo::{coord, Coord, LineString, Polygon, Rect};


const GEOREFERENCE_TOLERANCE: f64 = 1e-9;

/// Affine pixel-to-world mapping, in the usual six-parameter order:
///
/// ```text
/// x = origin_x + col * pixel_width  + row * row_rotation
/// y = origin_y + col * column_rotation + row * pixel_height
/// ```
///
/// `(col, row)` addresses the top-left corner of a cell, so the cell centre is
/// at `(col + 0.5, row + 0.5)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub column_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// Square cells, no rotation, origin at the top-left corner.
    #[cfg(test)]
    pub fn north_up(left: f64, top: f64, cell_size: f64) -> Self {
        GeoTransform {
            origin_x: left,
            pixel_width: cell_size,
            row_rotation: 0.0,
            origin_y: top,
            column_rotation: 0.0,
            pixel_height: -cell_size,
        }
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.column_rotation,
            self.pixel_height,
        ]
    }

    pub fn is_rotated(&self) -> bool {
        self.row_rotation != 0.0 || self.column_rotation != 0.0
    }

    pub fn apply(&self, col: f64, row: f64) -> Coord<f64> {
        coord! {
            x: self.origin_x + col * self.pixel_width + row * self.row_rotation,
            y: self.origin_y + col * self.column_rotation + row * self.pixel_height,
        }
    }

    /// World coordinate to fractional `(col, row)`. `None` for a degenerate transform.
    pub fn invert(&self, world: Coord<f64>) -> Option<(f64, f64)> {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.column_rotation;
        if det == 0.0 {
            return None;
        }

        let dx = world.x - self.origin_x;
        let dy = world.y - self.origin_y;
        let col = (dx * self.pixel_height - dy * self.row_rotation) / det;
        let row = (dy * self.pixel_width - dx * self.column_rotation) / det;

        Some((col, row))
    }
}

/// A single-band elevation grid. Missing measurements are `None`; the numeric
/// nodata sentinel only exists in the file formats.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterGrid {
    rows: usize,
    columns: usize,
    pub transform: GeoTransform,
    pub epsg: u32,
    /// row-major cell values, `columns` per row
    cells: Vec<Option<f64>>,
}

impl RasterGrid {
    /// # Panics
    /// Panics if `cells` does not hold exactly `rows * columns` values.
    pub fn new(
        rows: usize,
        columns: usize,
        transform: GeoTransform,
        epsg: u32,
        cells: Vec<Option<f64>>,
    ) -> Self {
        assert_eq!(
            cells.len(),
            rows * columns,
            "{}x{} grid needs {} cells",
            rows,
            columns,
            rows * columns
        );

        RasterGrid {
            rows,
            columns,
            transform,
            epsg,
            cells,
        }
    }

    /// Builds a grid from nested rows, e.g. in tests and small fixtures.
    ///
    /// # Panics
    /// Panics if the rows are ragged.
    #[cfg(test)]
    pub fn from_rows(rows: Vec<Vec<Option<f64>>>, transform: GeoTransform, epsg: u32) -> Self {
        let row_count = rows.len();
        let columns = rows.first().map(Vec::len).unwrap_or(0);
        let cells: Vec<Option<f64>> = rows.into_iter().flatten().collect();

        RasterGrid::new(row_count, columns, transform, epsg, cells)
    }

    /// Same georeference, new cell values.
    pub fn with_cells(&self, cells: Vec<Option<f64>>) -> Self {
        RasterGrid::new(self.rows, self.columns, self.transform, self.epsg, cells)
    }

    /// `(rows, columns)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.columns + col]
    }

    pub fn cells(&self) -> &[Option<f64>] {
        &self.cells
    }

    pub fn index_of(&self, offset: usize) -> (usize, usize) {
        (offset / self.columns, offset % self.columns)
    }

    pub fn missing_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_none()).count()
    }

    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        if self.columns == 0 {
            return vec![Vec::new(); self.rows];
        }
        self.cells.chunks(self.columns).map(<[_]>::to_vec).collect()
    }

    pub fn cell_centre(&self, row: usize, col: usize) -> Coord<f64> {
        self.transform.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    pub fn cell_polygon(&self, row: usize, col: usize) -> Polygon<f64> {
        let (c, r) = (col as f64, row as f64);
        let ring = vec![
            self.transform.apply(c, r),
            self.transform.apply(c + 1.0, r),
            self.transform.apply(c + 1.0, r + 1.0),
            self.transform.apply(c, r + 1.0),
            self.transform.apply(c, r),
        ];
        Polygon::new(LineString::new(ring), vec![])
    }

    /// Row and column ranges of the cells that may overlap `rect`, clamped to the grid.
    pub fn pixel_window(&self, rect: &Rect<f64>) -> Option<(Range<usize>, Range<usize>)> {
        let corners = [
            rect.min(),
            rect.max(),
            coord! { x: rect.min().x, y: rect.max().y },
            coord! { x: rect.max().x, y: rect.min().y },
        ];

        let mut col_min = f64::INFINITY;
        let mut col_max = f64::NEG_INFINITY;
        let mut row_min = f64::INFINITY;
        let mut row_max = f64::NEG_INFINITY;
        for corner in corners {
            let (col, row) = self.transform.invert(corner)?;
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        let clamp = |v: f64, upper: usize| -> usize { v.max(0.0).min(upper as f64) as usize };
        let rows = clamp(row_min.floor(), self.rows)..clamp(row_max.floor() + 1.0, self.rows);
        let cols = clamp(col_min.floor(), self.columns)..clamp(col_max.floor() + 1.0, self.columns);

        if rows.is_empty() || cols.is_empty() {
            return None;
        }
        Some((rows, cols))
    }

    pub fn check_same_georeference(&self, other: &RasterGrid) -> Result<(), String> {
        if self.epsg != other.epsg {
            return Err(format!("EPSG:{} vs EPSG:{}", self.epsg, other.epsg));
        }

        let a = self.transform.as_array();
        let b = other.transform.as_array();
        if a.iter().zip(b.iter()).any(|(x, y)| (x - y).abs() > GEOREFERENCE_TOLERANCE) {
            return Err(format!("geotransform {:?} vs {:?}", a, b));
        }

        Ok(())
    }
}
