mod ascii;
mod diff;
mod fill;
mod grid;

use flate2::{bufread::GzDecoder, write::GzEncoder, Compression};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Write},
    path::Path,
};

use crate::error::{HeightError, Result};

pub use ascii::{AsciiGridError, AsciiGridParser};
pub use diff::{difference, DEFAULT_HEIGHT_CEILING};
pub use fill::fill_gaps;
pub use grid::{GeoTransform, RasterGrid};

#[cfg(test)]
mod tests {
    use crate::raster::{load_grid, save_grid, GeoTransform, RasterGrid};
    use crate::test::with_input_and_output_paths;

    #[test]
    fn saved_grids_load_back_plain_and_gzipped() {
        with_input_and_output_paths(|_, output_path| {
            let grid = RasterGrid::from_rows(
                vec![vec![Some(1.0), None], vec![Some(0.0), Some(2.5)]],
                GeoTransform::north_up(10.0, 20.0, 2.0),
                28992,
            );

            for name in ["grid.asc", "grid.asc.gz"] {
                let path = output_path.join(name);
                save_grid(&path, &grid, -9999.0).unwrap();
                assert_eq!(load_grid(&path, 28992).unwrap(), grid);
            }
        })
        .unwrap();
    }

    #[test]
    fn loading_an_absent_grid_reports_the_path() {
        with_input_and_output_paths(|input_path, _| {
            let missing = input_path.join("nope.asc");
            let err = load_grid(&missing, 28992).unwrap_err();
            assert!(err.to_string().contains("nope.asc"));
        })
        .unwrap();
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension().map(|ext| ext == "gz").unwrap_or(false)
}

/// Loads an ASCII grid, transparently gunzipping `*.gz` paths.
pub fn load_grid(path: &Path, epsg: u32) -> Result<RasterGrid> {
    if !path.is_file() {
        return Err(HeightError::MissingInputFile(path.to_path_buf()));
    }

    let buf = BufReader::new(File::open(path)?);
    let mut s = String::new();

    if is_gzipped(path) {
        GzDecoder::new(buf).read_to_string(&mut s)?;
    } else {
        let mut buf = buf;
        buf.read_to_string(&mut s)?;
    }

    Ok(AsciiGridParser::parse(&s, epsg)?)
}

pub fn save_grid(path: &Path, grid: &RasterGrid, no_data_value: f64) -> Result<()> {
    let text = AsciiGridParser::write(grid, no_data_value)?;
    let buf = BufWriter::new(File::create(path)?);

    if is_gzipped(path) {
        let mut enc = GzEncoder::new(buf, Compression::default());
        enc.write_all(text.as_bytes())?;
        enc.finish()?.flush()?;
    } else {
        let mut buf = buf;
        buf.write_all(text.as_bytes())?;
        buf.flush()?;
    }

    Ok(())
}
