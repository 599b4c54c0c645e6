use std::path::PathBuf;

use crate::raster::AsciiGridError;

pub type Result<T> = std::result::Result<T, HeightError>;

#[derive(thiserror::Error, Debug)]
pub enum HeightError {
    #[error("Grids differ in shape: top is {}x{}, bottom is {}x{}", .top.0, .top.1, .bottom.0, .bottom.1)]
    DimensionMismatch {
        top: (usize, usize),
        bottom: (usize, usize),
    },

    #[error("Grids are not aligned: {0}")]
    GeoreferenceMismatch(String),

    #[error("{0} grid still has {1} missing cell(s), fill it first")]
    UnfilledInput(&'static str, usize),

    #[error("Every cell of the grid is missing, nothing to interpolate from")]
    AllCellsMissing,

    #[error("No catalog tile contains the area of interest")]
    NoMatchingTile,

    #[error("Tile {0} has no adjacent tiles in the catalog")]
    NoAdjacentTiles(String),

    #[error("Invalid tile catalog: {0}")]
    InvalidCatalog(String),

    #[error("No comparable feature pairs left after alignment")]
    EmptyFeatureSet,

    #[error("Sequences disagree at position {position}: expected feature {expected}, found {found}")]
    MisalignedSequences {
        position: usize,
        expected: usize,
        found: usize,
    },

    #[error("Sequences differ in length: {truth} ground truth value(s), {estimates} estimate(s)")]
    SequenceLengthMismatch { truth: usize, estimates: usize },

    #[error("Couldn't find {}", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Unsupported geometry: {0}")]
    UnsupportedGeometry(String),

    #[error("EPSG:{0} is not supported")]
    UnsupportedEpsg(u32),

    #[error("Projection failed: {0}")]
    Projection(String),

    #[error(transparent)]
    AsciiGrid(#[from] AsciiGridError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Glob(#[from] glob::GlobError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    GeoJson(#[from] geojson::Error),
}
