mod catalog;
mod resolver;
mod sources;

pub use catalog::TileCatalog;
pub use resolver::{resolve_tiles, Resolution, Strategy};
pub use sources::{Coverage, SourceUrls};
