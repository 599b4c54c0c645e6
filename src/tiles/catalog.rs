use geo::MultiPolygon;

use crate::error::{HeightError, Result};
use crate::feature::{FeatureCollection, PropertyValue};


/// The part of a tile code after the first `_`, lower-cased.
pub fn suffix_of(code: &str) -> Option<String> {
    code.split('_')
        .nth(1)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileCatalogEntry {
    pub code: String,
    pub suffix: String,
    pub boundary: MultiPolygon<f64>,
}

impl TileCatalogEntry {
    pub fn new(code: &str, boundary: MultiPolygon<f64>) -> Result<Self> {
        let suffix = suffix_of(code).ok_or_else(|| {
            HeightError::InvalidCatalog(format!("tile code {:?} has no suffix after '_'", code))
        })?;

        Ok(TileCatalogEntry {
            code: code.to_string(),
            suffix,
            boundary,
        })
    }
}

/// Reference index of the source data tiles, in catalog order.
#[derive(Debug, Clone, PartialEq)]
pub struct TileCatalog {
    pub epsg: u32,
    pub entries: Vec<TileCatalogEntry>,
}

impl TileCatalog {
    pub fn from_collection(collection: &FeatureCollection, code_attribute: &str) -> Result<Self> {
        let entries = collection
            .enumerate()
            .map(|(id, feature)| match feature.properties.get(code_attribute) {
                Some(PropertyValue::String(code)) => TileCatalogEntry::new(code, feature.geometry.clone()),
                _ => Err(HeightError::InvalidCatalog(format!(
                    "tile {} has no {:?} attribute",
                    id, code_attribute
                ))),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TileCatalog {
            epsg: collection.epsg,
            entries,
        })
    }
}
