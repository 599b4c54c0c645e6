mod clip;
mod geojson_io;
mod reproject;

use std::collections::HashMap;

use geo::MultiPolygon;

pub use clip::{clip_to_boundary, merge_collections};
pub use geojson_io::{load_feature_collection, save_feature_collection};
pub use reproject::Reprojector;


/// Position of a feature in the collection it was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId(pub usize);

impl std::fmt::Display for FeatureId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum PropertyValue {
    Null,
    Bool(bool),
    String(String),
    Number(f64),
}

impl PropertyValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(v) if v.is_finite() => Some(*v),
            _ => None,
        }
    }
}

impl From<serde_json::Value> for PropertyValue {
    fn from(val: serde_json::Value) -> Self {
        Self::from(&val)
    }
}

impl From<&serde_json::Value> for PropertyValue {
    fn from(val: &serde_json::Value) -> Self {
        match val {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(v) => Self::Bool(*v),
            serde_json::Value::String(v) => Self::String(v.clone()),
            serde_json::Value::Number(v) => v.as_f64().map(Self::Number).unwrap_or(Self::Null),
            // nested values are kept verbatim, nothing downstream reads them
            other => Self::String(other.to_string()),
        }
    }
}

impl From<PropertyValue> for serde_json::Value {
    fn from(val: PropertyValue) -> Self {
        match val {
            PropertyValue::Null => serde_json::Value::Null,
            PropertyValue::Bool(b) => serde_json::Value::Bool(b),
            PropertyValue::String(s) => serde_json::Value::String(s),
            PropertyValue::Number(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
        }
    }
}

impl From<Option<f64>> for PropertyValue {
    fn from(val: Option<f64>) -> Self {
        val.map(PropertyValue::Number).unwrap_or(PropertyValue::Null)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Feature {
    pub geometry: MultiPolygon<f64>,
    pub properties: HashMap<String, PropertyValue>,
}

impl Feature {
    pub fn number(&self, attribute: &str) -> Option<f64> {
        self.properties.get(attribute).and_then(PropertyValue::as_f64)
    }
}

/// Ordered features in one spatial reference.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureCollection {
    pub epsg: u32,
    features: Vec<Feature>,
}

impl std::ops::Deref for FeatureCollection {
    type Target = Vec<Feature>;
    fn deref(&self) -> &Vec<Feature> {
        &self.features
    }
}

impl std::ops::DerefMut for FeatureCollection {
    fn deref_mut(&mut self) -> &mut Vec<Feature> {
        &mut self.features
    }
}

impl FeatureCollection {
    pub fn new(epsg: u32, features: Vec<Feature>) -> Self {
        FeatureCollection { epsg, features }
    }

    pub fn into_features(self) -> Vec<Feature> {
        self.features
    }

    pub fn enumerate(&self) -> impl Iterator<Item = (FeatureId, &Feature)> {
        self.features.iter().enumerate().map(|(i, f)| (FeatureId(i), f))
    }

    /// `minuend - subtrahend` per feature, `None` where either attribute is not a number.
    pub fn numeric_difference(&self, minuend: &str, subtrahend: &str) -> Vec<(FeatureId, Option<f64>)> {
        self.enumerate()
            .map(|(id, f)| {
                let value = match (f.number(minuend), f.number(subtrahend)) {
                    (Some(a), Some(b)) => Some(a - b),
                    _ => None,
                };
                (id, value)
            })
            .collect()
    }

    /// One numeric attribute per feature, `None` where it is absent or not a number.
    pub fn numbers(&self, attribute: &str) -> Vec<(FeatureId, Option<f64>)> {
        self.enumerate().map(|(id, f)| (id, f.number(attribute))).collect()
    }
}
