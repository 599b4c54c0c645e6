use std::collections::HashMap;

use geo::{BoundingRect, Contains, MultiPolygon, Point, Relate};
use log::debug;
use rayon::prelude::*;
use serde::Deserialize;

use crate::error::{HeightError, Result};
use crate::feature::{Feature, FeatureCollection, FeatureId, PropertyValue, Reprojector};
use crate::raster::RasterGrid;


/// Which cells of the raster count as covered by a footprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellSelection {
    /// the cell's square shares interior with the footprint
    Touched,
    /// the cell's centre lies inside the footprint
    Centre,
}

impl Default for CellSelection {
    fn default() -> Self {
        CellSelection::Touched
    }
}

impl std::str::FromStr for CellSelection {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "touched" => Ok(CellSelection::Touched),
            "centre" | "center" => Ok(CellSelection::Centre),
            other => Err(format!("unknown cell selection {:?}", other)),
        }
    }
}

/// Mean of the non-missing raster cells covered by each feature.
///
/// Returns one entry per feature, in collection order. Features are
/// reprojected into the raster's EPSG code when the two differ.
pub fn zonal_mean(
    features: &FeatureCollection,
    raster: &RasterGrid,
    selection: CellSelection,
) -> Result<Vec<(FeatureId, Option<f64>)>> {
    let reprojected;
    let features = if features.epsg == raster.epsg {
        features
    } else {
        reprojected = Reprojector::new(features.epsg, raster.epsg)?.collection(features)?;
        &reprojected
    };

    let stats: Vec<(FeatureId, Option<f64>)> = features
        .as_slice()
        .par_iter()
        .enumerate()
        .map(|(i, f)| (FeatureId(i), footprint_mean(&f.geometry, raster, selection)))
        .collect();

    debug!(
        "{} of {} footprints cover measured cells",
        stats.iter().filter(|(_, v)| v.is_some()).count(),
        stats.len()
    );

    Ok(stats)
}

fn footprint_mean(shape: &MultiPolygon<f64>, raster: &RasterGrid, selection: CellSelection) -> Option<f64> {
    let extent = shape.bounding_rect()?;
    let (rows, cols) = raster.pixel_window(&extent)?;

    let mut sum = 0.0;
    let mut count = 0usize;

    for row in rows {
        for col in cols.clone() {
            let value = match raster.get(row, col) {
                Some(v) => v,
                None => continue,
            };

            let selected = match selection {
                CellSelection::Touched => {
                    let relation = raster.cell_polygon(row, col).relate(shape);
                    relation.is_intersects() && !relation.is_touches()
                }
                CellSelection::Centre => shape.contains(&Point::from(raster.cell_centre(row, col))),
            };

            if selected {
                sum += value;
                count += 1;
            }
        }
    }

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

/// Footprints paired with their statistic under `attribute`, in `target_epsg`.
/// Every other attribute is dropped.
pub fn estimates_layer(
    features: &FeatureCollection,
    stats: &[(FeatureId, Option<f64>)],
    attribute: &str,
    target_epsg: u32,
) -> Result<FeatureCollection> {
    let reprojector = Reprojector::new(features.epsg, target_epsg)?;

    let layer = stats
        .iter()
        .map(|(id, value)| {
            let source = features.get(id.0).ok_or(HeightError::MisalignedSequences {
                position: id.0,
                expected: id.0,
                found: features.len(),
            })?;
            Ok(Feature {
                geometry: reprojector.multi_polygon(&source.geometry)?,
                properties: HashMap::from([(attribute.to_string(), PropertyValue::from(*value))]),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::new(target_epsg, layer))
}
