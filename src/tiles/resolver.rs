use geo::{Centroid, Contains, MultiPoint, Point, Polygon, Relate};
use log::{debug, info};

use super::TileCatalog;
use crate::error::{HeightError, Result};


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// every area polygon lies within at least one tile
    Within,
    /// the tile under the area's centre plus all tiles touching it
    Adjacent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub suffixes: Vec<String>,
    pub strategy: Strategy,
}

/// Finds the catalog tiles whose data is needed for the area of interest.
///
/// Every tile that fully contains one of the area polygons is selected. When
/// none does, the area straddles tile edges: the tile containing the mean of
/// the polygon centroids is taken together with every tile touching it.
pub fn resolve_tiles(area: &[Polygon<f64>], catalog: &TileCatalog) -> Result<Resolution> {
    let mut suffixes: Vec<String> = Vec::new();

    for polygon in area {
        for entry in &catalog.entries {
            if polygon.relate(&entry.boundary).is_within() && !suffixes.contains(&entry.suffix) {
                suffixes.push(entry.suffix.clone());
            }
        }
    }

    if !suffixes.is_empty() {
        info!("ℹ️  Area lies within tile(s) {}", suffixes.join(", "));
        return Ok(Resolution {
            suffixes,
            strategy: Strategy::Within,
        });
    }

    debug!("no single tile contains the area, falling back to adjacent tiles");

    let centre = area_centre(area).ok_or(HeightError::NoMatchingTile)?;
    let (primary_index, primary) = catalog
        .entries
        .iter()
        .enumerate()
        .find(|(_, entry)| entry.boundary.contains(&centre))
        .ok_or(HeightError::NoMatchingTile)?;

    let neighbours: Vec<String> = catalog
        .entries
        .iter()
        .enumerate()
        .filter(|(i, entry)| *i != primary_index && entry.boundary.relate(&primary.boundary).is_touches())
        .map(|(_, entry)| entry.suffix.clone())
        .collect();

    if neighbours.is_empty() {
        return Err(HeightError::NoAdjacentTiles(primary.code.clone()));
    }

    let mut suffixes = vec![primary.suffix.clone()];
    suffixes.extend(neighbours);

    info!(
        "ℹ️  Area straddles tile edges, using {} and its neighbours {}",
        primary.code,
        suffixes[1..].join(", ")
    );

    Ok(Resolution {
        suffixes,
        strategy: Strategy::Adjacent,
    })
}

/// Mean of the distinct polygon centroids.
fn area_centre(area: &[Polygon<f64>]) -> Option<Point<f64>> {
    let mut centroids: Vec<Point<f64>> = Vec::new();
    for centroid in area.iter().filter_map(|p| p.centroid()) {
        if !centroids.contains(&centroid) {
            centroids.push(centroid);
        }
    }

    MultiPoint::new(centroids).centroid()
}
