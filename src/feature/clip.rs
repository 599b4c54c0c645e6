use geo::{unary_union, Area, BooleanOps, BoundingRect, Intersects, MultiPolygon, Polygon};
use log::debug;

use super::{FeatureCollection, Reprojector};
use crate::error::Result;


/// Concatenates collections in order, reprojecting each into `epsg` first.
pub fn merge_collections(collections: Vec<FeatureCollection>, epsg: u32) -> Result<FeatureCollection> {
    let mut merged = FeatureCollection::new(epsg, Vec::new());

    for collection in collections {
        let collection = if collection.epsg == epsg {
            collection
        } else {
            Reprojector::new(collection.epsg, epsg)?.collection(&collection)?
        };
        merged.extend(collection.into_features());
    }

    Ok(merged)
}

/// Intersects every footprint with the union of the boundary polygons.
/// Footprints left without area are dropped; the rest keep their order and
/// attributes. `buildings` is reprojected into the boundary's EPSG code.
pub fn clip_to_boundary(buildings: &FeatureCollection, boundary: &FeatureCollection) -> Result<FeatureCollection> {
    let buildings = if buildings.epsg == boundary.epsg {
        buildings.clone()
    } else {
        Reprojector::new(buildings.epsg, boundary.epsg)?.collection(buildings)?
    };

    let parts: Vec<&Polygon<f64>> = boundary.iter().flat_map(|f| f.geometry.0.iter()).collect();
    let area: MultiPolygon<f64> = unary_union(parts);
    let extent = match area.bounding_rect() {
        Some(rect) => rect,
        None => return Ok(FeatureCollection::new(boundary.epsg, Vec::new())),
    };

    let total = buildings.len();
    let clipped: Vec<_> = buildings
        .into_features()
        .into_iter()
        .filter(|f| f.geometry.intersects(&extent))
        .filter_map(|mut f| {
            let geometry = f.geometry.intersection(&area);
            if geometry.unsigned_area() <= 0.0 {
                return None;
            }
            f.geometry = geometry;
            Some(f)
        })
        .collect();

    debug!("clipped {} footprints to {} inside the boundary", total, clipped.len());

    Ok(FeatureCollection::new(boundary.epsg, clipped))
}
