use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj, transform::transform};

use super::FeatureCollection;
use crate::error::{HeightError, Result};


/// PROJ.4 definitions for the reference systems the pipeline meets.
pub fn proj_string(epsg: u32) -> Option<&'static str> {
    match epsg {
        4326 => Some("+proj=longlat +datum=WGS84 +no_defs"),
        4258 => Some("+proj=longlat +ellps=GRS80 +towgs84=0,0,0,0,0,0,0 +no_defs"),
        3857 => Some("+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs"),
        28992 => Some(
            "+proj=sterea +lat_0=52.15616055555555 +lon_0=5.38763888888889 +k=0.9999079 \
             +x_0=155000 +y_0=463000 +ellps=bessel \
             +towgs84=565.417,50.3319,465.552,-0.398957,0.343988,-1.8774,4.0725 +units=m +no_defs",
        ),
        _ => None,
    }
}

fn is_geographic(epsg: u32) -> bool {
    matches!(epsg, 4326 | 4258)
}

struct Projections {
    from: Proj,
    to: Proj,
}

/// Converts coordinates between two EPSG codes. Geographic systems are in
/// degrees on both ends.
pub struct Reprojector {
    from_epsg: u32,
    to_epsg: u32,
    projections: Option<Projections>,
}

impl Reprojector {
    pub fn new(from_epsg: u32, to_epsg: u32) -> Result<Self> {
        let lookup = |epsg: u32| -> Result<Proj> {
            let definition = proj_string(epsg).ok_or(HeightError::UnsupportedEpsg(epsg))?;
            Proj::from_proj_string(definition)
                .map_err(|e| HeightError::Projection(format!("EPSG:{}: {:?}", epsg, e)))
        };

        let projections = if from_epsg == to_epsg {
            None
        } else {
            Some(Projections {
                from: lookup(from_epsg)?,
                to: lookup(to_epsg)?,
            })
        };

        Ok(Reprojector {
            from_epsg,
            to_epsg,
            projections,
        })
    }

    pub fn coord(&self, c: Coord<f64>) -> Result<Coord<f64>> {
        let projections = match &self.projections {
            None => return Ok(c),
            Some(p) => p,
        };

        let mut point = if is_geographic(self.from_epsg) {
            (c.x.to_radians(), c.y.to_radians(), 0.0)
        } else {
            (c.x, c.y, 0.0)
        };

        transform(&projections.from, &projections.to, &mut point).map_err(|e| {
            HeightError::Projection(format!(
                "EPSG:{} -> EPSG:{} at ({}, {}): {:?}",
                self.from_epsg, self.to_epsg, c.x, c.y, e
            ))
        })?;

        if is_geographic(self.to_epsg) {
            Ok(Coord {
                x: point.0.to_degrees(),
                y: point.1.to_degrees(),
            })
        } else {
            Ok(Coord { x: point.0, y: point.1 })
        }
    }

    pub fn multi_polygon(&self, shape: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>> {
        if self.projections.is_none() {
            return Ok(shape.clone());
        }
        shape.try_map_coords(|c| self.coord(c))
    }

    pub fn collection(&self, collection: &FeatureCollection) -> Result<FeatureCollection> {
        let mut out = collection.clone();
        for feature in out.iter_mut() {
            feature.geometry = self.multi_polygon(&feature.geometry)?;
        }
        out.epsg = self.to_epsg;
        Ok(out)
    }
}
