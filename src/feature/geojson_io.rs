use std::collections::HashMap;
use std::convert::TryFrom;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use flate2::bufread::GzDecoder;
use geo::{Geometry, MultiPolygon};
use geojson::{GeoJson, JsonObject};
use serde_json::json;

use super::{Feature, FeatureCollection};
use crate::error::{HeightError, Result};

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::fs;

    use geo::{polygon, MultiPolygon};

    use crate::error::HeightError;
    use crate::feature::geojson_io::{epsg_from_crs_name, parse_feature_collection};
    use crate::feature::{
        load_feature_collection, save_feature_collection, Feature, FeatureCollection, PropertyValue,
    };
    use crate::test::with_input_and_output_paths;

    const PDOK_STYLE: &str = r#"{
        "type": "FeatureCollection",
        "crs": { "type": "name", "properties": { "name": "urn:ogc:def:crs:EPSG::28992" } },
        "features": [
            { "type": "Feature", "properties": { "bu_code": "BU0001" },
              "geometry": { "type": "Polygon", "coordinates": [[[0,0],[4,0],[4,4],[0,4],[0,0]]] } },
            { "type": "Feature", "properties": { "bu_code": "BU0002", "area": 3 },
              "geometry": { "type": "MultiPolygon", "coordinates": [[[[5,5],[6,5],[6,6],[5,5]]]] } }
        ]
    }"#;

    #[test]
    fn reads_crs_member_and_keeps_order() {
        let collection = parse_feature_collection(PDOK_STYLE, 4326).unwrap();

        assert_eq!(collection.epsg, 28992);
        assert_eq!(collection.len(), 2);
        assert_eq!(
            collection[0].properties.get("bu_code"),
            Some(&PropertyValue::String("BU0001".to_string()))
        );
        assert_eq!(collection[1].number("area"), Some(3.0));
        assert_eq!(collection[0].geometry.0.len(), 1);
    }

    #[test]
    fn falls_back_to_the_default_epsg() {
        let input = r#"{ "type": "FeatureCollection", "features": [] }"#;

        assert_eq!(parse_feature_collection(input, 4326).unwrap().epsg, 4326);
    }

    #[test]
    fn rejects_non_polygonal_features() {
        let input = r#"{ "type": "FeatureCollection", "features": [
            { "type": "Feature", "properties": {}, "geometry": { "type": "Point", "coordinates": [1, 2] } }
        ] }"#;

        assert!(matches!(
            parse_feature_collection(input, 28992),
            Err(HeightError::UnsupportedGeometry(_))
        ));
    }

    #[test]
    fn understands_common_crs_names() {
        assert_eq!(epsg_from_crs_name("urn:ogc:def:crs:EPSG::28992"), Some(28992));
        assert_eq!(epsg_from_crs_name("EPSG:3857"), Some(3857));
        assert_eq!(epsg_from_crs_name("urn:ogc:def:crs:OGC:1.3:CRS84"), Some(4326));
        assert_eq!(epsg_from_crs_name("something else"), None);
    }

    #[test]
    fn saved_collections_load_back() {
        with_input_and_output_paths(|_, output_path| {
            let square = polygon![(x: 1.0, y: 1.0), (x: 2.0, y: 1.0), (x: 2.0, y: 2.0), (x: 1.0, y: 1.0)];
            let collection = FeatureCollection::new(
                28992,
                vec![Feature {
                    geometry: MultiPolygon(vec![square]),
                    properties: HashMap::from([
                        ("MeanValue".to_string(), PropertyValue::Null),
                        ("name".to_string(), PropertyValue::String("a".to_string())),
                    ]),
                }],
            );
            let path = output_path.join("out.geojson");

            save_feature_collection(&path, &collection).unwrap();

            assert!(fs::read_to_string(&path).unwrap().contains("EPSG::28992"));
            assert_eq!(load_feature_collection(&path, 4326).unwrap(), collection);
        })
        .unwrap();
    }
}

pub(crate) fn epsg_from_crs_name(name: &str) -> Option<u32> {
    if name.ends_with("CRS84") {
        return Some(4326);
    }
    if !name.contains("EPSG") {
        return None;
    }
    name.rsplit(':').next().and_then(|code| code.parse().ok())
}

fn crs_member(epsg: u32) -> JsonObject {
    let mut members = JsonObject::new();
    members.insert(
        "crs".to_string(),
        json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{}", epsg) }
        }),
    );
    members
}

fn epsg_from_members(members: &Option<JsonObject>) -> Option<u32> {
    members
        .as_ref()?
        .get("crs")?
        .pointer("/properties/name")?
        .as_str()
        .and_then(epsg_from_crs_name)
}

fn to_multi_polygon(geometry: Geometry<f64>) -> Result<MultiPolygon<f64>> {
    match geometry {
        Geometry::Polygon(p) => Ok(MultiPolygon(vec![p])),
        Geometry::MultiPolygon(mp) => Ok(mp),
        other => {
            let kind = match other {
                Geometry::Point(_) | Geometry::MultiPoint(_) => "point",
                Geometry::Line(_) | Geometry::LineString(_) | Geometry::MultiLineString(_) => "line",
                Geometry::GeometryCollection(_) => "geometry collection",
                _ => "rect or triangle",
            };
            Err(HeightError::UnsupportedGeometry(format!(
                "expected (multi)polygon, got {}",
                kind
            )))
        }
    }
}

fn convert_feature(index: usize, f: geojson::Feature) -> Result<Feature> {
    let gj_geo = f.geometry.ok_or_else(|| {
        HeightError::UnsupportedGeometry(format!("feature {} has no geometry", index))
    })?;
    let geometry = to_multi_polygon(Geometry::<f64>::try_from(gj_geo)?)?;

    let properties: HashMap<_, _> = match f.properties {
        Some(map) => map.into_iter().map(|(key, val)| (key, val.into())).collect(),
        None => HashMap::new(),
    };

    Ok(Feature { geometry, properties })
}

pub(crate) fn parse_feature_collection(s: &str, default_epsg: u32) -> Result<FeatureCollection> {
    let (features, members) = match s.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(fc) => (fc.features, fc.foreign_members),
        GeoJson::Feature(f) => (vec![f], None),
        GeoJson::Geometry(_) => {
            return Err(HeightError::UnsupportedGeometry(
                "expected a feature collection, got a bare geometry".to_string(),
            ))
        }
    };

    let epsg = epsg_from_members(&members).unwrap_or(default_epsg);
    let features = features
        .into_iter()
        .enumerate()
        .map(|(i, f)| convert_feature(i, f))
        .collect::<Result<Vec<_>>>()?;

    Ok(FeatureCollection::new(epsg, features))
}

/// Reads a GeoJSON feature collection, gunzipping `*.gz` paths. The EPSG code
/// comes from the legacy `crs` member when present.
pub fn load_feature_collection(path: &Path, default_epsg: u32) -> Result<FeatureCollection> {
    if !path.is_file() {
        return Err(HeightError::MissingInputFile(path.to_path_buf()));
    }

    let buf = BufReader::new(File::open(path)?);
    let mut s = String::new();
    if path.extension().map(|ext| ext == "gz").unwrap_or(false) {
        GzDecoder::new(buf).read_to_string(&mut s)?;
    } else {
        let mut buf = buf;
        buf.read_to_string(&mut s)?;
    }

    parse_feature_collection(&s, default_epsg)
}

pub fn save_feature_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    let features = collection
        .iter()
        .map(|f| {
            let properties: JsonObject = f
                .properties
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::from(v.clone())))
                .collect();

            geojson::Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(geojson::Value::from(&f.geometry))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    let fc = geojson::FeatureCollection {
        bbox: None,
        features,
        foreign_members: Some(crs_member(collection.epsg)),
    };

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &fc)?;
    writer.flush()?;

    Ok(())
}
