use clap::{arg, Arg, ArgMatches};
use geo::{BoundingRect, Polygon};
use log::info;

use super::{existing_file, Command};
use crate::config::PipelineConfig;
use crate::feature::{load_feature_collection, FeatureCollection, Reprojector};
use crate::tiles::{resolve_tiles, Coverage, Resolution, SourceUrls, Strategy, TileCatalog};


pub struct ResolveTiles {}

impl Command for ResolveTiles {
    fn description(&self) -> &'static str {
        "Find the catalog tiles covering an area of interest and list their download URLs."
    }

    fn args(&self) -> Vec<Arg<'static>> {
        vec![
            arg!(--area <FILE> "GeoJSON boundary of the area of interest"),
            arg!(--catalog <FILE> "GeoJSON tile catalog"),
            Arg::new("neighbourhood")
                .long("neighbourhood")
                .value_name("CODE")
                .help("Neighbourhood code to build a boundary request for")
                .takes_value(true)
                .multiple_occurrences(true),
        ]
    }

    fn run(&self, args: &ArgMatches, config: &PipelineConfig) -> anyhow::Result<()> {
        let area = load_feature_collection(&existing_file(args, "area")?, config.raster_epsg)?;
        let catalog = load_feature_collection(&existing_file(args, "catalog")?, config.raster_epsg)?;
        let catalog = TileCatalog::from_collection(&catalog, &config.catalog_code_attribute)?;
        info!("ℹ️  Catalog holds {} tile(s)", catalog.entries.len());

        let polygons = polygons_in(&area, catalog.epsg)?;
        let resolution = resolve_tiles(&polygons, &catalog)?;

        let in_raster_crs = polygons_in(&area, config.raster_epsg)?;
        let bbox = match geo::MultiPolygon(in_raster_crs).bounding_rect() {
            Some(rect) => rect,
            None => anyhow::bail!("Area of interest is empty"),
        };

        let codes: Vec<&str> = args
            .values_of("neighbourhood")
            .map(|v| v.collect())
            .unwrap_or_default();

        let strategy = match resolution.strategy {
            Strategy::Within => "within",
            Strategy::Adjacent => "adjacent",
        };
        println!("{} ({})", resolution.suffixes.join(" "), strategy);
        for url in request_urls(&resolution, &config.sources, &bbox, config.raster_epsg, &codes) {
            println!("{}", url);
        }

        Ok(())
    }
}

fn polygons_in(area: &FeatureCollection, epsg: u32) -> anyhow::Result<Vec<Polygon<f64>>> {
    let area = Reprojector::new(area.epsg, epsg)?.collection(area)?;

    Ok(area.into_features().into_iter().flat_map(|f| f.geometry.0).collect())
}

/// Building archives per tile, both elevation coverages for the area's
/// bounding box and, when codes are given, the neighbourhood boundary request.
fn request_urls(
    resolution: &Resolution,
    sources: &SourceUrls,
    bbox: &geo::Rect<f64>,
    epsg: u32,
    neighbourhoods: &[&str],
) -> Vec<String> {
    let mut urls: Vec<String> = resolution
        .suffixes
        .iter()
        .map(|s| sources.building_tile(s))
        .collect();

    urls.push(sources.coverage(Coverage::Dsm, bbox, epsg));
    urls.push(sources.coverage(Coverage::Dtm, bbox, epsg));

    if !neighbourhoods.is_empty() {
        urls.push(sources.neighbourhood_boundaries(neighbourhoods));
    }

    urls
}
