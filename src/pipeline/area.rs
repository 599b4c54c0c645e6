use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use super::Layout;
use crate::config::PipelineConfig;
use crate::error::{HeightError, Result};
use crate::evaluate::{evaluate, evaluation_layer, EvaluationReport};
use crate::feature::{
    clip_to_boundary, load_feature_collection, merge_collections, save_feature_collection, FeatureCollection,
};
use crate::raster::{difference, fill_gaps, load_grid, save_grid, RasterGrid};
use crate::zonal::{estimates_layer, zonal_mean};


/// Outcome of one processed area.
#[derive(Debug, Clone, PartialEq)]
pub struct AreaSummary {
    pub name: String,
    pub buildings: usize,
    /// buildings that received a height estimate
    pub estimated: usize,
    pub report: EvaluationReport,
}

fn require(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(HeightError::MissingInputFile(path))
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Runs the whole chain for one area: fill the terrain model, build the height
/// model, estimate per-building heights and evaluate them.
pub fn process_area(name: &str, layout: &Layout, config: &PipelineConfig) -> Result<AreaSummary> {
    let start = Instant::now();
    info!("▶️  Processing {}", name);

    let dsm_path = require(layout.dsm(name))?;
    let dtm_path = require(layout.dtm(name))?;
    let boundary_path = require(layout.boundary(name))?;

    let height_model = build_height_model(name, &dsm_path, &dtm_path, layout, config)?;

    let boundary = load_feature_collection(&boundary_path, config.raster_epsg)?;
    let buildings = building_layer(name, layout, &boundary)?;

    let now = Instant::now();
    info!("▶️  Estimating heights of {} building(s)", buildings.len());
    let estimates = zonal_mean(&buildings, &height_model, config.cell_selection)?;
    let estimated = estimates.iter().filter(|(_, v)| v.is_some()).count();
    let layer = estimates_layer(&buildings, &estimates, &config.estimate_attribute, config.target_epsg)?;
    let estimates_path = layout.estimates(name);
    ensure_parent(&estimates_path)?;
    save_feature_collection(&estimates_path, &layer)?;
    info!("✔️  Estimated {} height(s) in {}ms", estimated, now.elapsed().as_millis());

    let truth = buildings.numeric_difference(&config.roof_attribute, &config.ground_attribute);
    let report = evaluate(&truth, &estimates, &config.bins)?;
    let evaluation_path = layout.evaluation(name);
    ensure_parent(&evaluation_path)?;
    save_feature_collection(&evaluation_path, &evaluation_layer(&buildings, &report, config.target_epsg)?)?;

    info!("🎉  Finished {} in {}ms", name, start.elapsed().as_millis());

    Ok(AreaSummary {
        name: name.to_string(),
        buildings: buildings.len(),
        estimated,
        report,
    })
}

fn build_height_model(
    name: &str,
    dsm_path: &Path,
    dtm_path: &Path,
    layout: &Layout,
    config: &PipelineConfig,
) -> Result<RasterGrid> {
    let now = Instant::now();
    info!("▶️  Filling terrain model");
    let dtm = load_grid(dtm_path, config.raster_epsg)?;
    let gaps = dtm.missing_count();
    let filled = fill_gaps(&dtm)?;
    let filled_path = layout.filled_dtm(name);
    ensure_parent(&filled_path)?;
    save_grid(&filled_path, &filled, config.output_nodata)?;
    info!("✔️  Filled {} cell(s) in {}ms", gaps, now.elapsed().as_millis());

    let now = Instant::now();
    info!("▶️  Building height model");
    let dsm = load_grid(dsm_path, config.raster_epsg)?;
    let dsm_gaps = dsm.missing_count();
    let dsm = if dsm_gaps > 0 {
        debug!("filling {} surface model cell(s)", dsm_gaps);
        fill_gaps(&dsm)?
    } else {
        dsm
    };
    let height_model = difference(&dsm, &filled, config.height_ceiling)?;
    let height_model_path = layout.height_model(name);
    ensure_parent(&height_model_path)?;
    save_grid(&height_model_path, &height_model, config.output_nodata)?;
    info!("✔️  Built height model in {}ms", now.elapsed().as_millis());

    Ok(height_model)
}

/// Building footprints of an area, clipped to its boundary.
///
/// The clipped layer is cached next to the tile directory and reused when
/// present; otherwise every GeoJSON tile file is merged in file name order.
pub fn building_layer(name: &str, layout: &Layout, boundary: &FeatureCollection) -> Result<FeatureCollection> {
    let cached = layout.building_layer(name);
    if cached.is_file() {
        info!("ℹ️  Reusing clipped buildings from {}", cached.display());
        return load_feature_collection(&cached, boundary.epsg);
    }

    let now = Instant::now();
    info!("▶️  Clipping buildings");
    let tiles_dir = require(layout.building_tiles(name))?;
    let files = tile_files(&tiles_dir)?;
    debug!("merging {} building tile(s)", files.len());

    let collections = files
        .iter()
        .map(|path| load_feature_collection(path, boundary.epsg))
        .collect::<Result<Vec<_>>>()?;
    let merged = merge_collections(collections, boundary.epsg)?;
    let clipped = clip_to_boundary(&merged, boundary)?;

    save_feature_collection(&cached, &clipped)?;
    info!(
        "✔️  Clipped {} of {} building(s) in {}ms",
        clipped.len(),
        merged.len(),
        now.elapsed().as_millis()
    );

    Ok(clipped)
}

fn tile_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for pattern in ["*.geojson", "*.geojson.gz"] {
        let pattern = dir.join(pattern);
        for entry in glob::glob(&pattern.to_string_lossy())? {
            files.push(entry?);
        }
    }
    files.sort();
    Ok(files)
}
