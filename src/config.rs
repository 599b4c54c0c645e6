use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::error::{HeightError, Result};
use crate::evaluate::BinEdges;
use crate::raster::DEFAULT_HEIGHT_CEILING;
use crate::tiles::SourceUrls;
use crate::zonal::CellSelection;

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::config::PipelineConfig;
    use crate::error::HeightError;
    use crate::zonal::CellSelection;

    #[test]
    fn defaults() {
        let config = PipelineConfig::default();

        assert_eq!(config.raster_epsg, 28992);
        assert_eq!(config.target_epsg, 4326);
        assert_eq!(config.height_ceiling, 1000.0);
        assert_eq!(config.output_nodata, -9999.0);
        assert_eq!(config.cell_selection, CellSelection::Touched);
        assert_eq!(config.estimate_attribute, "MeanValue");
        assert_eq!(config.roof_attribute, "dd_h_dak_m");
        assert_eq!(config.ground_attribute, "h_maaiveld");
        assert_eq!(config.catalog_code_attribute, "kaartbladNr");
    }

    #[test]
    fn reads_partial_config_files() {
        crate::test::with_input_and_output_paths(|input_path: PathBuf, _| {
            let path = input_path.join("config.json");
            fs::write(
                &path,
                r#"{ "height_ceiling": 300, "cell_selection": "centre", "bins": { "signed": [0, 1] } }"#,
            )
            .unwrap();

            let config = PipelineConfig::from_file(&path).unwrap();

            assert_eq!(config.height_ceiling, 300.0);
            assert_eq!(config.cell_selection, CellSelection::Centre);
            assert_eq!(config.bins.signed, vec![0.0, 1.0]);
            assert_eq!(config.bins.absolute, PipelineConfig::default().bins.absolute);
            assert_eq!(config.raster_epsg, 28992);
        })
        .unwrap();
    }

    #[test]
    fn missing_config_file() {
        assert!(matches!(
            PipelineConfig::from_file(&PathBuf::from("/nonexistent/config.json")),
            Err(HeightError::MissingInputFile(_))
        ));
    }
}

/// Tunables of a pipeline run. Every field is optional in the config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// EPSG code assumed for ASCII grids, which carry none
    pub raster_epsg: u32,
    /// EPSG code of the written estimate and evaluation layers
    pub target_epsg: u32,
    pub height_ceiling: f64,
    pub output_nodata: f64,
    pub cell_selection: CellSelection,
    pub estimate_attribute: String,
    pub roof_attribute: String,
    pub ground_attribute: String,
    pub bins: BinEdges,
    pub catalog_code_attribute: String,
    pub sources: SourceUrls,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            raster_epsg: 28992,
            target_epsg: 4326,
            height_ceiling: DEFAULT_HEIGHT_CEILING,
            output_nodata: -9999.0,
            cell_selection: CellSelection::default(),
            estimate_attribute: "MeanValue".to_string(),
            roof_attribute: "dd_h_dak_m".to_string(),
            ground_attribute: "h_maaiveld".to_string(),
            bins: BinEdges::default(),
            catalog_code_attribute: "kaartbladNr".to_string(),
            sources: SourceUrls::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(HeightError::MissingInputFile(path.to_path_buf()));
        }

        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}
