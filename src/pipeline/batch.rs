use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

use log::{error, info};

use super::{process_area, AreaSummary, Layout};
use crate::config::PipelineConfig;
use crate::error::{HeightError, Result};

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use crate::config::PipelineConfig;
    use crate::error::HeightError;
    use crate::pipeline::batch::AreaError;
    use crate::pipeline::{read_area_names, run_batch, BatchState, Layout};

    #[test]
    fn failures_are_reported_and_the_batch_continues() {
        crate::test::with_input_and_output_paths(|input_path: PathBuf, _| {
            let layout = Layout::new(&input_path);
            let names = vec!["nowhere".to_string(), "elsewhere".to_string()];

            let (state, report) = run_batch(&names, BatchState::default(), &layout, &PipelineConfig::default(), false);

            assert!(report.succeeded.is_empty());
            assert_eq!(report.failed.len(), 2);
            assert_eq!(report.failed[1].name, "elsewhere");
            assert!(matches!(report.failed[0].source, HeightError::MissingInputFile(_)));
            assert!(state.processed().is_empty());
        })
        .unwrap();
    }

    #[test]
    fn processed_areas_are_skipped_unless_forced() {
        crate::test::with_input_and_output_paths(|input_path: PathBuf, _| {
            let layout = Layout::new(&input_path);
            let state = BatchState::from(vec!["done".to_string()]);
            let names = vec!["done".to_string()];

            let (state, report) = run_batch(&names, state, &layout, &PipelineConfig::default(), false);
            assert_eq!(report.skipped, vec!["done"]);
            assert!(report.failed.is_empty());

            let (state, report) = run_batch(&names, state, &layout, &PipelineConfig::default(), true);
            assert!(report.skipped.is_empty());
            assert_eq!(report.failed.len(), 1);
            assert_eq!(state.processed(), ["done"]);
        })
        .unwrap();
    }

    #[test]
    fn state_round_trips_through_a_file() {
        crate::test::with_input_and_output_paths(|_, output_path: PathBuf| {
            let path = output_path.join("processed.txt");

            assert!(BatchState::load(&path).unwrap().processed().is_empty());

            let state = BatchState::from(vec!["a".to_string(), "b".to_string()]);
            state.save(&path).unwrap();

            assert_eq!(BatchState::load(&path).unwrap(), state);
        })
        .unwrap();
    }

    #[test]
    fn area_names_skip_blank_lines() {
        crate::test::with_input_and_output_paths(|input_path: PathBuf, _| {
            let path = input_path.join("records.txt");
            fs::write(&path, "a1\n\n  b2 \r\nc3").unwrap();

            assert_eq!(read_area_names(&path).unwrap(), vec!["a1", "b2", "c3"]);
        })
        .unwrap();
    }

    #[test]
    fn area_error_names_the_area() {
        let err = AreaError::new("a1", HeightError::EmptyFeatureSet);

        assert_eq!(err.to_string(), "Area a1: No comparable feature pairs left after alignment");
    }
}

/// Names of the areas a batch has already finished, in completion order.
/// Names are only ever appended.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchState {
    processed: Vec<String>,
}

impl From<Vec<String>> for BatchState {
    fn from(processed: Vec<String>) -> Self {
        BatchState { processed }
    }
}

impl BatchState {
    #[cfg(test)]
    pub fn processed(&self) -> &[String] {
        &self.processed
    }

    pub fn contains(&self, name: &str) -> bool {
        self.processed.iter().any(|n| n == name)
    }

    fn record(&mut self, name: &str) {
        if !self.contains(name) {
            self.processed.push(name.to_string());
        }
    }

    /// Reads a state file, one name per line. An absent file is an empty state.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Ok(BatchState::default());
        }
        Ok(BatchState::from(read_area_names(path)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut text = self.processed.join("\n");
        text.push('\n');
        fs::write(path, text)?;
        Ok(())
    }
}

/// Reads area names, one per line, ignoring blank lines.
pub fn read_area_names(path: &Path) -> Result<Vec<String>> {
    if !path.is_file() {
        return Err(HeightError::MissingInputFile(path.to_path_buf()));
    }

    Ok(fs::read_to_string(path)?
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect())
}

#[derive(Debug)]
pub struct AreaError {
    pub name: String,
    pub source: HeightError,
}

impl AreaError {
    pub fn new(name: &str, source: HeightError) -> Self {
        AreaError {
            name: name.to_string(),
            source,
        }
    }
}

impl Display for AreaError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Area {}: {}", self.name, self.source)
    }
}

impl Error for AreaError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<AreaSummary>,
    pub skipped: Vec<String>,
    pub failed: Vec<AreaError>,
}

/// Processes every named area in order. A failing area is recorded in the
/// report and does not stop the batch. Areas already in `state` are skipped
/// unless `force` is set.
pub fn run_batch(
    names: &[String],
    mut state: BatchState,
    layout: &Layout,
    config: &PipelineConfig,
    force: bool,
) -> (BatchState, BatchReport) {
    let mut report = BatchReport::default();

    for name in names {
        if !force && state.contains(name) {
            info!("ℹ️  Skipping {}, already processed", name);
            report.skipped.push(name.clone());
            continue;
        }

        match process_area(name, layout, config) {
            Ok(summary) => {
                state.record(name);
                report.succeeded.push(summary);
            }
            Err(e) => {
                let e = AreaError::new(name, e);
                error!("❌ {}", e);
                report.failed.push(e);
            }
        }
    }

    (state, report)
}
