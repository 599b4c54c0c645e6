use std::path::{Path, PathBuf};


/// Where the files of each area of interest live below a working directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Layout {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn data(&self) -> PathBuf {
        self.root.join("data")
    }

    fn output(&self) -> PathBuf {
        self.root.join("output")
    }

    /// Area names queued for processing, one per line.
    pub fn records(&self) -> PathBuf {
        self.data().join("nl_records.txt")
    }

    /// Area names already processed, one per line.
    pub fn processed(&self) -> PathBuf {
        self.data().join("processed_records.txt")
    }

    pub fn dsm(&self, name: &str) -> PathBuf {
        self.data().join("DSM").join(format!("{}_dsm_05m.asc", name))
    }

    pub fn dtm(&self, name: &str) -> PathBuf {
        self.data().join("DTM").join(format!("{}_dtm_05m.asc", name))
    }

    pub fn filled_dtm(&self, name: &str) -> PathBuf {
        self.data().join("DTM_filtered").join(format!("{}_dtm_05m.asc", name))
    }

    pub fn height_model(&self, name: &str) -> PathBuf {
        self.data().join("CHM_nl").join(format!("{}.asc", name))
    }

    pub fn boundary(&self, name: &str) -> PathBuf {
        self.data().join("boundary_nl").join(format!("{}.geojson", name))
    }

    /// Directory holding the downloaded building tiles of an area.
    pub fn building_tiles(&self, name: &str) -> PathBuf {
        self.data().join("boundary_building").join(name)
    }

    /// Building footprints clipped to the area boundary.
    pub fn building_layer(&self, name: &str) -> PathBuf {
        self.data()
            .join("boundary_building")
            .join(format!("{}_vector.geojson", name))
    }

    pub fn estimates(&self, name: &str) -> PathBuf {
        self.output()
            .join("estimated_building_height")
            .join(format!("{}.json", name))
    }

    pub fn evaluation(&self, name: &str) -> PathBuf {
        self.output().join(name).join(format!("{}_evaluation.geojson", name))
    }
}
