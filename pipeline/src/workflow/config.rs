use anyhow::Context;
use radarcore::processing::DistanceCorrection;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CRS code baked into output names by default.
pub const DEFAULT_CRS_CODE: &str = "3003";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Directory receiving the hourly rasters; the working directory when unset.
    pub output_dir: Option<PathBuf>,
    pub crs_code: String,
    /// Also write `.tfw` and `.prj` sidecars next to each raster.
    pub write_world_file: bool,
    /// Log and continue past an hour that fails instead of aborting the run.
    pub skip_failed_hours: bool,
    pub distance_correction: DistanceCorrection,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            output_dir: None,
            crs_code: DEFAULT_CRS_CODE.to_string(),
            write_world_file: false,
            skip_failed_hours: false,
            distance_correction: DistanceCorrection::Disabled,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    /// `{day}_{hour}.{crs_code}.tif`
    pub fn output_name(&self, day: &str, hour: u32) -> String {
        format!("{}_{}.{}.tif", day, hour, self.crs_code)
    }

    pub fn output_path(&self, day: &str, hour: u32) -> PathBuf {
        let name = self.output_name(day, hour);
        match &self.output_dir {
            Some(dir) => dir.join(name),
            None => PathBuf::from(name),
        }
    }
}
