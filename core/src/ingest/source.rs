use log::debug;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::prelude::{RadarError, RadarResult};

/// Extension of frame files.
pub const FRAME_EXTENSION: &str = "png";

/// Lists the frames recorded within one hour of one day.
pub trait FrameSource {
    fn aggregate(&self, day: &str, hour: u32) -> RadarResult<Vec<PathBuf>>;
}

/// Frames stored flat under a root directory as `{day}_{hour}:{anything}.png`.
///
/// `day` is matched verbatim and `hour` unpadded. Only names are inspected.
#[derive(Debug, Clone)]
pub struct DirectoryFrameSource {
    root: PathBuf,
}

impl DirectoryFrameSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Filename prefix shared by every frame of `(day, hour)`.
pub fn frame_prefix(day: &str, hour: u32) -> String {
    format!("{}_{}:", day, hour)
}

impl FrameSource for DirectoryFrameSource {
    fn aggregate(&self, day: &str, hour: u32) -> RadarResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("frame root {} does not exist", self.root.display());
                return Ok(Vec::new());
            }
            Err(err) => return Err(RadarError::io(&self.root, err)),
        };

        let prefix = frame_prefix(day, hour);
        let suffix = format!(".{}", FRAME_EXTENSION);
        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RadarError::io(&self.root, e))?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.len() >= prefix.len() + suffix.len()
                && name.starts_with(&prefix)
                && name.ends_with(&suffix)
            {
                paths.push(entry.path());
            }
        }

        paths.sort();
        debug!("{} frames for {} hour {}", paths.len(), day, hour);
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::path::Path;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    #[test]
    fn matches_day_and_unpadded_hour_only() {
        let dir = tempdir().unwrap();
        for name in [
            "20180712_5:0000.png",
            "20180712_5:0030.png",
            "20180712_5:.png",
            "20180712_15:0000.png",
            "20180712_05:0000.png",
            "20180713_5:0000.png",
            "20180712_5:0000.png.bak",
            "20180712_5.png",
        ] {
            touch(dir.path(), name);
        }

        let source = DirectoryFrameSource::new(dir.path());
        let names: Vec<String> = source
            .aggregate("20180712", 5)
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            vec!["20180712_5:.png", "20180712_5:0000.png", "20180712_5:0030.png"]
        );
    }

    #[test]
    fn empty_hour_is_not_an_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "20180712_5:0000.png");
        let source = DirectoryFrameSource::new(dir.path());
        assert!(source.aggregate("20180712", 3).unwrap().is_empty());
    }

    #[test]
    fn missing_root_yields_no_frames() {
        let dir = tempdir().unwrap();
        let source = DirectoryFrameSource::new(dir.path().join("absent"));
        assert!(source.aggregate("20180712", 0).unwrap().is_empty());
    }
}
