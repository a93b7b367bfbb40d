use std::path::{Path, PathBuf};

/// Common error type for the rainfall core.
#[derive(thiserror::Error, Debug)]
pub enum RadarError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("tiff error on {path}: {source}")]
    Tiff {
        path: PathBuf,
        #[source]
        source: tiff::TiffError,
    },
    #[error("image decode error on {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("{0} has an unsupported sample type")]
    UnsupportedSampleType(PathBuf),
    #[error("{0} carries no georeferencing tags")]
    MissingGeoreference(PathBuf),
    #[error("malformed geokey directory in {path}: {reason}")]
    MalformedGeoKeys { path: PathBuf, reason: String },
    #[error("{what} in {path} has length {len}, beyond what a geokey can address")]
    GeoKeyOverflow {
        path: PathBuf,
        what: &'static str,
        len: usize,
    },
    #[error("{0}: projection has a model type but no EPSG code, WKT or geokeys to write")]
    UnrepresentableProjection(PathBuf),
    #[error("{path} has {found} channels, expected at least 4")]
    ChannelCount { path: PathBuf, found: u8 },
    #[error("shape mismatch: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("frame {path} is {found:?}, earlier frames of the hour are {expected:?}")]
    FrameShapeMismatch {
        path: PathBuf,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[error("unknown grid unit {0:?} (expected \"km\" or \"m\")")]
    UnknownUnit(String),
}

pub type RadarResult<T> = Result<T, RadarError>;

impl RadarError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn tiff(path: &Path, source: tiff::TiffError) -> Self {
        Self::Tiff {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn image(path: &Path, source: image::ImageError) -> Self {
        Self::Image {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Fails with [`RadarError::ShapeMismatch`] unless both shapes agree.
pub fn ensure_shape(expected: (usize, usize), found: (usize, usize)) -> RadarResult<()> {
    if expected != found {
        return Err(RadarError::ShapeMismatch { expected, found });
    }
    Ok(())
}
