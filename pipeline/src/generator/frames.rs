use image::{Rgba, RgbaImage};
use radarcore::geo::{GeoTransform, Projection, RasterBackend, RasterGeometry, TiffBackend};
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::path::{Path, PathBuf};

/// Configuration for a synthetic radar frame.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    pub width: u32,
    pub height: u32,
    /// Raw count written to channel 0.
    pub signal: u8,
    /// Probability that a pixel is marked observed.
    pub coverage: f64,
    pub seed: u64,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            width: 4,
            height: 4,
            signal: 100,
            coverage: 1.0,
            seed: 0,
        }
    }
}

/// Writes `{day}_{hour}:{stamp}.png` under `root`.
pub fn write_frame(
    root: &Path,
    day: &str,
    hour: u32,
    stamp: &str,
    config: &FrameConfig,
) -> anyhow::Result<PathBuf> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut image = RgbaImage::new(config.width, config.height);
    for pixel in image.pixels_mut() {
        let alpha = if rng.gen_bool(config.coverage) { 255 } else { 0 };
        let clutter: u8 = rng.gen();
        *pixel = Rgba([config.signal, clutter, clutter, alpha]);
    }
    let path = root.join(format!("{}_{}:{}.png", day, hour, stamp));
    image.save(&path)?;
    Ok(path)
}

/// Writes a float footprint raster with the given placement and CRS.
pub fn write_footprint(
    path: &Path,
    transform: GeoTransform,
    cols: usize,
    rows: usize,
    projection: &Projection,
) -> anyhow::Result<()> {
    let geometry = RasterGeometry {
        transform,
        cols,
        rows,
    };
    let data = ndarray::Array2::<f32>::zeros((rows, cols));
    TiffBackend::new().write_raster(path, &geometry, projection, data.view())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use radarcore::ingest::{FrameDecoder, ImageFrameDecoder};
    use tempfile::tempdir;

    #[test]
    fn generated_frame_decodes_with_requested_signal() {
        let dir = tempdir().unwrap();
        let config = FrameConfig {
            width: 8,
            height: 3,
            signal: 77,
            coverage: 0.5,
            seed: 13,
        };
        let path = write_frame(dir.path(), "20180712", 4, "0010", &config).unwrap();
        assert!(path.ends_with("20180712_4:0010.png"));

        let frame = ImageFrameDecoder.decode(&path).unwrap();
        assert_eq!(frame.shape(), (3, 8));
        assert!(frame.signal.iter().all(|&s| s == 77));
        let observed = frame.mask.iter().filter(|&&m| m).count();
        assert!(observed > 0 && observed < 24);
    }
}
