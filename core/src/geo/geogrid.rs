use log::debug;
use ndarray::ArrayView2;
use std::path::{Path, PathBuf};

use crate::geo::backend::RasterBackend;
use crate::geo::footprint::{Footprint, Grid, RasterGeometry, Unit};
use crate::prelude::{ensure_shape, RadarResult};

/// Geometry of the reference footprint and writer of results on that geometry.
pub struct GeoGrid<B: RasterBackend> {
    backend: B,
    footprint_path: PathBuf,
    footprint: Footprint,
}

impl<B: RasterBackend> GeoGrid<B> {
    /// Reads the footprint at `path` once; the dataset is closed before this returns.
    pub fn open(backend: B, path: impl AsRef<Path>) -> RadarResult<Self> {
        let footprint_path = path.as_ref().to_path_buf();
        let footprint = Footprint::read(&backend, &footprint_path)?;
        debug!(
            "footprint {}: {}x{} px, epsg {:?}",
            footprint_path.display(),
            footprint.geometry.cols,
            footprint.geometry.rows,
            footprint.projection.epsg
        );
        Ok(Self {
            backend,
            footprint_path,
            footprint,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn footprint(&self) -> &Footprint {
        &self.footprint
    }

    pub fn footprint_path(&self) -> &Path {
        &self.footprint_path
    }

    pub fn grid(&self, unit: Unit) -> Grid {
        self.footprint.grid(unit)
    }

    /// Writes `data` as a single-band float raster on the meter grid with the
    /// footprint's projection. `data` must be `(rows, cols)` of that grid.
    pub fn save_as_raster(&self, data: ArrayView2<f64>, path: &Path) -> RadarResult<()> {
        let grid = self.grid(Unit::Meters);
        ensure_shape(grid.shape(), data.dim())?;

        let geometry = RasterGeometry {
            transform: grid.transform(),
            cols: grid.cols,
            rows: grid.rows,
        };
        let values = data.mapv(|v| v as f32);
        self.backend
            .write_raster(path, &geometry, &self.footprint.projection, values.view())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::backend::memory::MemoryBackend;
    use crate::geo::footprint::{GeoTransform, ModelKind, Projection};
    use crate::prelude::RadarError;
    use ndarray::Array2;

    fn backend() -> MemoryBackend {
        MemoryBackend::with_footprint(
            "footprint.tif",
            RasterGeometry {
                transform: GeoTransform::new(0.0, 0.0, 1.0, 1.0),
                cols: 4,
                rows: 4,
            },
            Projection {
                kind: ModelKind::Projected,
                epsg: Some(3003),
                wkt: None,
                ..Projection::default()
            },
        )
    }

    #[test]
    fn footprint_is_read_once() {
        let grid = GeoGrid::open(backend(), "footprint.tif").unwrap();
        let _ = grid.grid(Unit::Kilometers);
        let _ = grid.grid(Unit::Meters);
        assert_eq!(*grid.backend().opened.borrow(), 1);
    }

    #[test]
    fn save_uses_meter_grid_and_footprint_projection() {
        let grid = GeoGrid::open(backend(), "footprint.tif").unwrap();
        let data = Array2::from_elem((4, 4), 2.5);
        grid.save_as_raster(data.view(), Path::new("day_5.3003.tif"))
            .unwrap();

        let stored = grid.backend().stored("day_5.3003.tif").unwrap();
        assert_eq!(stored.geometry.transform, GeoTransform::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(stored.projection.epsg, Some(3003));
        assert!(stored.data.unwrap().iter().all(|&v| v == 2.5));
    }

    #[test]
    fn save_rejects_mismatched_shape() {
        let grid = GeoGrid::open(backend(), "footprint.tif").unwrap();
        let err = grid
            .save_as_raster(Array2::<f64>::zeros((3, 4)).view(), Path::new("bad.tif"))
            .unwrap_err();
        assert!(matches!(
            err,
            RadarError::ShapeMismatch {
                expected: (4, 4),
                found: (3, 4)
            }
        ));
        assert!(grid.backend().stored("bad.tif").is_none());
    }

    #[test]
    fn missing_footprint_fails_open() {
        assert!(GeoGrid::open(backend(), "elsewhere.tif").is_err());
    }
}
