use ndarray::ArrayView2;
use std::path::Path;

use crate::geo::footprint::{Projection, RasterGeometry};
use crate::prelude::RadarResult;

/// Raster and CRS collaborator used by [`GeoGrid`](crate::geo::GeoGrid).
///
/// A dataset returned by [`open_raster`](RasterBackend::open_raster) owns every
/// resource tied to the open file; dropping it releases them.
pub trait RasterBackend {
    type Dataset;

    fn open_raster(&self, path: &Path) -> RadarResult<Self::Dataset>;

    fn read_geometry(&self, dataset: &mut Self::Dataset) -> RadarResult<RasterGeometry>;

    fn read_projection(&self, dataset: &mut Self::Dataset) -> RadarResult<Projection>;

    /// Creates a single-band 32-bit float raster at `path`.
    fn write_raster(
        &self,
        path: &Path,
        geometry: &RasterGeometry,
        projection: &Projection,
        data: ArrayView2<f32>,
    ) -> RadarResult<()>;

    /// Rewrites WKT into the flavour expected by `.prj` consumers.
    fn normalize_projection(&self, wkt: &str) -> String;
}
