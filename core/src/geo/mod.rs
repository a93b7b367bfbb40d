pub mod backend;
pub mod footprint;
pub mod geogrid;
pub mod tiff_backend;

pub use backend::RasterBackend;
pub use footprint::{
    Footprint, GeoKeys, GeoTransform, Grid, ModelKind, Projection, RasterGeometry, Unit,
};
pub use geogrid::GeoGrid;
pub use tiff_backend::{TiffBackend, TiffDataset};
