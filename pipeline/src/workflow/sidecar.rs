use anyhow::Context;
use radarcore::geo::{GeoGrid, GeoTransform, RasterBackend, Unit};
use std::fs;
use std::path::Path;

/// ESRI world file: A, D, B, E, then the centre of the upper-left pixel.
pub fn world_file_contents(transform: &GeoTransform) -> String {
    let gt = transform.to_gdal();
    let (x, y) = transform.pixel_center(0, 0);
    format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n",
        gt[1], gt[4], gt[2], gt[5], x, y
    )
}

/// Writes `.tfw` and, when the footprint carries WKT, `.prj` beside `raster_path`.
pub fn write_sidecars<B: RasterBackend>(geogrid: &GeoGrid<B>, raster_path: &Path) -> anyhow::Result<()> {
    let transform = geogrid.grid(Unit::Meters).transform();
    let tfw_path = raster_path.with_extension("tfw");
    fs::write(&tfw_path, world_file_contents(&transform))
        .with_context(|| format!("writing world file {}", tfw_path.display()))?;

    if let Some(wkt) = &geogrid.footprint().projection.wkt {
        let prj_path = raster_path.with_extension("prj");
        let normalized = geogrid.backend().normalize_projection(wkt);
        fs::write(&prj_path, normalized)
            .with_context(|| format!("writing projection {}", prj_path.display()))?;
    }
    Ok(())
}
