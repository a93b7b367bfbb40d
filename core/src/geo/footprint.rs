use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::geo::backend::RasterBackend;
use crate::prelude::{RadarError, RadarResult};

/// Affine geotransform in GDAL order.
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    /// Usually negative (north-up rasters).
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Geographic coordinates of the centre of pixel `(col, row)`.
    pub fn pixel_center(&self, col: usize, row: usize) -> (f64, f64) {
        let col_f = col as f64 + 0.5;
        let row_f = row as f64 + 0.5;
        let x = self.origin_x + col_f * self.pixel_width + row_f * self.row_rotation;
        let y = self.origin_y + col_f * self.col_rotation + row_f * self.pixel_height;
        (x, y)
    }

    pub fn is_north_up(&self) -> bool {
        self.row_rotation == 0.0 && self.col_rotation == 0.0 && self.pixel_height < 0.0
    }
}

/// Unit in which grid pixel sizes are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "km")]
    Kilometers,
    #[serde(rename = "m")]
    Meters,
}

impl Unit {
    /// Scale applied to the footprint's (meter) pixel size.
    pub fn factor(self) -> f64 {
        match self {
            Unit::Kilometers => 0.001,
            Unit::Meters => 1.0,
        }
    }
}

impl FromStr for Unit {
    type Err = RadarError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "km" => Ok(Unit::Kilometers),
            "m" => Ok(Unit::Meters),
            other => Err(RadarError::UnknownUnit(other.to_string())),
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unit::Kilometers => f.write_str("km"),
            Unit::Meters => f.write_str("m"),
        }
    }
}

/// GeoTIFF model type of a coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ModelKind {
    Projected,
    Geographic,
    #[default]
    Unknown,
}

/// GeoKeyDirectory, GeoDoubleParams and GeoAsciiParams exactly as a GeoTIFF
/// carried them.
///
/// Keeps CRS definitions that neither an EPSG code nor a WKT citation can
/// express, such as user-defined projections built from individual keys.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeoKeys {
    pub directory: Vec<u16>,
    pub doubles: Vec<f64>,
    pub ascii: String,
}

/// Coordinate reference system attached to a raster.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Projection {
    pub kind: ModelKind,
    pub epsg: Option<u16>,
    pub wkt: Option<String>,
    /// Raw keys of the source file; written back in preference to `epsg`/`wkt`.
    pub geo_keys: Option<GeoKeys>,
}

impl Projection {
    /// Builds a projection from WKT text, inferring the model kind from its root keyword.
    pub fn from_wkt(wkt: impl Into<String>) -> Self {
        let wkt = wkt.into();
        let head = wkt.trim_start().to_ascii_uppercase();
        let kind = if head.starts_with("PROJCS") || head.starts_with("PROJCRS") {
            ModelKind::Projected
        } else if head.starts_with("GEOGCS") || head.starts_with("GEOGCRS") {
            ModelKind::Geographic
        } else {
            ModelKind::Unknown
        };
        Self {
            kind,
            epsg: None,
            wkt: Some(wkt),
            geo_keys: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.epsg.is_none() && self.wkt.is_none() && self.geo_keys.is_none()
    }
}

/// Width, height and placement of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGeometry {
    pub transform: GeoTransform,
    pub cols: usize,
    pub rows: usize,
}

/// Reference raster defining extent, resolution and CRS of every output.
///
/// Read once; every derived [`Grid`] is a pure function of this value.
#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub geometry: RasterGeometry,
    pub projection: Projection,
}

impl Footprint {
    /// Opens `path` through `backend`, copies out geometry and projection and
    /// releases the dataset before returning.
    pub fn read<B: RasterBackend>(backend: &B, path: &Path) -> RadarResult<Self> {
        let mut dataset = backend.open_raster(path)?;
        let geometry = backend.read_geometry(&mut dataset)?;
        let projection = backend.read_projection(&mut dataset)?;
        Ok(Self {
            geometry,
            projection,
        })
    }

    pub fn grid(&self, unit: Unit) -> Grid {
        let factor = unit.factor();
        let transform = &self.geometry.transform;
        Grid {
            origin_x: transform.origin_x,
            origin_y: transform.origin_y,
            pixel_width: factor * transform.pixel_width,
            pixel_height: factor * transform.pixel_height,
            cols: self.geometry.cols,
            rows: self.geometry.rows,
        }
    }
}

/// Footprint geometry with pixel sizes scaled to `unit`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Grid {
    pub origin_x: f64,
    pub origin_y: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub cols: usize,
    pub rows: usize,
}

impl Grid {
    /// Array shape `(rows, cols)` of every field on this grid.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// North-up transform without rotation terms.
    pub fn transform(&self) -> GeoTransform {
        GeoTransform::new(
            self.origin_x,
            self.origin_y,
            self.pixel_width,
            self.pixel_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn footprint() -> Footprint {
        Footprint {
            geometry: RasterGeometry {
                transform: GeoTransform::new(1_500_000.0, 5_100_000.0, 250.0, -250.0),
                cols: 6,
                rows: 4,
            },
            projection: Projection::default(),
        }
    }

    #[test]
    fn kilometer_grid_scales_pixel_size_only() {
        let fp = footprint();
        let m = fp.grid(Unit::Meters);
        let km = fp.grid(Unit::Kilometers);
        assert_relative_eq!(km.pixel_width, m.pixel_width * 0.001);
        assert_relative_eq!(km.pixel_height, m.pixel_height * 0.001);
        assert_eq!(km.origin_x, m.origin_x);
        assert_eq!(km.origin_y, m.origin_y);
        assert_eq!(km.shape(), (4, 6));
    }

    #[test]
    fn unit_parses_closed_set() {
        assert_eq!("km".parse::<Unit>().unwrap(), Unit::Kilometers);
        assert_eq!("m".parse::<Unit>().unwrap(), Unit::Meters);
        assert!(matches!(
            "miles".parse::<Unit>(),
            Err(RadarError::UnknownUnit(ref u)) if u == "miles"
        ));
    }

    #[test]
    fn gdal_coefficients_follow_gdal_order() {
        let gt = GeoTransform::new(10.0, 20.0, 2.0, -2.0);
        assert_eq!(gt.to_gdal(), [10.0, 2.0, 0.0, 20.0, 0.0, -2.0]);
        assert!(gt.is_north_up());
        assert_eq!(gt.pixel_center(0, 0), (11.0, 19.0));
    }

    #[test]
    fn projection_kind_follows_wkt_root() {
        assert_eq!(
            Projection::from_wkt("PROJCS[\"Monte Mario / Italy zone 1\"]").kind,
            ModelKind::Projected
        );
        assert_eq!(
            Projection::from_wkt("GEOGCS[\"WGS 84\"]").kind,
            ModelKind::Geographic
        );
    }
}
