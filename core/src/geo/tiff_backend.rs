//! GeoTIFF backend built on the `tiff` crate.
//!
//! Georeferencing is carried by the ModelPixelScale/ModelTiepoint pair (or
//! ModelTransformation for rotated and south-up grids), the CRS by the
//! GeoKeyDirectory with its GeoDoubleParams and GeoAsciiParams. Keys read from
//! a file are written back verbatim, so CRS definitions this module does not
//! interpret survive. A `.prj` sidecar next to the raster supplies WKT when
//! the file itself carries none.

use log::debug;
use ndarray::{Array2, ArrayView2};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;
use tiff::TiffResult;

use crate::geo::backend::RasterBackend;
use crate::geo::footprint::{GeoKeys, GeoTransform, ModelKind, Projection, RasterGeometry};
use crate::prelude::{RadarError, RadarResult};

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GEO_DOUBLE_PARAMS: u16 = 34736;
const GEO_ASCII_PARAMS: u16 = 34737;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GT_CITATION: u16 = 1026;
const GEOGRAPHIC_TYPE: u16 = 2048;
const GEOG_CITATION: u16 = 2049;
const PROJECTED_CS_TYPE: u16 = 3072;
const PCS_CITATION: u16 = 3073;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u16 = 2;
const USER_DEFINED: u16 = 32767;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// An open GeoTIFF. The file handle is closed when this value is dropped.
pub struct TiffDataset {
    path: PathBuf,
    decoder: Decoder<BufReader<File>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TiffBackend;

impl TiffBackend {
    pub fn new() -> Self {
        Self
    }

    /// Reads band 1 of a single-band float raster.
    pub fn read_band_f32(&self, path: &Path) -> RadarResult<Array2<f32>> {
        let mut dataset = self.open_raster(path)?;
        let (width, height) = dataset
            .decoder
            .dimensions()
            .map_err(|e| RadarError::tiff(path, e))?;
        let values = match dataset
            .decoder
            .read_image()
            .map_err(|e| RadarError::tiff(path, e))?
        {
            DecodingResult::F32(buf) => buf,
            DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
            DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
            DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
            _ => return Err(RadarError::UnsupportedSampleType(path.to_path_buf())),
        };
        let shape = (height as usize, width as usize);
        let len = values.len();
        Array2::from_shape_vec(shape, values).map_err(|_| RadarError::ShapeMismatch {
            expected: shape,
            found: (len / shape.1.max(1), shape.1),
        })
    }
}

impl RasterBackend for TiffBackend {
    type Dataset = TiffDataset;

    fn open_raster(&self, path: &Path) -> RadarResult<TiffDataset> {
        let file = File::open(path).map_err(|e| RadarError::io(path, e))?;
        let decoder =
            Decoder::new(BufReader::new(file)).map_err(|e| RadarError::tiff(path, e))?;
        Ok(TiffDataset {
            path: path.to_path_buf(),
            decoder,
        })
    }

    fn read_geometry(&self, dataset: &mut TiffDataset) -> RadarResult<RasterGeometry> {
        let path = dataset.path.clone();
        let (cols, rows) = dataset
            .decoder
            .dimensions()
            .map_err(|e| RadarError::tiff(&path, e))?;
        let pixel_is_point = find_values(&mut dataset.decoder, GEO_KEY_DIRECTORY)
            .and_then(|value| value.map(Value::into_u32_vec).transpose())
            .map_err(|e| RadarError::tiff(&path, e))?
            .map_or(false, |keys| raster_type(&keys) == Some(RASTER_PIXEL_IS_POINT));
        let transform = read_transform(&mut dataset.decoder, pixel_is_point)
            .map_err(|e| RadarError::tiff(&path, e))?
            .ok_or_else(|| RadarError::MissingGeoreference(path.clone()))?;
        Ok(RasterGeometry {
            transform,
            cols: cols as usize,
            rows: rows as usize,
        })
    }

    fn read_projection(&self, dataset: &mut TiffDataset) -> RadarResult<Projection> {
        let path = dataset.path.clone();
        let keys = find_values(&mut dataset.decoder, GEO_KEY_DIRECTORY)
            .and_then(|value| value.map(Value::into_u32_vec).transpose())
            .map_err(|e| RadarError::tiff(&path, e))?;
        let doubles = find_values(&mut dataset.decoder, GEO_DOUBLE_PARAMS)
            .and_then(|value| value.map(Value::into_f64_vec).transpose())
            .map_err(|e| RadarError::tiff(&path, e))?;
        let ascii = find_values(&mut dataset.decoder, GEO_ASCII_PARAMS)
            .and_then(|value| value.map(Value::into_string).transpose())
            .map_err(|e| RadarError::tiff(&path, e))?;

        let mut projection = match keys {
            Some(keys) => {
                let ascii = ascii.unwrap_or_default();
                let mut projection = parse_geo_keys(&path, &keys, &ascii)?;
                let directory = keys
                    .iter()
                    .map(|&k| u16::try_from(k))
                    .collect::<Result<Vec<u16>, _>>()
                    .map_err(|_| RadarError::MalformedGeoKeys {
                        path: path.clone(),
                        reason: "entry does not fit in 16 bits".to_string(),
                    })?;
                projection.geo_keys = Some(GeoKeys {
                    directory,
                    doubles: doubles.unwrap_or_default(),
                    ascii,
                });
                projection
            }
            None => Projection::default(),
        };

        if projection.wkt.is_none() {
            let sidecar = path.with_extension("prj");
            if sidecar.is_file() {
                let text = fs::read_to_string(&sidecar).map_err(|e| RadarError::io(&sidecar, e))?;
                debug!("projection for {} read from {}", path.display(), sidecar.display());
                let from_sidecar = Projection::from_wkt(text.trim());
                if projection.kind == ModelKind::Unknown {
                    projection.kind = from_sidecar.kind;
                }
                projection.wkt = from_sidecar.wkt;
            }
        }
        Ok(projection)
    }

    fn write_raster(
        &self,
        path: &Path,
        geometry: &RasterGeometry,
        projection: &Projection,
        data: ArrayView2<f32>,
    ) -> RadarResult<()> {
        let keys = output_geo_keys(path, projection)?;
        let file = File::create(path).map_err(|e| RadarError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        encode(&mut writer, geometry, keys.as_ref(), data).map_err(|e| RadarError::tiff(path, e))?;
        writer.flush().map_err(|e| RadarError::io(path, e))?;
        debug!(
            "wrote {}x{} float raster {}",
            geometry.cols,
            geometry.rows,
            path.display()
        );
        Ok(())
    }

    fn normalize_projection(&self, wkt: &str) -> String {
        wkt.lines().map(str::trim).collect()
    }
}

fn find_values<R: Read + Seek>(decoder: &mut Decoder<R>, code: u16) -> TiffResult<Option<Value>> {
    decoder.find_tag(tag(code))
}

fn raster_type(keys: &[u32]) -> Option<u16> {
    keys.get(4..)
        .unwrap_or(&[])
        .chunks_exact(4)
        .find(|entry| entry[0] == u32::from(GT_RASTER_TYPE) && entry[1] == 0)
        .and_then(|entry| u16::try_from(entry[3]).ok())
}

fn read_transform<R: Read + Seek>(
    decoder: &mut Decoder<R>,
    pixel_is_point: bool,
) -> TiffResult<Option<GeoTransform>> {
    let scale = find_values(decoder, MODEL_PIXEL_SCALE)?
        .map(Value::into_f64_vec)
        .transpose()?;
    let tiepoint = find_values(decoder, MODEL_TIEPOINT)?
        .map(Value::into_f64_vec)
        .transpose()?;

    let mut transform = None;
    if let (Some(scale), Some(tiepoint)) = (&scale, &tiepoint) {
        if scale.len() >= 2 && tiepoint.len() >= 6 {
            // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            transform = Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]));
        }
    }

    if transform.is_none() {
        let matrix = find_values(decoder, MODEL_TRANSFORMATION)?
            .map(Value::into_f64_vec)
            .transpose()?;
        if let Some(t) = matrix {
            if t.len() >= 16 {
                transform = Some(GeoTransform {
                    origin_x: t[3],
                    origin_y: t[7],
                    pixel_width: t[0],
                    pixel_height: t[5],
                    row_rotation: t[1],
                    col_rotation: t[4],
                });
            }
        }
    }

    if pixel_is_point {
        transform = transform.map(point_to_area);
    }
    Ok(transform)
}

/// PixelIsPoint places the model origin on the centre of pixel (0, 0); the
/// geotransform wants its outer corner.
fn point_to_area(gt: GeoTransform) -> GeoTransform {
    GeoTransform {
        origin_x: gt.origin_x - 0.5 * (gt.pixel_width + gt.row_rotation),
        origin_y: gt.origin_y - 0.5 * (gt.col_rotation + gt.pixel_height),
        ..gt
    }
}

fn parse_geo_keys(path: &Path, keys: &[u32], ascii: &str) -> RadarResult<Projection> {
    let malformed = |reason: &str| RadarError::MalformedGeoKeys {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };
    if keys.len() < 4 {
        return Err(malformed("header shorter than four entries"));
    }
    let count = keys[3] as usize;
    if keys.len() < 4 + count * 4 {
        return Err(malformed("fewer entries than declared"));
    }

    let mut projection = Projection::default();
    let mut citations: Vec<(u16, &str)> = Vec::new();

    for entry in keys[4..4 + count * 4].chunks_exact(4) {
        let (key, location, length, value) = (entry[0] as u16, entry[1] as u16, entry[2], entry[3]);
        match (key, location) {
            (GT_MODEL_TYPE, 0) => {
                projection.kind = match value as u16 {
                    MODEL_TYPE_PROJECTED => ModelKind::Projected,
                    MODEL_TYPE_GEOGRAPHIC => ModelKind::Geographic,
                    _ => ModelKind::Unknown,
                };
            }
            (PROJECTED_CS_TYPE, 0) | (GEOGRAPHIC_TYPE, 0) => {
                if value != u32::from(USER_DEFINED) && projection.epsg.is_none() {
                    projection.epsg = u16::try_from(value).ok();
                }
            }
            (GT_CITATION | GEOG_CITATION | PCS_CITATION, GEO_ASCII_PARAMS) => {
                let start = value as usize;
                let end = start + length as usize;
                let text = ascii
                    .get(start..end)
                    .ok_or_else(|| malformed("citation outside GeoAsciiParams"))?;
                citations.push((key, text.trim_end_matches('|')));
            }
            _ => {}
        }
    }

    citations.sort_by_key(|(key, _)| match *key {
        PCS_CITATION => 0,
        GT_CITATION => 1,
        _ => 2,
    });
    projection.wkt = citations
        .into_iter()
        .map(|(_, text)| text)
        .find(|text| looks_like_wkt(text))
        .map(str::to_string);
    Ok(projection)
}

fn looks_like_wkt(text: &str) -> bool {
    let head = text.trim_start();
    match head.find('[') {
        Some(idx) if idx > 0 => head[..idx]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c == '_'),
        _ => false,
    }
}

/// Keys to write for `projection`: the source file's own keys when it had
/// them, otherwise a directory built from the EPSG code and WKT. `None` when
/// there is no CRS at all.
fn output_geo_keys(path: &Path, projection: &Projection) -> RadarResult<Option<GeoKeys>> {
    if let Some(keys) = &projection.geo_keys {
        // Geometry is always written as a corner-based transform.
        let mut directory = keys.directory.clone();
        for entry in directory.get_mut(4..).unwrap_or(&mut []).chunks_exact_mut(4) {
            if entry[0] == GT_RASTER_TYPE && entry[1] == 0 {
                entry[3] = RASTER_PIXEL_IS_AREA;
            }
        }
        return Ok(Some(GeoKeys {
            directory,
            ..keys.clone()
        }));
    }

    if projection.is_empty() {
        if projection.kind != ModelKind::Unknown {
            return Err(RadarError::UnrepresentableProjection(path.to_path_buf()));
        }
        return Ok(None);
    }

    let overflow = |what: &'static str, len: usize| RadarError::GeoKeyOverflow {
        path: path.to_path_buf(),
        what,
        len,
    };
    let model = match projection.kind {
        ModelKind::Projected => MODEL_TYPE_PROJECTED,
        ModelKind::Geographic => MODEL_TYPE_GEOGRAPHIC,
        ModelKind::Unknown => USER_DEFINED,
    };
    let mut entries: Vec<[u16; 4]> = vec![
        [GT_MODEL_TYPE, 0, 1, model],
        [GT_RASTER_TYPE, 0, 1, RASTER_PIXEL_IS_AREA],
    ];

    // GeoAsciiParams strings are '|' terminated; the key length counts the terminator.
    let ascii = projection
        .wkt
        .as_ref()
        .map(|wkt| format!("{}|", wkt))
        .unwrap_or_default();
    if !ascii.is_empty() {
        let len = u16::try_from(ascii.len()).map_err(|_| overflow("WKT citation", ascii.len()))?;
        entries.push([GT_CITATION, GEO_ASCII_PARAMS, len, 0]);
    }
    if let Some(code) = projection.epsg {
        match projection.kind {
            ModelKind::Geographic => entries.push([GEOGRAPHIC_TYPE, 0, 1, code]),
            _ => entries.push([PROJECTED_CS_TYPE, 0, 1, code]),
        }
    }

    let count =
        u16::try_from(entries.len()).map_err(|_| overflow("geokey directory", entries.len()))?;
    let mut directory = vec![1, 1, 0, count];
    directory.extend(entries.into_iter().flatten());
    Ok(Some(GeoKeys {
        directory,
        doubles: Vec::new(),
        ascii,
    }))
}

fn encode<W: Write + Seek>(
    writer: W,
    geometry: &RasterGeometry,
    keys: Option<&GeoKeys>,
    data: ArrayView2<f32>,
) -> TiffResult<()> {
    let mut encoder = TiffEncoder::new(writer)?;
    let mut image = encoder.new_image::<Gray32Float>(geometry.cols as u32, geometry.rows as u32)?;
    let gt = &geometry.transform;

    if gt.is_north_up() {
        let scale = [gt.pixel_width, -gt.pixel_height, 0.0];
        let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
        image.encoder().write_tag(tag(MODEL_PIXEL_SCALE), &scale[..])?;
        image.encoder().write_tag(tag(MODEL_TIEPOINT), &tiepoint[..])?;
    } else {
        let matrix = [
            gt.pixel_width, gt.row_rotation, 0.0, gt.origin_x,
            gt.col_rotation, gt.pixel_height, 0.0, gt.origin_y,
            0.0, 0.0, 0.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        ];
        image.encoder().write_tag(tag(MODEL_TRANSFORMATION), &matrix[..])?;
    }

    if let Some(keys) = keys {
        image.encoder().write_tag(tag(GEO_KEY_DIRECTORY), &keys.directory[..])?;
        if !keys.doubles.is_empty() {
            image.encoder().write_tag(tag(GEO_DOUBLE_PARAMS), &keys.doubles[..])?;
        }
        if !keys.ascii.is_empty() {
            image.encoder().write_tag(tag(GEO_ASCII_PARAMS), keys.ascii.as_str())?;
        }
    }

    let values: Vec<f32> = data.iter().copied().collect();
    image.write_data(&values)
}
