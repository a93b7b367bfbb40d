use image::DynamicImage;
use ndarray::Array2;
use std::path::Path;

use crate::prelude::{ensure_shape, RadarError, RadarResult};

/// Alpha value marking an observed pixel.
pub const VALID_ALPHA: u8 = u8::MAX;

/// One decoded radar image.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Raw reflectivity counts from channel 0.
    pub signal: Array2<u8>,
    /// `true` where channel 3 is fully opaque.
    pub mask: Array2<bool>,
}

impl Frame {
    pub fn new(signal: Array2<u8>, mask: Array2<bool>) -> RadarResult<Self> {
        ensure_shape(signal.dim(), mask.dim())?;
        Ok(Self { signal, mask })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.signal.dim()
    }

    /// Splits an RGBA image into signal and validity mask.
    pub fn from_image(path: &Path, image: DynamicImage) -> RadarResult<Self> {
        let channels = image.color().channel_count();
        if channels < 4 {
            return Err(RadarError::ChannelCount {
                path: path.to_path_buf(),
                found: channels,
            });
        }
        let rgba = image.into_rgba8();
        let (width, height) = rgba.dimensions();
        let shape = (height as usize, width as usize);
        let signal = Array2::from_shape_fn(shape, |(row, col)| {
            rgba.get_pixel(col as u32, row as u32).0[0]
        });
        let mask = Array2::from_shape_fn(shape, |(row, col)| {
            rgba.get_pixel(col as u32, row as u32).0[3] == VALID_ALPHA
        });
        Ok(Self { signal, mask })
    }
}

/// Turns a frame file into a [`Frame`].
pub trait FrameDecoder {
    fn decode(&self, path: &Path) -> RadarResult<Frame>;
}

/// Decoder for any raster format the `image` crate reads (PNG in practice).
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFrameDecoder;

impl FrameDecoder for ImageFrameDecoder {
    fn decode(&self, path: &Path) -> RadarResult<Frame> {
        let image = image::open(path).map_err(|e| RadarError::image(path, e))?;
        Frame::from_image(path, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgba, RgbaImage};
    use tempfile::tempdir;

    #[test]
    fn decodes_signal_and_alpha_mask() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("20180101_5:0005.png");
        let mut img = RgbaImage::new(3, 2);
        img.put_pixel(0, 0, Rgba([100, 7, 7, 255]));
        img.put_pixel(2, 1, Rgba([200, 0, 0, 128]));
        img.put_pixel(1, 1, Rgba([42, 0, 0, 255]));
        img.save(&path).unwrap();

        let frame = ImageFrameDecoder.decode(&path).unwrap();
        assert_eq!(frame.shape(), (2, 3));
        assert_eq!(frame.signal[[0, 0]], 100);
        assert_eq!(frame.signal[[1, 2]], 200);
        assert_eq!(frame.signal[[1, 1]], 42);
        assert!(frame.mask[[0, 0]]);
        assert!(frame.mask[[1, 1]]);
        assert!(!frame.mask[[1, 2]]);
        assert!(!frame.mask[[0, 1]]);
    }

    #[test]
    fn rejects_images_without_alpha() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gray.png");
        GrayImage::from_pixel(2, 2, Luma([9])).save(&path).unwrap();

        let err = ImageFrameDecoder.decode(&path).unwrap_err();
        assert!(matches!(err, RadarError::ChannelCount { found: 1, .. }));
    }

    #[test]
    fn unreadable_file_is_an_image_error() {
        let dir = tempdir().unwrap();
        let err = ImageFrameDecoder
            .decode(&dir.path().join("missing.png"))
            .unwrap_err();
        assert!(matches!(err, RadarError::Image { .. }));
    }

    #[test]
    fn frame_new_requires_matching_mask() {
        let err = Frame::new(Array2::zeros((2, 2)), Array2::from_elem((2, 3), true)).unwrap_err();
        assert!(matches!(err, RadarError::ShapeMismatch { .. }));
    }
}
