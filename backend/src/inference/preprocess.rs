use image::{DynamicImage, ImageBuffer, ImageReader, RgbImage};
use ndarray::Array4;
use std::path::Path;

pub const INPUT_SIZE: u32 = 128;
pub const CHANNELS: usize = 3;
pub const TENSOR_SHAPE: [usize; 4] = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS];

#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Batch of one NHWC image, values in the raw 0-255 range. The classifier was
/// trained on unnormalized pixels, so no scaling happens here.
#[derive(Debug, Clone, PartialEq)]
pub struct PreprocessedTensor(Array4<f32>);

impl PreprocessedTensor {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    #[cfg(test)]
    pub fn view(&self) -> ndarray::ArrayView4<'_, f32> {
        self.0.view()
    }

    /// Row-major NHWC data. Always contiguous since the array is built in
    /// standard layout.
    pub fn as_slice(&self) -> &[f32] {
        self.0.as_slice().unwrap_or_default()
    }
}

pub fn preprocess_path(path: &Path) -> Result<PreprocessedTensor, PreprocessError> {
    let image = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    Ok(to_tensor(&image))
}

pub fn preprocess_bytes(bytes: &[u8]) -> Result<PreprocessedTensor, PreprocessError> {
    let image = image::load_from_memory(bytes)?;
    Ok(to_tensor(&image))
}

fn to_tensor(image: &DynamicImage) -> PreprocessedTensor {
    let rgb = image.to_rgb8();
    let resized = resize_nearest(&rgb, INPUT_SIZE, INPUT_SIZE);
    let array = Array4::from_shape_fn(
        (1, INPUT_SIZE as usize, INPUT_SIZE as usize, CHANNELS),
        |(_, y, x, c)| f32::from(resized.get_pixel(x as u32, y as u32)[c]),
    );
    PreprocessedTensor(array)
}

/// Nearest-neighbour resize sampling each destination pixel centre, i.e.
/// `src = floor((dst + 0.5) * src_len / dst_len)`. This is the resampling the
/// training pipeline's image loader applies by default.
fn resize_nearest(src: &RgbImage, width: u32, height: u32) -> RgbImage {
    let (src_w, src_h) = src.dimensions();
    if (src_w, src_h) == (width, height) {
        return src.clone();
    }
    ImageBuffer::from_fn(width, height, |x, y| {
        let sx = nearest_source(x, src_w, width);
        let sy = nearest_source(y, src_h, height);
        *src.get_pixel(sx, sy)
    })
}

fn nearest_source(dst: u32, src_len: u32, dst_len: u32) -> u32 {
    let scale = f64::from(src_len) / f64::from(dst_len);
    let pos = ((f64::from(dst) + 0.5) * scale).floor() as u32;
    pos.min(src_len - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Luma, Rgb, Rgba};
    use std::io::Cursor;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, format).unwrap();
        buf.into_inner()
    }

    #[test]
    fn output_has_batch_nhwc_shape_and_raw_range() {
        let img = RgbImage::from_fn(300, 200, |x, y| Rgb([(x % 256) as u8, (y % 256) as u8, 255]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);
        let tensor = preprocess_bytes(&bytes).unwrap();

        assert_eq!(tensor.shape(), &TENSOR_SHAPE);
        assert!(tensor.as_slice().iter().all(|v| (0.0..=255.0).contains(v)));
        // blue channel is constant 255 and must not be rescaled
        assert_eq!(tensor.view()[[0, 5, 7, 2]], 255.0);
    }

    #[test]
    fn solid_colour_survives_resize_exactly() {
        let img = RgbImage::from_pixel(37, 91, Rgb([12, 200, 99]));
        let bytes = encode(DynamicImage::ImageRgb8(img), ImageFormat::Png);
        let tensor = preprocess_bytes(&bytes).unwrap();
        let view = tensor.view();
        for (y, x) in [(0, 0), (64, 64), (127, 127)] {
            assert_eq!(view[[0, y, x, 0]], 12.0);
            assert_eq!(view[[0, y, x, 1]], 200.0);
            assert_eq!(view[[0, y, x, 2]], 99.0);
        }
    }

    #[test]
    fn nearest_upscale_picks_pixel_centres() {
        // 2x2 quadrants upscaled to 128x128: each quadrant is 64 pixels wide
        let img = RgbImage::from_fn(2, 2, |x, y| Rgb([(x * 100) as u8, (y * 100) as u8, 0]));
        let resized = resize_nearest(&img, 128, 128);
        assert_eq!(resized.get_pixel(63, 63), &Rgb([0, 0, 0]));
        assert_eq!(resized.get_pixel(64, 0), &Rgb([100, 0, 0]));
        assert_eq!(resized.get_pixel(0, 64), &Rgb([0, 100, 0]));
        assert_eq!(resized.get_pixel(127, 127), &Rgb([100, 100, 0]));
    }

    #[test]
    fn nearest_downscale_index() {
        // 256 -> 128: pixel centre of dst 0 is at src 1.0
        assert_eq!(nearest_source(0, 256, 128), 1);
        assert_eq!(nearest_source(127, 256, 128), 255);
        assert_eq!(nearest_source(0, 128, 128), 0);
    }

    #[test]
    fn alpha_and_grayscale_inputs_become_rgb() {
        let rgba = image::RgbaImage::from_pixel(10, 10, Rgba([1, 2, 3, 0]));
        let tensor = preprocess_bytes(&encode(DynamicImage::ImageRgba8(rgba), ImageFormat::Png)).unwrap();
        assert_eq!(tensor.view()[[0, 0, 0, 2]], 3.0);

        let gray = image::GrayImage::from_pixel(10, 10, Luma([77]));
        let tensor = preprocess_bytes(&encode(DynamicImage::ImageLuma8(gray), ImageFormat::Png)).unwrap();
        assert_eq!(tensor.shape(), &TENSOR_SHAPE);
        assert_eq!(tensor.view()[[0, 9, 9, 0]], 77.0);
        assert_eq!(tensor.view()[[0, 9, 9, 1]], 77.0);
    }

    #[test]
    fn jpeg_files_are_read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leaf.jpg");
        let img = RgbImage::from_pixel(64, 64, Rgb([40, 160, 40]));
        std::fs::write(&path, encode(DynamicImage::ImageRgb8(img), ImageFormat::Jpeg)).unwrap();

        let tensor = preprocess_path(&path).unwrap();
        assert_eq!(tensor.shape(), &TENSOR_SHAPE);
    }

    #[test]
    fn corrupt_data_is_a_decode_error() {
        let err = preprocess_bytes(b"definitely not a png").unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, [0x89, b'P', b'N', b'G', 0, 0, 0]).unwrap();
        assert!(preprocess_path(&path).is_err());
    }
}
