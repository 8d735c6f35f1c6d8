use fast_image_resize::{
    FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer,
    images::{Image, ImageRef},
};
use ndarray::{Array, IxDyn};

pub const DEFAULT_INPUT_SIZE: (u32, u32) = (640, 640);

const CHANNELS: usize = 3;

/// Per-axis scale factor pair. Used both for the pad ratio (square side over
/// original side) and the display ratio (original side over model input side).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleRatios {
    pub x: f32,
    pub y: f32,
}

/// Result of preprocessing: the model input tensor plus the pad ratios needed
/// to map model-space coordinates back to the original image.
#[derive(Debug)]
pub struct PreprocessResult {
    /// NCHW float tensor, shape `[1, 3, input_h, input_w]`, values in [0, 1].
    pub tensor: Array<f32, IxDyn>,
    /// Pad ratios: `max(w, h) / w` and `max(w, h) / h`.
    pub pad: ScaleRatios,
}

/// Turns a decoded RGB image into the model input tensor.
///
/// The image is zero-padded on the bottom/right to a square, resized to the
/// model input size and normalized to [0, 1]. No cropping.
pub struct Preprocessor {
    input_size: (u32, u32),
}

impl Preprocessor {
    pub fn new(input_size: (u32, u32)) -> Self {
        Self { input_size }
    }

    pub fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    pub fn preprocess(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
    ) -> anyhow::Result<PreprocessResult> {
        let expected_size = (width * height) as usize * CHANNELS;
        if pixels.len() != expected_size {
            anyhow::bail!(
                "Buffer size mismatch: expected {}, got {} bytes",
                expected_size,
                pixels.len()
            );
        }
        if width == 0 || height == 0 {
            anyhow::bail!("Empty image: {}x{}", width, height);
        }

        tracing::trace!(width, height, "Preprocessing image");

        let (padded, side, pad) = pad_to_square(pixels, width, height);
        let resized = self.resize(&padded, side)?;
        let tensor = self.normalize(resized.buffer())?;

        Ok(PreprocessResult { tensor, pad })
    }

    fn resize(&self, padded: &[u8], side: u32) -> anyhow::Result<Image<'static>> {
        let src = ImageRef::new(side, side, padded, PixelType::U8x3)?;
        let mut resized = Image::new(self.input_size.0, self.input_size.1, PixelType::U8x3);

        Resizer::new().resize(
            &src,
            &mut resized,
            &ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
        )?;

        Ok(resized)
    }

    fn normalize(&self, buf: &[u8]) -> anyhow::Result<Array<f32, IxDyn>> {
        let width = self.input_size.0 as usize;
        let height = self.input_size.1 as usize;
        let spatial = width * height;

        let mut output = vec![0.0f32; CHANNELS * spatial];

        for (i, px) in buf.chunks_exact(CHANNELS).enumerate() {
            output[i] = px[0] as f32 / 255.0;
            output[i + spatial] = px[1] as f32 / 255.0;
            output[i + 2 * spatial] = px[2] as f32 / 255.0;
        }

        Ok(Array::from_shape_vec(
            IxDyn(&[1, CHANNELS, height, width]),
            output,
        )?)
    }
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(DEFAULT_INPUT_SIZE)
    }
}

/// Zero-pad an RGB buffer on the bottom/right so width == height.
///
/// Returns the padded buffer, the square side length and the per-axis pad
/// ratios (`side / width`, `side / height`).
pub fn pad_to_square(pixels: &[u8], width: u32, height: u32) -> (Vec<u8>, u32, ScaleRatios) {
    let side = width.max(height);
    let ratios = ScaleRatios {
        x: side as f32 / width as f32,
        y: side as f32 / height as f32,
    };

    if width == height {
        return (pixels.to_vec(), side, ratios);
    }

    let row_bytes = width as usize * CHANNELS;
    let stride = side as usize * CHANNELS;
    let mut padded = vec![0u8; side as usize * stride];

    for y in 0..height as usize {
        let src = y * row_bytes;
        let dst = y * stride;
        padded[dst..dst + row_bytes].copy_from_slice(&pixels[src..src + row_bytes]);
    }

    (padded, side, ratios)
}
