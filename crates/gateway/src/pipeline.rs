use base64::Engine;
use detector::{BoxTransform, Detection, Detector, parse_detections};
use image::ImageFormat;
use preprocess::Preprocessor;
use render::Renderer;
use serde::Serialize;
use std::io::Cursor;

#[derive(Debug, Serialize)]
pub struct DetectResponse {
    pub detections: Vec<Detection>,
    pub width: u32,
    pub height: u32,
    /// Annotated JPEG, base64-encoded for the page's canvas.
    pub image: String,
}

/// One full detection run: decode, preprocess, infer, postprocess, render.
///
/// All intermediate buffers are owned values, so they are released on every
/// exit path, early error returns included.
pub fn run_pipeline(
    detector: &mut Detector,
    renderer: &Renderer,
    input_size: (u32, u32),
    jpeg: &[u8],
) -> anyhow::Result<DetectResponse> {
    let decoded = image::load_from_memory_with_format(jpeg, ImageFormat::Jpeg)?.to_rgb8();
    let (width, height) = decoded.dimensions();

    tracing::debug!(width, height, "Image decoded");

    let preprocessor = Preprocessor::new(input_size);
    let pre = preprocessor.preprocess(decoded.as_raw(), width, height)?;

    let output = {
        let _span = tracing::info_span!("model_inference").entered();
        detector.infer(&pre.tensor)?
    };

    let transform = BoxTransform::from_dims(pre.pad, (width, height), input_size);
    let detections = parse_detections(&output.view(), &transform)?;

    tracing::info!(count = detections.len(), "Detection complete");

    let mut annotated = decoded;
    renderer.annotate(&mut annotated, &detections);

    let mut jpeg_out = Cursor::new(Vec::new());
    annotated.write_to(&mut jpeg_out, ImageFormat::Jpeg)?;

    Ok(DetectResponse {
        detections,
        width,
        height,
        image: base64::engine::general_purpose::STANDARD.encode(jpeg_out.into_inner()),
    })
}
