use clap::Parser;
use detector::{BoxTransform, Detector, parse_detections};
use preprocess::Preprocessor;
use render::Renderer;
use std::path::PathBuf;

/// Run the grill detector on a JPEG file and write the annotated image.
#[derive(Parser, Debug)]
struct Args {
    /// Path to the ONNX model
    #[arg(long, default_value = "model.onnx")]
    model: String,

    /// Input JPEG image
    #[arg(long)]
    input: PathBuf,

    /// Output path for the annotated JPEG
    #[arg(long, default_value = "annotated.jpg")]
    output: PathBuf,

    /// Intra-op threads for the inference session
    #[arg(long, default_value_t = 4)]
    intra_threads: usize,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    common::setup_logging(&common::Environment::from_env());

    let ext = args
        .input
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    if !matches!(ext.as_deref(), Some("jpg") | Some("jpeg")) {
        tracing::warn!(input = %args.input.display(), "Only JPEG images are supported");
        return Ok(());
    }

    let preprocessor = Preprocessor::default();
    let mut detector = Detector::load(
        &args.model,
        preprocessor.input_size(),
        args.intra_threads,
    )?;

    let img = image::open(&args.input)?.to_rgb8();
    let (width, height) = img.dimensions();

    let pre = preprocessor.preprocess(img.as_raw(), width, height)?;
    let output = detector.infer(&pre.tensor)?;

    let transform = BoxTransform::from_dims(pre.pad, (width, height), preprocessor.input_size());
    let detections = parse_detections(&output.view(), &transform)?;

    println!("{} detection(s)", detections.len());
    for det in &detections {
        println!(
            "  - {}: {:.1}% at ({:.0}, {:.0}, {:.0}x{:.0})",
            render::class_name(det.class_id),
            det.probability * 100.0,
            det.bounding[0],
            det.bounding[1],
            det.bounding[2],
            det.bounding[3]
        );
    }

    let mut annotated = img;
    Renderer::default().annotate(&mut annotated, &detections);
    annotated.save(&args.output)?;
    println!("Annotated image written to {}", args.output.display());

    Ok(())
}
