use ndarray::{Array, ArrayD, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

pub const INPUT_NAME: &str = "images";
pub const OUTPUT_NAME: &str = "output";

#[derive(Debug, Clone, Copy)]
pub enum ExecutionProvider {
    Cpu,
    #[cfg(feature = "cuda")]
    Cuda,
}

/// ONNX Runtime session wrapper for the detection model.
///
/// The model takes a single `[1, 3, h, w]` float input named `images` and
/// returns a flat float output named `output` (one row per detection, NMS
/// already applied inside the graph).
pub struct Detector {
    session: Session,
    input_size: (u32, u32),
}

impl Detector {
    pub fn load(path: &str, input_size: (u32, u32), intra_threads: usize) -> anyhow::Result<Self> {
        Self::load_with_provider(path, input_size, intra_threads, ExecutionProvider::Cpu)
    }

    pub fn load_with_provider(
        path: &str,
        input_size: (u32, u32),
        intra_threads: usize,
        provider: ExecutionProvider,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        #[allow(unused_mut)]
        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?;

        match provider {
            #[cfg(feature = "cuda")]
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;
        tracing::info!(model_path = path, "Model loaded");

        let mut detector = Self {
            session,
            input_size,
        };
        detector.warmup()?;

        Ok(detector)
    }

    pub fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    /// Run one inference on an all-zero tensor so the first user request does
    /// not pay the first-run graph setup cost.
    fn warmup(&mut self) -> anyhow::Result<()> {
        tracing::info!("Warming up model");
        let (w, h) = self.input_size;
        let zeros = Array::<f32, IxDyn>::zeros(IxDyn(&[1, 3, h as usize, w as usize]));
        self.infer(&zeros)?;
        Ok(())
    }

    /// Feed the named input tensor and return the raw named output.
    pub fn infer(&mut self, images: &Array<f32, IxDyn>) -> anyhow::Result<ArrayD<f32>> {
        let outputs = self.session.run(ort::inputs![
            INPUT_NAME => TensorRef::from_array_view(images.view())?
        ])?;

        let output = outputs[OUTPUT_NAME].try_extract_array::<f32>()?;

        Ok(output.into_owned())
    }
}
