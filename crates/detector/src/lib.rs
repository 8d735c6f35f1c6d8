pub mod postprocess;
pub mod session;

// Re-export commonly used types for convenience
pub use postprocess::{BoxTransform, Detection, parse_detections};
pub use session::{Detector, ExecutionProvider};
