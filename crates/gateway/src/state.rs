use detector::Detector;
use render::Renderer;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Explicit model lifecycle. The detect endpoint is gated on `Ready`; a
/// request arriving earlier gets a 503 instead of racing the load. A load
/// error parks the state in `Failed` so in-flight requests finish normally.
pub enum ModelState {
    Uninitialized,
    Loading,
    Ready(Detector),
    Failed(String),
}

impl ModelState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelState::Uninitialized => "uninitialized",
            ModelState::Loading => "loading",
            ModelState::Ready(_) => "ready",
            ModelState::Failed(_) => "failed",
        }
    }
}

/// Shared application state. The mutex around the model doubles as the
/// single-flight guarantee: one detection runs to completion at a time.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<Mutex<ModelState>>,
    pub renderer: Arc<Renderer>,
    pub input_size: (u32, u32),
}

impl AppState {
    pub fn new(model: ModelState, input_size: (u32, u32)) -> Self {
        Self {
            model: Arc::new(Mutex::new(model)),
            renderer: Arc::new(Renderer::default()),
            input_size,
        }
    }
}
