use detector::Detector;
use gateway::{
    config::GatewayConfig,
    routes::app,
    state::{AppState, ModelState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;
    common::setup_logging(&config.environment);

    let state = AppState::new(ModelState::Uninitialized, config.input_size);

    // Load the model off the request path; /detect stays gated on Ready so a
    // click before the transition gets a 503 instead of racing the load.
    let model = state.model.clone();
    let model_path = config.model_path.clone();
    let input_size = config.input_size;
    let intra_threads = config.intra_threads;
    tokio::task::spawn_blocking(move || {
        *model.blocking_lock() = ModelState::Loading;
        tracing::info!(model_path = %model_path, "Loading model");

        match Detector::load(&model_path, input_size, intra_threads) {
            Ok(detector) => {
                *model.blocking_lock() = ModelState::Ready(detector);
                tracing::info!("Model ready");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load model");
                *model.blocking_lock() = ModelState::Failed(e.to_string());
            }
        }
    });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Demo server listening on {}", config.bind_addr);

    axum::serve(listener, app(state)).await?;

    Ok(())
}
