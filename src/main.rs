//! calorie-lens HTTP service.

use calorie_lens::calorie::{CalorieEstimator, FoodAnalyzer, LabelClassifier, NutritionTables};
use calorie_lens::config::Config;
use calorie_lens::error::AppError;
use calorie_lens::handlers::{self, AppState};
use calorie_lens::pipeline::Pipeline;
use calorie_lens::postprocess::annotate::Annotator;
use calorie_lens::storage::ImageStore;
use calorie_lens::triton::{TritonClient, TritonDetector};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("calorie_lens=info,tower_http=debug")),
        )
        .init();

    eprintln!("[STARTUP] calorie-lens starting...");

    // Decode, letterbox and annotation run on the blocking pool
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(num_cpus::get())
        .max_blocking_threads(64)
        .enable_all()
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build runtime: {e}")))?;

    eprintln!("[STARTUP] Tokio runtime configured: {} worker threads", num_cpus::get());

    runtime.block_on(async_main())
}

async fn async_main() -> Result<(), AppError> {
    let config = Config::from_env();
    info!("Triton URL: {} (model {})", config.triton_url, config.triton_model);
    info!("Static dir: {}", config.static_dir.display());
    info!("Port: {}", config.port);

    let tables = match &config.nutrition_tables {
        Some(path) => {
            info!("Loading nutrition tables from {}", path.display());
            NutritionTables::load(path)?
        }
        None => NutritionTables::default(),
    };
    info!(
        table_entries = tables.calories.len(),
        categories = tables.categories.len(),
        food_classes = tables.food_classes.len(),
        ignore_classes = tables.ignore_classes.len(),
        "Nutrition tables ready"
    );

    let annotator = Annotator::from_font_file(config.font_path.as_deref());
    if !annotator.has_font() {
        warn!("No label font loaded, result images will show boxes without labels");
    }
    let analyzer = FoodAnalyzer::new(
        LabelClassifier::new(&tables),
        CalorieEstimator::new(&tables),
        annotator,
    );

    let triton = TritonClient::new(&config.triton_url, config.grpc_pool_size, &config.triton_model)?;
    let detector = Arc::new(TritonDetector::new(
        triton,
        config.model_input_size,
        config.confidence_threshold,
    ));

    let store = ImageStore::open(&config.static_dir, "/static")?;

    let state = Arc::new(AppState {
        pipeline: Pipeline::new(detector, analyzer, store, config.detect_timeout),
    });

    let app = handlers::router(state, &config.static_dir, config.max_upload_bytes);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind {addr}: {e}")))?;
    eprintln!("[STARTUP] Server ready! Listening on http://{addr}");
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {e}")))?;

    eprintln!("[SHUTDOWN] Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
