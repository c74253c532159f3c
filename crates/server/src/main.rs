//! ESRB prediction server
//!
//! Loads a trained model at startup and serves rating predictions over HTTP.

use anyhow::Result;
use esrb_lib::{
    health::{components, HealthRegistry},
    observability::{PredictorMetrics, StructuredLogger},
    EsrbPredictor, ModelWrapper,
};
use esrb_server::{api, config::ServerConfig};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let config = ServerConfig::load()?;
    info!(
        addr = %config.listen_addr(),
        model_path = %config.model_path.display(),
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::HTTP).await;

    let metrics = PredictorMetrics::new();
    let logger = StructuredLogger::new("esrb-server");
    logger.log_startup(SERVER_VERSION, &config.model_path.display().to_string());

    let mut predictor = EsrbPredictor::new()
        .with_metrics(metrics)
        .with_logger(logger.clone());

    // The server still starts without a model; readiness reports it
    match predictor.load(&config.model_path) {
        Ok(()) => {
            health_registry.set_healthy(components::MODEL).await;
            health_registry.set_ready(true).await;
        }
        Err(e) => {
            error!(error = %e, "No model available, predictions will fail until restart");
            health_registry
                .set_unhealthy(components::MODEL, e.to_string())
                .await;
        }
    }

    let app_state = Arc::new(api::AppState::new(
        predictor,
        health_registry,
        metrics,
        logger.clone(),
    ));

    tokio::select! {
        result = api::serve(config.listen_addr(), app_state) => {
            if let Err(e) = &result {
                error!(error = %e, "API server stopped");
            }
            logger.log_shutdown("API server stopped");
            result
        }
        signal = tokio::signal::ctrl_c() => {
            signal?;
            logger.log_shutdown("SIGINT received");
            info!("Shutting down");
            Ok(())
        }
    }
}
