mod api;
mod middleware;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use snapstock_ai::{GenerativeClient, ScanAnalyzer, VisionOcrClient};

use crate::api::{build_app, AppState};
use crate::middleware::AuthState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(snapstock_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = snapstock_db::PoolConfig::from_app_config(&config);
    let pool = snapstock_db::connect_pool(&config.database_url, pool_config).await?;
    snapstock_db::run_migrations(&pool).await?;

    let analyzer = match &config.gemini_api_key {
        Some(api_key) => {
            let gen = GenerativeClient::with_base_url(api_key, &config.gemini_base_url)?;
            let ocr = config
                .vision_api_key
                .as_deref()
                .and_then(|key| VisionOcrClient::with_base_url(key, &config.vision_base_url));
            if ocr.is_none() {
                tracing::info!("no Vision API key configured; OCR pass disabled");
            }
            Some(Arc::new(ScanAnalyzer::new(gen, ocr)))
        }
        None => {
            tracing::warn!(
                "GOOGLE_GENERATIVE_AI_API_KEY not set; scan endpoints will report a configuration error"
            );
            None
        }
    };

    let auth = AuthState::from_env(matches!(
        config.env,
        snapstock_core::Environment::Development
    ))?;
    let app = build_app(
        AppState {
            pool,
            analyzer,
            config: Arc::clone(&config),
        },
        auth,
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "snapstock server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
