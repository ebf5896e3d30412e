use std::sync::Arc;

use mediafetch::{
    AppState,
    config::{Config, load_env_files},
    error::ApiError,
    routes::{build_cors_layer, router},
    transport::{ReqwestTransport, Transport},
};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    let env_files = load_env_files();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "mediafetch=info,tower_http=info".to_string()),
        )
        .init();

    for file in env_files {
        info!("Loaded environment from {file}");
    }

    if let Err(error) = run().await {
        eprintln!("Server error: {}", error.message);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), ApiError> {
    let config = Config::from_env();

    if config.api_key.is_none() {
        warn!("RAPID_API_KEY is not set. /api/download will answer with a configuration error.");
    }
    info!("Using provider host {}", config.api_host);

    let http_client = reqwest::Client::builder()
        .build()
        .map_err(|error| ApiError::internal(format!("Could not build HTTP client: {error}")))?;
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(http_client));

    let state = AppState::new(transport, &config);
    let cors = build_cors_layer(&config.allowed_origins)?;
    let app = router(state).layer(cors);

    let listener = TcpListener::bind(&config.bind_addr).await.map_err(|error| {
        ApiError::internal(format!("Could not bind {}: {error}", config.bind_addr))
    })?;

    info!("Server ready on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .map_err(|error| ApiError::internal(format!("HTTP server error: {error}")))
}
