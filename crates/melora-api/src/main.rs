use melora_api::{build_router, AppState};
use melora_core::{BackendKind, Config, MemoryCatalog};
use melora_storage::{create_storage, ensure_bucket};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    // Object-store deployments need the bucket before the first upload.
    if config.storage_backend == BackendKind::S3 {
        let bucket = config
            .s3_bucket
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("S3_BUCKET is required for the s3 backend"))?;
        let region = config.s3_region.as_deref().unwrap_or("us-east-1");
        ensure_bucket(bucket, region, config.s3_endpoint.as_deref()).await?;
    }

    let storage = create_storage(&config).await?;
    let catalog = Arc::new(MemoryCatalog::new(config.orphan_policy));

    tracing::info!(
        backend = ?config.storage_backend,
        port = config.server_port,
        "Starting melora-api"
    );

    let state = Arc::new(AppState::new(config.clone(), storage, catalog));
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
