mod analysis;
mod config;
mod db;
mod errors;
mod extract;
mod models;
mod repository;
mod resumes;
mod routes;
mod scoring;
mod state;
mod storage;
#[cfg(test)]
mod testing;
mod vacancies;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::details::FixedWeighting;
use crate::analysis::Analyzer;
use crate::config::{Config, FileStoreConfig};
use crate::db::create_pool;
use crate::extract::ExtractorRegistry;
use crate::repository::PgRepository;
use crate::resumes::ResumeIngestor;
use crate::routes::build_router;
use crate::scoring::GrpcScoringClient;
use crate::state::AppState;
use crate::storage::{FileStore, S3FileStore, YandexDiskStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting HR analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let pool = create_pool(&config.database_url).await?;
    let repo = Arc::new(PgRepository::new(pool));

    // Initialize the file store
    let store = build_file_store(&config.file_store).await?;

    // Initialize the scoring client; the channel connects on first use
    let scoring = Arc::new(GrpcScoringClient::connect_lazy(
        &config.scoring_address(),
        config.scoring_timeout,
        config.scoring_max_retries,
    )?);
    info!("Scoring client targets {}", config.scoring_address());

    let weighting = Arc::new(FixedWeighting {
        match_score: config.detail_match_score,
        weight: config.detail_weight,
    });
    let extractors = Arc::new(ExtractorRegistry::with_defaults(config.max_upload_bytes));

    let analyzer = Analyzer::new(
        repo.clone(),
        scoring.clone(),
        weighting,
        config.analysis_timeout,
    );
    let ingestor = ResumeIngestor::new(
        repo.clone(),
        store,
        scoring,
        extractors,
        config.parse_on_upload,
    );

    // Build app state
    let state = AppState {
        repo,
        analyzer: Arc::new(analyzer),
        ingestor: Arc::new(ingestor),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_file_store(config: &FileStoreConfig) -> Result<Arc<dyn FileStore>> {
    let store: Arc<dyn FileStore> = match config {
        FileStoreConfig::S3 {
            bucket,
            endpoint,
            region,
            public_url,
            access_key_id,
            secret_access_key,
        } => {
            let client =
                build_s3_client(endpoint, region, access_key_id, secret_access_key).await;
            info!("S3 file store initialized (bucket: {bucket})");
            Arc::new(S3FileStore::new(client, bucket.clone(), public_url.clone()))
        }
        FileStoreConfig::Yandex {
            token,
            folder,
            api_base,
        } => {
            info!("Yandex Disk file store initialized (folder: {folder})");
            Arc::new(YandexDiskStore::new(
                api_base.clone(),
                token.clone(),
                folder.clone(),
            )?)
        }
    };
    Ok(store)
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    region: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "hr-analyzer-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    // MinIO serves buckets by path rather than by virtual host.
    let s3_config = aws_sdk_s3::config::Builder::from(&s3_config)
        .force_path_style(true)
        .build();

    aws_sdk_s3::Client::from_conf(s3_config)
}
