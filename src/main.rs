use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
mod workers;

use config::settings::AppConfig;
use infrastructure::queue::rabbitmq::RabbitMqService;
use infrastructure::staging::StagingArea;
use infrastructure::storage::s3::S3BlobStore;
use infrastructure::transcoder::ffmpeg::FfmpegTranscoder;
use modules::video::service::JobProcessor;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    info!("Starting video processing service...");

    let config = AppConfig::new().context("Storage credentials are not configured")?;

    let staging = StagingArea::new(config.raw_dir.clone(), config.processed_dir.clone());
    staging
        .ensure_ready()
        .await
        .context("Staging directories are not usable")?;
    info!(
        raw = %staging.raw_dir().display(),
        processed = %staging.processed_dir().display(),
        "Staging area ready"
    );

    let store = S3BlobStore::new(
        config.s3_endpoint.as_deref(),
        &config.s3_region,
        &config.s3_access_key,
        &config.s3_secret_key,
        &config.raw_bucket,
        &config.processed_bucket,
    );
    let transcoder = FfmpegTranscoder::new(config.ffmpeg_bin.clone());

    let processor = Arc::new(JobProcessor::new(
        staging,
        Arc::new(store),
        Arc::new(transcoder),
        config.transcode_timeout(),
    ));

    let shutdown = CancellationToken::new();
    let mut handles = vec![tokio::spawn(workers::reclaimer::start_reclaimer(
        processor.clone(),
        config.reclaim_interval(),
        shutdown.clone(),
    ))];

    if let Some(url) = &config.amqp_url {
        let queue = RabbitMqService::new(url).await?;
        handles.push(tokio::spawn(workers::queue_consumer::start_queue_consumer(
            queue,
            processor.clone(),
            config.amqp_queue.clone(),
            shutdown.clone(),
        )));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let app = app::create_app(AppState::new(config, processor));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Video processing service listening at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown.cancel();
    for handle in handles {
        if let Err(e) = handle.await {
            warn!("Worker ended abnormally: {}", e);
        }
    }

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
