mod analysis;
mod config;
mod storage;
mod twitter;
mod web;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pulso=info".into()),
        )
        .init();

    info!("Loading configuration...");
    let config = config::AppConfig::load()?;

    // Channels
    let (raw_tx, mut raw_rx) = mpsc::channel::<analysis::Post>(config.source.queue_capacity);
    let (scored_tx, _) = broadcast::channel::<analysis::ScoredPost>(256);

    // Shared pipeline pieces
    let store = Arc::new(storage::PostStore::new(&config.storage));
    let scorer = Arc::new(analysis::SentimentScorer::new(config.scoring.mode));
    let reasoner = Arc::new(analysis::GeminiReasoner::new(&config.gemini));
    let running = Arc::new(AtomicBool::new(true));

    let app_state = web::state::AppState {
        tx: scored_tx.clone(),
        store: Arc::clone(&store),
        scorer: Arc::clone(&scorer),
        reasoner: Arc::clone(&reasoner),
        running: Arc::clone(&running),
        breakdown_window: config.web.breakdown_window,
        top_k: config.gemini.top_k,
    };

    // Post source poller
    let source = twitter::TwitterClient::new(&config.source);
    let poller_running = Arc::clone(&running);
    let poller_handle = tokio::spawn(async move {
        if let Err(e) = source.run(raw_tx, poller_running).await {
            tracing::error!("Post source error: {:#}", e);
        }
    });

    // Aggregation loop: drain whatever the poller queued since the last
    // tick, score the batch, persist and broadcast every post.
    let tick_store = Arc::clone(&store);
    let tick_scorer = Arc::clone(&scorer);
    let tick_tx = scored_tx.clone();
    let tick_secs = config.web.tick_interval_secs;
    let aggregator_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(tick_secs));
        loop {
            interval.tick().await;

            let mut batch = Vec::new();
            while let Ok(post) = raw_rx.try_recv() {
                batch.push(post);
            }
            if batch.is_empty() {
                continue;
            }

            let (summary, _, scored) = analysis::aggregate::summarize(&batch, &tick_scorer);
            info!(
                "Aggregated {} posts: {} overall, avg score {:.3}",
                summary.total, summary.overall, summary.average_score
            );

            for sp in scored {
                let timestamp = sp.post.created_at.unwrap_or_else(Utc::now);
                tick_store
                    .append(&sp.post.text, sp.sentiment, sp.score, timestamp)
                    .await;
                let _ = tick_tx.send(sp);
            }
        }
    });

    // Web server
    let router = web::create_router(app_state);
    let addr = format!("{}:{}", config.web.host, config.web.port);
    info!("Starting dashboard API at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let web_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Web server error: {:#}", e);
        }
    });

    // Wait for any task to finish (shouldn't under normal operation)
    tokio::select! {
        _ = poller_handle => info!("Post source task ended"),
        _ = aggregator_handle => info!("Aggregation task ended"),
        _ = web_handle => info!("Web server ended"),
    }

    Ok(())
}
