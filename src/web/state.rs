use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::analysis::{GeminiReasoner, ScoredPost, SentimentScorer};
use crate::storage::PostStore;

#[derive(Clone)]
pub struct AppState {
    pub tx: broadcast::Sender<ScoredPost>,
    pub store: Arc<PostStore>,
    pub scorer: Arc<SentimentScorer>,
    pub reasoner: Arc<GeminiReasoner>,
    /// Shared stream toggle. The poller and the enrichment path both read
    /// it; the stream control endpoints write it.
    pub running: Arc<AtomicBool>,
    /// How many recent posts the breakdown endpoints analyze.
    pub breakdown_window: usize,
    /// How many top-ranked posts the enrichment endpoint sends out.
    pub top_k: usize,
}
