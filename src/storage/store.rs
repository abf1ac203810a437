use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::analysis::types::{DailyTrends, LabelCounts, Sentiment, SentimentSummary};
use crate::config::StorageConfig;

/// One persisted record. Ids autoincrement; records are never updated or
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPost {
    pub id: u64,
    pub text: String,
    pub sentiment: Sentiment,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Append-only post store: an in-memory log answering all queries, mirrored
/// to a daily JSONL file. If the data directory is unusable the store keeps
/// running memory-only; the degraded mode is logged, not fatal.
pub struct PostStore {
    data_dir: Option<PathBuf>,
    records: RwLock<Vec<StoredPost>>,
    next_id: AtomicU64,
}

impl PostStore {
    pub fn new(config: &StorageConfig) -> Self {
        let data_dir = match std::fs::create_dir_all(&config.data_dir) {
            Ok(()) => Some(config.data_dir.clone()),
            Err(err) => {
                warn!(
                    "Cannot create data directory {:?} ({err}), store is memory-only",
                    config.data_dir
                );
                None
            }
        };
        if let Some(dir) = &data_dir {
            info!("Post store writing to {:?}", dir);
        }
        Self {
            data_dir,
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Append one scored post and return the stored record.
    pub async fn append(
        &self,
        text: &str,
        sentiment: Sentiment,
        score: f64,
        timestamp: DateTime<Utc>,
    ) -> StoredPost {
        let record = StoredPost {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            text: text.to_string(),
            sentiment,
            score,
            timestamp,
        };

        self.records.write().await.push(record.clone());

        if let Some(dir) = &self.data_dir {
            if let Err(err) = write_jsonl(dir, &record).await {
                error!("Failed to persist record {}: {err:#}", record.id);
            }
        }
        record
    }

    /// The most recent `limit` records, newest first.
    pub async fn recent(&self, limit: usize) -> Vec<StoredPost> {
        let records = self.records.read().await;
        records.iter().rev().take(limit).cloned().collect()
    }

    /// Per-label counts across everything stored.
    pub async fn counts(&self) -> LabelCounts {
        let records = self.records.read().await;
        let mut counts = LabelCounts::default();
        for record in records.iter() {
            counts.increment(record.sentiment);
        }
        counts
    }

    /// Per-label counts restricted to records at or after `since`.
    pub async fn counts_since(&self, since: DateTime<Utc>) -> LabelCounts {
        let records = self.records.read().await;
        let mut counts = LabelCounts::default();
        for record in records.iter().filter(|r| r.timestamp >= since) {
            counts.increment(record.sentiment);
        }
        counts
    }

    /// Summary over everything stored, same shape the batch aggregator
    /// produces.
    pub async fn summary(&self) -> SentimentSummary {
        let records = self.records.read().await;
        if records.is_empty() {
            return SentimentSummary::empty();
        }
        let mut counts = LabelCounts::default();
        let mut score_sum = 0.0;
        for record in records.iter() {
            counts.increment(record.sentiment);
            score_sum += record.score;
        }
        SentimentSummary {
            total: records.len(),
            counts,
            percentages: counts.percentages(),
            overall: counts.dominant(),
            average_score: score_sum / records.len() as f64,
        }
    }

    /// Date-bucketed label counts over the last `days` days, the coarse
    /// trend granularity for multi-day views.
    pub async fn daily_trends(&self, days: i64) -> DailyTrends {
        let cutoff = Utc::now() - Duration::days(days);
        let records = self.records.read().await;
        let mut trends = DailyTrends::new();
        for record in records.iter().filter(|r| r.timestamp >= cutoff) {
            trends
                .entry(record.timestamp.date_naive())
                .or_default()
                .increment(record.sentiment);
        }
        trends
    }
}

async fn write_jsonl(dir: &PathBuf, record: &StoredPost) -> Result<()> {
    use tokio::io::AsyncWriteExt;

    let date_str = Utc::now().format("%Y-%m-%d").to_string();
    let path = dir.join(format!("posts_{}.jsonl", date_str));

    let json = serde_json::to_string(record).context("Failed to serialize record")?;
    let line = format!("{}\n", json);

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await
        .context("Failed to open JSONL file")?;

    file.write_all(line.as_bytes())
        .await
        .context("Failed to write to JSONL file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> PostStore {
        // A data dir nothing can create keeps the tests off the filesystem.
        PostStore {
            data_dir: None,
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    #[tokio::test]
    async fn ids_autoincrement_from_one() {
        let store = memory_store();
        let now = Utc::now();
        let a = store.append("first", Sentiment::Positive, 0.5, now).await;
        let b = store.append("second", Sentiment::Negative, -0.5, now).await;
        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
    }

    #[tokio::test]
    async fn recent_returns_newest_first() {
        let store = memory_store();
        let now = Utc::now();
        for i in 0..5 {
            store
                .append(&format!("post {i}"), Sentiment::Neutral, 0.0, now)
                .await;
        }
        let recent = store.recent(3).await;
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].text, "post 4");
        assert_eq!(recent[2].text, "post 2");
    }

    #[tokio::test]
    async fn counts_since_respects_the_window() {
        let store = memory_store();
        let now = Utc::now();
        store
            .append("old", Sentiment::Positive, 0.4, now - Duration::days(10))
            .await;
        store.append("new", Sentiment::Negative, -0.4, now).await;

        let windowed = store.counts_since(now - Duration::days(7)).await;
        assert_eq!(windowed.negative, 1);
        assert_eq!(windowed.positive, 0);

        let all = store.counts().await;
        assert_eq!(all.total(), 2);
    }

    #[tokio::test]
    async fn summary_matches_stored_records() {
        let store = memory_store();
        let now = Utc::now();
        store.append("a", Sentiment::Positive, 0.6, now).await;
        store.append("b", Sentiment::Positive, 0.4, now).await;
        store.append("c", Sentiment::Negative, -0.5, now).await;

        let summary = store.summary().await;
        assert_eq!(summary.total, 3);
        assert_eq!(summary.overall, Sentiment::Positive);
        assert!((summary.average_score - 0.5 / 3.0).abs() < 1e-9);
        assert!((summary.percentages.sum() - 100.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn empty_store_summary_is_the_zero_summary() {
        let summary = memory_store().summary().await;
        assert_eq!(summary.total, 0);
        assert_eq!(summary.overall, Sentiment::Neutral);
        assert_eq!(summary.average_score, 0.0);
    }

    #[tokio::test]
    async fn daily_trends_bucket_by_date_within_window() {
        let store = memory_store();
        let now = Utc::now();
        store.append("today", Sentiment::Positive, 0.4, now).await;
        store
            .append("yesterday", Sentiment::Negative, -0.4, now - Duration::days(1))
            .await;
        store
            .append("ancient", Sentiment::Neutral, 0.0, now - Duration::days(30))
            .await;

        let trends = store.daily_trends(7).await;
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[&now.date_naive()].positive, 1);
    }
}
