use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::analysis::types::{Post, Source};
use crate::config::SourceConfig;

use super::types::SearchResponse;

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";

/// Realistic text templates and per-topic sentiment mix for the simulated
/// generator.
struct SentimentMix {
    positive: f64,
    neutral: f64,
}

const TOPIC_MIX: &[(&str, SentimentMix)] = &[
    ("technology", SentimentMix { positive: 0.6, neutral: 0.3 }),
    ("ai", SentimentMix { positive: 0.7, neutral: 0.2 }),
    ("crypto", SentimentMix { positive: 0.5, neutral: 0.3 }),
    ("politics", SentimentMix { positive: 0.3, neutral: 0.4 }),
];

const DEFAULT_MIX: SentimentMix = SentimentMix {
    positive: 0.5,
    neutral: 0.3,
};

pub struct TwitterClient {
    client: reqwest::Client,
    bearer_token: Option<String>,
    query: String,
    fetch_limit: usize,
    poll_interval: std::time::Duration,
}

impl TwitterClient {
    pub fn new(config: &SourceConfig) -> Self {
        if config.bearer_token.is_none() {
            info!("No Twitter bearer token configured, running on simulated posts");
        }
        Self {
            client: reqwest::Client::new(),
            bearer_token: config.bearer_token.clone(),
            query: config.query.clone(),
            fetch_limit: config.fetch_limit,
            poll_interval: std::time::Duration::from_secs(config.poll_interval_secs),
        }
    }

    /// Fetch posts for a query, degrading to the simulated generator on any
    /// live-API failure. The substitution is visible through each post's
    /// `source` tag, never hidden.
    pub async fn fetch(&self, query: &str, limit: usize) -> Vec<Post> {
        match self.fetch_live(query, limit).await {
            Ok(posts) if !posts.is_empty() => posts,
            Ok(_) => {
                info!("Live search returned no posts for {query:?}, using simulated data");
                self.fetch_simulated(query, limit).await
            }
            Err(err) => {
                warn!("Live fetch failed ({err:#}), using simulated data");
                self.fetch_simulated(query, limit).await
            }
        }
    }

    async fn fetch_live(&self, query: &str, limit: usize) -> Result<Vec<Post>> {
        let token = self
            .bearer_token
            .as_deref()
            .context("no bearer token configured")?;

        let search_query = format!("{} -is:retweet lang:en", clean_query(query));
        let max_results = limit.clamp(10, 100).to_string();
        let params = [
            ("query", search_query.as_str()),
            ("max_results", max_results.as_str()),
            ("tweet.fields", "created_at,public_metrics,author_id"),
            ("user.fields", "username,verified"),
            ("expansions", "author_id"),
        ];

        let response = self
            .client
            .get(SEARCH_URL)
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .context("Twitter API request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twitter API returned {}: {}", status, body);
        }

        let search: SearchResponse = response
            .json()
            .await
            .context("Failed to parse Twitter search response")?;

        let users: HashMap<String, &super::types::User> = search
            .includes
            .as_ref()
            .map(|inc| inc.users.iter().map(|u| (u.id.clone(), u)).collect())
            .unwrap_or_default();

        let posts = search
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|tweet| {
                let user = tweet.author_id.as_ref().and_then(|id| users.get(id));
                let metrics = tweet.public_metrics.unwrap_or_default();
                Post {
                    text: tweet.text,
                    created_at: tweet.created_at,
                    likes: metrics.like_count,
                    retweets: metrics.retweet_count,
                    author: user.map(|u| u.username.clone()),
                    verified: user.map(|u| u.verified).unwrap_or(false),
                    source: Source::Live,
                }
            })
            .collect();

        Ok(posts)
    }

    /// Generate simulated posts with a topic-conditioned sentiment mix and
    /// timestamps spread over the last 24 hours.
    pub async fn fetch_simulated(&self, query: &str, limit: usize) -> Vec<Post> {
        // Keep the shape of a network call.
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;

        let lower = query.to_lowercase();
        let (topic, mix) = TOPIC_MIX
            .iter()
            .find(|(t, _)| lower.contains(t))
            .map(|(t, m)| (*t, m))
            .unwrap_or(("technology", &DEFAULT_MIX));

        let hashtag = title_case(topic);
        let base_time = Utc::now();
        let mut rng = rand::rng();
        let mut posts = Vec::with_capacity(limit);

        for _ in 0..limit {
            let roll: f64 = rng.random();
            let text = if roll < mix.positive {
                format!("Amazing developments in {query}! The future looks bright. #{hashtag}")
            } else if roll < mix.positive + mix.neutral {
                format!("Interesting analysis of {query} trends. Monitoring developments. #{hashtag}")
            } else {
                format!("Concerns about {query} implementation. Need improvements. #{hashtag}")
            };

            let minutes_ago = rng.random_range(0..1440);
            posts.push(Post {
                text,
                created_at: Some(base_time - Duration::minutes(minutes_ago)),
                likes: rng.random_range(0..=100),
                retweets: rng.random_range(0..=50),
                author: Some(format!("user_{}", rng.random_range(1000..10_000))),
                verified: rng.random_bool(0.2),
                source: Source::Simulated,
            });
        }

        info!("Generated {} simulated posts for {query:?}", posts.len());
        posts
    }

    /// Poll loop handing batches to the aggregation queue. The stop flag is
    /// checked before every fetch, never mid-batch.
    pub async fn run(self, tx: mpsc::Sender<Post>, running: Arc<AtomicBool>) -> Result<()> {
        info!("Post source poller started for query {:?}", self.query);

        loop {
            if running.load(Ordering::Relaxed) {
                let posts = self.fetch(&self.query, self.fetch_limit).await;
                for post in posts {
                    if tx.send(post).await.is_err() {
                        info!("Aggregation queue closed, poller stopping");
                        return Ok(());
                    }
                }
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

/// Strip everything but word characters, whitespace, hashtags and mentions
/// before handing the query to the API.
fn clean_query(query: &str) -> String {
    query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '#' | '@' | '_'))
        .collect::<String>()
        .trim()
        .to_string()
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
