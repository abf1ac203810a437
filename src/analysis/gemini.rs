//! Structured reasoning enrichment via the Gemini API, with a deterministic
//! local heuristic producing the same field shape whenever the remote call
//! is unconfigured, errors, or times out.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::warn;

use crate::config::GeminiConfig;

use super::scorer::{classify, primary_polarity, SINGLE_MODEL};
use super::types::{ScoredPost, Sentiment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

/// The enrichment shape. The local fallback fills every field so callers
/// never see a partial result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedAnalysis {
    pub sentiment: Sentiment,
    pub confidence: f64,
    pub emotional_tone: Vec<String>,
    pub key_topics: Vec<String>,
    pub summary: String,
    pub reasoning: String,
    pub intensity: Intensity,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_mime_type: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

const SYSTEM_PROMPT: &str = r#"Analyze the following social media post for sentiment and provide a detailed analysis.

Respond ONLY with JSON in this format:
{"sentiment": "positive/neutral/negative", "confidence": <0.0-1.0>, "emotional_tone": ["adjective1", "adjective2"], "key_topics": ["topic1", "topic2"], "summary": "brief summary of sentiment", "reasoning": "explanation of why this sentiment was determined", "intensity": "low/medium/high"}"#;

/// Adjectives scanned for in the text per label; the first two entries double
/// as the default tone when nothing matches.
const TONE_WORDS: &[(Sentiment, &[&str])] = &[
    (
        Sentiment::Positive,
        &["excited", "happy", "optimistic", "enthusiastic", "pleased"],
    ),
    (
        Sentiment::Negative,
        &["frustrated", "angry", "disappointed", "concerned", "annoyed"],
    ),
    (
        Sentiment::Neutral,
        &["curious", "interested", "observant", "contemplative", "analytical"],
    ),
];

/// Keyword emotion tags, independent of the polarity label.
const EMOTION_KEYWORDS: &[(&str, &[&str])] = &[
    ("joy", &["happy", "excited", "great", "amazing", "wonderful", "love", "excellent"]),
    ("anger", &["angry", "frustrated", "mad", "annoyed", "outraged", "hate"]),
    ("sadness", &["sad", "disappointed", "unhappy", "depressed", "terrible", "awful"]),
    ("fear", &["scared", "worried", "anxious", "nervous", "concerned", "afraid"]),
    ("surprise", &["surprised", "shocked", "amazed", "astonished", "unexpected"]),
];

pub struct GeminiReasoner {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    semaphore: Arc<Semaphore>,
    batch_cap: usize,
}

impl GeminiReasoner {
    pub fn new(config: &GeminiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
            batch_cap: config.batch_cap,
        }
    }

    pub fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    /// Enrich one text. Never errors: any remote failure (no key, HTTP
    /// error, bad JSON, timeout) degrades to the local heuristic.
    pub async fn enrich(&self, text: &str) -> DetailedAnalysis {
        match self.enrich_remote(text).await {
            Ok(analysis) => analysis,
            Err(err) => {
                if self.is_available() {
                    warn!("Gemini enrichment failed, using local fallback: {err:#}");
                }
                local_analysis(text)
            }
        }
    }

    async fn enrich_remote(&self, text: &str) -> Result<DetailedAnalysis> {
        let api_key = self
            .api_key
            .as_deref()
            .context("Gemini API key not configured")?;

        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, api_key
        );

        let prompt = format!("{}\n\nPost: \"{}\"", SYSTEM_PROMPT, text);
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.1,
                max_output_tokens: 400,
                response_mime_type: "application/json".to_string(),
            },
        };

        let send = async {
            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .context("Gemini API request failed")?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                anyhow::bail!("Gemini API returned {}: {}", status, body);
            }

            response
                .json::<GeminiResponse>()
                .await
                .context("Failed to parse Gemini response")
        };

        let gemini_resp = tokio::time::timeout(self.timeout, send)
            .await
            .context("Gemini API call timed out")??;

        let text = gemini_resp
            .candidates
            .as_ref()
            .and_then(|c| c.first())
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.as_ref())
            .and_then(|p| p.first())
            .and_then(|p| p.text.as_ref())
            .context("Empty Gemini response")?;

        serde_json::from_str(extract_json(text))
            .context("Failed to parse analysis JSON from Gemini")
    }

    /// Enrich the top `k` posts of a batch by descending absolute score,
    /// concurrently, results keyed by post index. `k` is clamped to the
    /// configured batch cap. Each post falls back independently; one failure
    /// never aborts the batch. With `remote_allowed = false` (stream
    /// stopped) every post takes the local heuristic without touching the
    /// network.
    pub async fn enrich_top(
        self: &Arc<Self>,
        scored: &[ScoredPost],
        k: usize,
        remote_allowed: bool,
    ) -> HashMap<usize, DetailedAnalysis> {
        let k = k.min(self.batch_cap);
        let mut ranked: Vec<usize> = (0..scored.len()).collect();
        ranked.sort_by(|&a, &b| {
            scored[b]
                .score
                .abs()
                .partial_cmp(&scored[a].score.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut results = HashMap::new();

        if !remote_allowed || !self.is_available() {
            for &i in ranked.iter().take(k) {
                results.insert(i, local_analysis(&scored[i].post.text));
            }
            return results;
        }

        let mut tasks = tokio::task::JoinSet::new();
        for &i in ranked.iter().take(k) {
            let reasoner = Arc::clone(self);
            let text = scored[i].post.text.clone();
            tasks.spawn(async move {
                let _permit = reasoner.semaphore.clone().acquire_owned().await.ok();
                (i, reasoner.enrich(&text).await)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((i, analysis)) => {
                    results.insert(i, analysis);
                }
                Err(err) => warn!("enrichment task failed: {err:#}"),
            }
        }
        results
    }
}

/// Deterministic heuristic enrichment from the primary lexicon, same field
/// shape as the remote analysis.
pub fn local_analysis(text: &str) -> DetailedAnalysis {
    let polarity = primary_polarity(text);
    let sentiment = classify(polarity, &SINGLE_MODEL);

    let confidence = match sentiment {
        Sentiment::Neutral => 0.7,
        _ => ((polarity.abs() + 1.0) / 2.0).min(0.85),
    };

    let intensity = if polarity.abs() > 0.5 {
        Intensity::High
    } else if polarity.abs() > 0.2 {
        Intensity::Medium
    } else {
        Intensity::Low
    };

    DetailedAnalysis {
        sentiment,
        confidence: (confidence * 100.0).round() / 100.0,
        emotional_tone: emotional_tone(text, sentiment),
        key_topics: key_topics(text),
        summary: format!("Text appears {} based on lexicon analysis", sentiment),
        reasoning: format!(
            "Determined through polarity analysis (polarity: {:.2})",
            polarity
        ),
        intensity,
    }
}

fn emotional_tone(text: &str, sentiment: Sentiment) -> Vec<String> {
    let words = TONE_WORDS
        .iter()
        .find(|(s, _)| *s == sentiment)
        .map(|(_, w)| *w)
        .unwrap_or(&[]);

    let lower = text.to_lowercase();
    let matched: Vec<String> = words
        .iter()
        .filter(|w| lower.contains(*w))
        .map(|w| w.to_string())
        .collect();

    if matched.is_empty() {
        words.iter().take(2).map(|w| w.to_string()).collect()
    } else {
        matched
    }
}

/// The first three alphabetic words longer than four characters, in their
/// original order.
fn key_topics(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .filter(|w| w.chars().count() > 4 && w.chars().all(|c| c.is_alphabetic()))
        .take(3)
        .map(|w| w.to_string())
        .collect()
}

/// Keyword emotion tags for a text; `["neutral"]` when nothing matches.
pub fn detect_emotions(text: &str) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let detected: Vec<&'static str> = EMOTION_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(emotion, _)| *emotion)
        .collect();
    if detected.is_empty() {
        vec!["neutral"]
    } else {
        detected
    }
}

/// Pull the JSON payload out of a model reply that may wrap it in markdown
/// code fences.
fn extract_json(text: &str) -> &str {
    if let Some(idx) = text.find("```json") {
        let rest = &text[idx + 7..];
        rest.split("```").next().unwrap_or(rest).trim()
    } else if let Some(idx) = text.find("```") {
        let rest = &text[idx + 3..];
        rest.split("```").next().unwrap_or(rest).trim()
    } else {
        text.trim()
    }
}
