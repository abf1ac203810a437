use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::Ordering;

use crate::analysis::aggregate;
use crate::analysis::gemini::{detect_emotions, DetailedAnalysis};
use crate::analysis::geography;
use crate::analysis::language;
use crate::analysis::types::{DailyTrends, HourlyTrends, Post, ScoredPost, Sentiment, Source};
use crate::storage::StoredPost;

use super::state::AppState;

type ApiError = (StatusCode, Json<Value>);

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: u64,
    pub text: String,
    pub sentiment: Sentiment,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

/// Score a single ad-hoc text with the blended model, persist it, and push
/// it to live subscribers. Empty text is rejected before scoring.
pub async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if req.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }

    let (sentiment, score) = state.scorer.score_blended(&req.text);
    let record = state
        .store
        .append(&req.text, sentiment, score, Utc::now())
        .await;

    let mut post = Post::new(&record.text, Source::Stream);
    post.created_at = Some(record.timestamp);
    // No subscribers is fine, the dashboard may not be open.
    let _ = state.tx.send(ScoredPost {
        post,
        sentiment,
        score,
    });

    Ok(Json(AnalyzeResponse {
        id: record.id,
        text: record.text,
        sentiment: record.sentiment,
        score: record.score,
        timestamp: record.timestamp,
    }))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<usize>,
}

pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Json<Vec<StoredPost>> {
    Json(state.store.recent(params.limit.unwrap_or(50)).await)
}

pub async fn stats(State(state): State<AppState>) -> Json<Value> {
    let summary = state.store.summary().await;
    Json(json!({
        "summary": summary,
        "streaming": state.running.load(Ordering::Relaxed),
    }))
}

#[derive(Debug, Deserialize)]
pub struct TrendParams {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct TrendResponse {
    pub hourly: HourlyTrends,
    pub daily: DailyTrends,
}

/// Hour-of-day buckets over the recent window plus date buckets over the
/// requested day range.
pub async fn trends(
    State(state): State<AppState>,
    Query(params): Query<TrendParams>,
) -> Json<TrendResponse> {
    let days = params.days.unwrap_or(7).clamp(1, 90);
    let (_, scored) = window(&state).await;
    Json(TrendResponse {
        hourly: aggregate::hourly_trends(&scored),
        daily: state.store.daily_trends(days).await,
    })
}

pub async fn languages(State(state): State<AppState>) -> Json<Value> {
    let (posts, _) = window(&state).await;
    let (summary, posts) = language::breakdown_by_language(&posts, &state.scorer);
    Json(json!({
        "summary": summary,
        "posts": posts,
    }))
}

pub async fn geography(State(state): State<AppState>) -> Json<Value> {
    let (posts, scored) = window(&state).await;
    let breakdown = geography::breakdown_by_geography(&posts, &scored);
    let map = geography::world_map_data(&breakdown);
    let insights = geography::insights(&breakdown);
    Json(json!({
        "breakdown": breakdown,
        "world_map": map,
        "insights": insights,
    }))
}

#[derive(Debug, Serialize)]
pub struct EnrichedRow {
    pub text: String,
    pub sentiment: Sentiment,
    pub score: f64,
    pub emotions: Vec<&'static str>,
    pub analysis: DetailedAnalysis,
}

/// Detailed analysis for the top-ranked posts of the recent window. Remote
/// calls are skipped while the stream is stopped; the local heuristic still
/// answers.
pub async fn enriched(State(state): State<AppState>) -> Json<Vec<EnrichedRow>> {
    let (_, scored) = window(&state).await;
    let remote_allowed = state.running.load(Ordering::Relaxed);
    let analyses = state
        .reasoner
        .enrich_top(&scored, state.top_k, remote_allowed)
        .await;

    let mut rows: Vec<EnrichedRow> = analyses
        .into_iter()
        .map(|(i, analysis)| {
            let sp = &scored[i];
            EnrichedRow {
                text: sp.post.text.clone(),
                sentiment: sp.sentiment,
                score: sp.score,
                emotions: detect_emotions(&sp.post.text),
                analysis,
            }
        })
        .collect();
    rows.sort_by(|a, b| {
        b.score
            .abs()
            .partial_cmp(&a.score.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Json(rows)
}

pub async fn stream_start(State(state): State<AppState>) -> Json<Value> {
    state.running.store(true, Ordering::Relaxed);
    Json(json!({ "streaming": true }))
}

pub async fn stream_stop(State(state): State<AppState>) -> Json<Value> {
    state.running.store(false, Ordering::Relaxed);
    Json(json!({ "streaming": false }))
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "pulso",
        "endpoints": [
            "/api/analyze",
            "/api/recent",
            "/api/stats",
            "/api/trends",
            "/api/languages",
            "/api/geography",
            "/api/enriched",
            "/api/stream/start",
            "/api/stream/stop",
            "/sse",
        ],
    }))
}

/// The breakdown endpoints all work over the same slice of history: the
/// most recent stored records, rebuilt as a parallel (posts, scored) pair
/// with the persisted labels rather than a rescore.
async fn window(state: &AppState) -> (Vec<Post>, Vec<ScoredPost>) {
    let records = state.store.recent(state.breakdown_window).await;
    let mut posts = Vec::with_capacity(records.len());
    let mut scored = Vec::with_capacity(records.len());
    for record in records {
        let mut post = Post::new(&record.text, Source::Stream);
        post.created_at = Some(record.timestamp);
        scored.push(ScoredPost {
            post: post.clone(),
            sentiment: record.sentiment,
            score: record.score,
        });
        posts.push(post);
    }
    (posts, scored)
}
