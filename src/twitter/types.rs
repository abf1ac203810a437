//! Wire shapes for the Twitter v2 recent-search endpoint.

use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub data: Option<Vec<Tweet>>,
    pub includes: Option<Includes>,
}

#[derive(Debug, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
    pub public_metrics: Option<PublicMetrics>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublicMetrics {
    #[serde(default)]
    pub like_count: u32,
    #[serde(default)]
    pub retweet_count: u32,
}

#[derive(Debug, Deserialize)]
pub struct Includes {
    #[serde(default)]
    pub users: Vec<User>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub verified: bool,
}
