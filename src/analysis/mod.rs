pub mod aggregate;
pub mod gemini;
pub mod geography;
mod keywords;
pub mod language;
pub mod scorer;
pub mod types;

pub use gemini::GeminiReasoner;
pub use scorer::SentimentScorer;
pub use types::{Post, ScoredPost, Sentiment, SentimentSummary, Source};
