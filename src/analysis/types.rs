use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Sentiment polarity label. Always a pure function of the numeric score
/// under the active threshold pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }

    pub fn all() -> &'static [Sentiment] {
        &[Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative]
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a post came from. Kept on the post so a degraded fetch is visible
/// to the caller instead of a hidden substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Live,
    Simulated,
    Stream,
}

/// One social-media-style item. Immutable once produced by the source;
/// downstream passes attach derived fields on wrapper types instead of
/// mutating it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub text: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub likes: u32,
    #[serde(default)]
    pub retweets: u32,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub verified: bool,
    pub source: Source,
}

impl Post {
    pub fn new(text: impl Into<String>, source: Source) -> Self {
        Self {
            text: text.into(),
            created_at: None,
            likes: 0,
            retweets: 0,
            author: None,
            verified: false,
            source,
        }
    }
}

/// A post plus its sentiment verdict.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredPost {
    #[serde(flatten)]
    pub post: Post,
    pub sentiment: Sentiment,
    pub score: f64,
}

/// Per-label counters, all three labels always present (zero-filled).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    pub positive: u64,
    pub neutral: u64,
    pub negative: u64,
}

impl LabelCounts {
    pub fn increment(&mut self, sentiment: Sentiment) {
        match sentiment {
            Sentiment::Positive => self.positive += 1,
            Sentiment::Neutral => self.neutral += 1,
            Sentiment::Negative => self.negative += 1,
        }
    }

    pub fn get(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn total(&self) -> u64 {
        self.positive + self.neutral + self.negative
    }

    /// Percentage share per label. All zeros when the counts are empty,
    /// never a division by zero.
    pub fn percentages(&self) -> LabelPercentages {
        let total = self.total();
        if total == 0 {
            return LabelPercentages::default();
        }
        let total = total as f64;
        LabelPercentages {
            positive: self.positive as f64 / total * 100.0,
            neutral: self.neutral as f64 / total * 100.0,
            negative: self.negative as f64 / total * 100.0,
        }
    }

    /// The label with the strictly greatest count. Any tie for the maximum
    /// resolves to `Neutral`, including the empty case.
    pub fn dominant(&self) -> Sentiment {
        let max = self.positive.max(self.neutral).max(self.negative);
        let mut winner = Sentiment::Neutral;
        let mut winners = 0;
        for &sentiment in Sentiment::all() {
            if self.get(sentiment) == max {
                winner = sentiment;
                winners += 1;
            }
        }
        if winners == 1 {
            winner
        } else {
            Sentiment::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPercentages {
    pub positive: f64,
    pub neutral: f64,
    pub negative: f64,
}

impl LabelPercentages {
    pub fn get(&self, sentiment: Sentiment) -> f64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    pub fn sum(&self) -> f64 {
        self.positive + self.neutral + self.negative
    }
}

/// Aggregate verdict over one batch of posts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub total: usize,
    pub counts: LabelCounts,
    pub percentages: LabelPercentages,
    pub overall: Sentiment,
    pub average_score: f64,
}

impl SentimentSummary {
    pub fn empty() -> Self {
        Self {
            total: 0,
            counts: LabelCounts::default(),
            percentages: LabelPercentages::default(),
            overall: Sentiment::Neutral,
            average_score: 0.0,
        }
    }
}

/// Label counts keyed by hour-of-day. Hours never observed are omitted;
/// callers needing a dense 24-hour series fill the gaps themselves.
pub type HourlyTrends = BTreeMap<u32, LabelCounts>;

/// Coarser bucket granularity for multi-day views.
pub type DailyTrends = BTreeMap<NaiveDate, LabelCounts>;
