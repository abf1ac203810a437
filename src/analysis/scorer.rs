//! Lexicon scoring: two independent fixed word-polarity models and the
//! blended combination used by the aggregation pipeline.

use anyhow::Result;
use serde::Deserialize;
use tracing::debug;

use super::types::Sentiment;

/// Classification cut-offs. Comparison is strict: a score exactly equal to
/// a threshold classifies neutral.
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub positive: f64,
    pub negative: f64,
}

/// Thresholds for a single-model score.
pub const SINGLE_MODEL: Thresholds = Thresholds {
    positive: 0.1,
    negative: -0.1,
};

/// Thresholds for the blended (two-model average) score. The two call sites
/// intentionally use different cut-offs; do not unify them.
pub const BLENDED: Thresholds = Thresholds {
    positive: 0.05,
    negative: -0.05,
};

pub fn classify(score: f64, thresholds: &Thresholds) -> Sentiment {
    if score > thresholds.positive {
        Sentiment::Positive
    } else if score < thresholds.negative {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

/// Which scorer a call site runs. Recorded as configuration rather than
/// hidden inside the aggregation functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringMode {
    Single,
    Blended,
}

/// Primary polarity model: compound-style word weights.
///
/// Keys are lowercase single words. Values in `(0.0, 1.0]` are positive,
/// in `[-1.0, 0.0)` are negative. The summed score is clamped to `[-1.0, 1.0]`.
const PRIMARY_LEXICON: &[(&str, f64)] = &[
    // Positive signals
    ("love", 0.6),
    ("loved", 0.6),
    ("amazing", 0.6),
    ("incredible", 0.6),
    ("excellent", 0.6),
    ("fantastic", 0.6),
    ("outstanding", 0.6),
    ("awesome", 0.6),
    ("perfect", 0.6),
    ("wonderful", 0.5),
    ("best", 0.5),
    ("great", 0.4),
    ("happy", 0.4),
    ("beautiful", 0.4),
    ("delicious", 0.4),
    ("satisfied", 0.4),
    ("recommend", 0.4),
    ("success", 0.4),
    ("excited", 0.4),
    ("revolutionary", 0.4),
    ("good", 0.3),
    ("nice", 0.3),
    ("enjoy", 0.3),
    ("win", 0.3),
    // Negative signals
    ("terrible", -0.6),
    ("awful", -0.6),
    ("horrible", -0.6),
    ("hate", -0.6),
    ("worst", -0.6),
    ("unacceptable", -0.6),
    ("disappointed", -0.5),
    ("disappointing", -0.5),
    ("frustrated", -0.5),
    ("frustrating", -0.5),
    ("angry", -0.5),
    ("bad", -0.4),
    ("broken", -0.4),
    ("poor", -0.4),
    ("sad", -0.4),
    ("fail", -0.4),
    ("failed", -0.4),
    ("downtime", -0.4),
    ("slow", -0.3),
    ("problem", -0.3),
    ("problems", -0.3),
    ("issue", -0.3),
    ("issues", -0.3),
    ("concern", -0.3),
    ("concerns", -0.3),
];

/// Secondary polarity model: an independent vocabulary with its own weights,
/// averaged with the primary score for the blended verdict.
const SECONDARY_LEXICON: &[(&str, f64)] = &[
    ("excellent", 1.0),
    ("wonderful", 1.0),
    ("perfect", 1.0),
    ("best", 1.0),
    ("fantastic", 0.9),
    ("great", 0.8),
    ("happy", 0.8),
    ("good", 0.7),
    ("amazing", 0.6),
    ("nice", 0.6),
    ("love", 0.5),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("worst", -1.0),
    ("hate", -0.8),
    ("bad", -0.7),
    ("disappointed", -0.6),
    ("frustrating", -0.6),
    ("sad", -0.5),
];

/// Secondary model guard: texts longer than this are rejected and the
/// blended path falls back to the primary score alone.
const SECONDARY_MAX_CHARS: usize = 20_000;

fn lexicon_sum(text: &str, lexicon: &[(&str, f64)]) -> f64 {
    let mut score = 0.0_f64;
    for word in text.split_whitespace() {
        let w = word
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        for &(lex_word, weight) in lexicon {
            if w == lex_word {
                score += weight;
                break;
            }
        }
    }
    score.clamp(-1.0, 1.0)
}

/// Primary-model polarity in `[-1.0, 1.0]`. `0.0` for empty or unknown text.
pub fn primary_polarity(text: &str) -> f64 {
    lexicon_sum(text, PRIMARY_LEXICON)
}

fn secondary_polarity(text: &str) -> Result<f64> {
    if text.chars().count() > SECONDARY_MAX_CHARS {
        anyhow::bail!("input exceeds secondary model limit of {SECONDARY_MAX_CHARS} chars");
    }
    Ok(lexicon_sum(text, SECONDARY_LEXICON))
}

pub struct SentimentScorer {
    mode: ScoringMode,
}

impl SentimentScorer {
    pub fn new(mode: ScoringMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ScoringMode {
        self.mode
    }

    /// Score with the configured mode.
    pub fn score(&self, text: &str) -> (Sentiment, f64) {
        match self.mode {
            ScoringMode::Single => self.score_single(text),
            ScoringMode::Blended => self.score_blended(text),
        }
    }

    /// Primary model only, single-model thresholds.
    pub fn score_single(&self, text: &str) -> (Sentiment, f64) {
        if text.trim().is_empty() {
            return (Sentiment::Neutral, 0.0);
        }
        let score = primary_polarity(text);
        (classify(score, &SINGLE_MODEL), score)
    }

    /// Average of both models, blended thresholds. If the secondary model
    /// rejects the input, the primary score alone is classified, still with
    /// the blended thresholds.
    pub fn score_blended(&self, text: &str) -> (Sentiment, f64) {
        if text.trim().is_empty() {
            return (Sentiment::Neutral, 0.0);
        }
        let primary = primary_polarity(text);
        let score = match secondary_polarity(text) {
            Ok(secondary) => (primary + secondary) / 2.0,
            Err(err) => {
                debug!("secondary model unavailable for input: {err:#}");
                primary
            }
        };
        (classify(score, &BLENDED), score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_is_neutral_zero() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        assert_eq!(scorer.score(""), (Sentiment::Neutral, 0.0));
        assert_eq!(scorer.score("   "), (Sentiment::Neutral, 0.0));
    }

    #[test]
    fn unknown_words_score_zero() {
        assert_eq!(primary_polarity("the quick brown fox"), 0.0);
    }

    #[test]
    fn punctuation_is_stripped_from_words() {
        assert!(primary_polarity("amazing!") > 0.0);
    }

    #[test]
    fn score_clamps_to_unit_range() {
        let piled_on = "amazing excellent fantastic wonderful perfect best";
        assert_eq!(primary_polarity(piled_on), 1.0);
        let piled_on = "terrible awful horrible worst hate unacceptable";
        assert_eq!(primary_polarity(piled_on), -1.0);
    }

    #[test]
    fn single_model_threshold_is_strict() {
        assert_eq!(classify(0.1, &SINGLE_MODEL), Sentiment::Neutral);
        assert_eq!(classify(0.11, &SINGLE_MODEL), Sentiment::Positive);
        assert_eq!(classify(-0.1, &SINGLE_MODEL), Sentiment::Neutral);
        assert_eq!(classify(-0.11, &SINGLE_MODEL), Sentiment::Negative);
    }

    #[test]
    fn blended_threshold_is_strict_and_narrower() {
        assert_eq!(classify(0.05, &BLENDED), Sentiment::Neutral);
        assert_eq!(classify(0.06, &BLENDED), Sentiment::Positive);
        assert_eq!(classify(-0.05, &BLENDED), Sentiment::Neutral);
        assert_eq!(classify(-0.06, &BLENDED), Sentiment::Negative);
        // A score between the two pairs classifies differently per mode.
        assert_eq!(classify(0.07, &SINGLE_MODEL), Sentiment::Neutral);
        assert_eq!(classify(0.07, &BLENDED), Sentiment::Positive);
    }

    #[test]
    fn blended_score_is_the_model_average() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let (sentiment, score) = scorer.score("love");
        // primary 0.6, secondary 0.5
        assert!((score - 0.55).abs() < 1e-9);
        assert_eq!(sentiment, Sentiment::Positive);
    }

    #[test]
    fn blended_scoring_is_deterministic() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let text = "Amazing product, terrible support.";
        let first = scorer.score(text);
        for _ in 0..10 {
            assert_eq!(scorer.score(text), first);
        }
    }

    #[test]
    fn oversized_input_falls_back_to_primary_alone() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let mut text = String::from("love ");
        text.push_str(&"x".repeat(SECONDARY_MAX_CHARS + 1));
        let (sentiment, score) = scorer.score(&text);
        // Primary alone (0.6), classified with the blended thresholds.
        assert!((score - 0.6).abs() < 1e-9);
        assert_eq!(sentiment, Sentiment::Positive);
    }

    #[test]
    fn polar_texts_classify_as_expected() {
        let scorer = SentimentScorer::new(ScoringMode::Single);
        assert_eq!(
            scorer.score("I love this amazing product!").0,
            Sentiment::Positive
        );
        assert_eq!(
            scorer.score("This is terrible and awful").0,
            Sentiment::Negative
        );
        assert_eq!(scorer.score("The weather is okay").0, Sentiment::Neutral);
    }
}
