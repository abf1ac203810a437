//! Batch aggregation: per-post scoring, summary percentages, and trend
//! bucketing. Pure and synchronous; the only part of the service with any
//! real math in it.

use chrono::{Duration, Timelike, Utc};

use super::scorer::SentimentScorer;
use super::types::{
    DailyTrends, HourlyTrends, LabelCounts, Post, ScoredPost, SentimentSummary,
};

/// Score a batch and aggregate it into summary statistics and hourly trends.
///
/// Empty input yields the zero summary (`overall = neutral`,
/// `average_score = 0.0`) with no division by zero.
pub fn summarize(
    posts: &[Post],
    scorer: &SentimentScorer,
) -> (SentimentSummary, HourlyTrends, Vec<ScoredPost>) {
    if posts.is_empty() {
        return (SentimentSummary::empty(), HourlyTrends::new(), Vec::new());
    }

    let now = Utc::now();
    let mut counts = LabelCounts::default();
    let mut score_sum = 0.0_f64;
    let mut scored = Vec::with_capacity(posts.len());

    for (i, post) in posts.iter().enumerate() {
        let (sentiment, score) = scorer.score(&post.text);
        counts.increment(sentiment);
        score_sum += score;

        // Fallback only: a post without a real timestamp gets `now - i hours`
        // so arrival order becomes a synthetic recency ordering and trend
        // bucketing still has something to group on.
        let mut post = post.clone();
        if post.created_at.is_none() {
            post.created_at = Some(now - Duration::hours(i as i64));
        }

        scored.push(ScoredPost {
            post,
            sentiment,
            score,
        });
    }

    let summary = SentimentSummary {
        total: posts.len(),
        counts,
        percentages: counts.percentages(),
        overall: counts.dominant(),
        average_score: score_sum / posts.len() as f64,
    };

    (summary, hourly_trends(&scored), scored)
}

/// Group scored posts by the hour-of-day of `created_at`. Hours with no
/// posts are absent from the result.
pub fn hourly_trends(scored: &[ScoredPost]) -> HourlyTrends {
    let mut trends = HourlyTrends::new();
    for sp in scored {
        let Some(ts) = sp.post.created_at else {
            continue;
        };
        trends.entry(ts.hour()).or_default().increment(sp.sentiment);
    }
    trends
}

/// Group scored posts by calendar date, the coarser bucket for multi-day
/// views.
pub fn daily_trends(scored: &[ScoredPost]) -> DailyTrends {
    let mut trends = DailyTrends::new();
    for sp in scored {
        let Some(ts) = sp.post.created_at else {
            continue;
        };
        trends
            .entry(ts.date_naive())
            .or_default()
            .increment(sp.sentiment);
    }
    trends
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::scorer::ScoringMode;
    use crate::analysis::types::{Sentiment, Source};
    use chrono::TimeZone;

    fn posts(texts: &[&str]) -> Vec<Post> {
        texts
            .iter()
            .map(|t| Post::new(*t, Source::Simulated))
            .collect()
    }

    #[test]
    fn empty_batch_yields_zero_summary() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let (summary, trends, scored) = summarize(&[], &scorer);
        assert_eq!(summary.total, 0);
        assert_eq!(summary.counts, LabelCounts::default());
        assert_eq!(summary.percentages.sum(), 0.0);
        assert_eq!(summary.overall, Sentiment::Neutral);
        assert_eq!(summary.average_score, 0.0);
        assert!(trends.is_empty());
        assert!(scored.is_empty());
    }

    #[test]
    fn single_model_scenario_ties_to_neutral() {
        let scorer = SentimentScorer::new(ScoringMode::Single);
        let batch = posts(&[
            "I love this amazing product!",
            "This is terrible and awful",
            "The weather is okay",
        ]);
        let (summary, _, scored) = summarize(&batch, &scorer);

        let labels: Vec<Sentiment> = scored.iter().map(|s| s.sentiment).collect();
        assert_eq!(
            labels,
            vec![Sentiment::Positive, Sentiment::Negative, Sentiment::Neutral]
        );
        assert!((summary.percentages.positive - 33.33).abs() < 0.01);
        assert!((summary.percentages.neutral - 33.33).abs() < 0.01);
        assert!((summary.percentages.negative - 33.33).abs() < 0.01);
        assert_eq!(summary.overall, Sentiment::Neutral);
    }

    #[test]
    fn percentages_sum_to_one_hundred_for_nonempty_batches() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let batch = posts(&[
            "Absolutely fantastic experience, highly recommend!",
            "Not impressed, could be better.",
            "Traffic was terrible this morning.",
            "Outstanding performance by the team!",
            "The movie was just average.",
        ]);
        let (summary, _, _) = summarize(&batch, &scorer);
        assert!((summary.percentages.sum() - 100.0).abs() < 1e-6);
        assert_eq!(summary.counts.total() as usize, summary.total);
    }

    #[test]
    fn missing_timestamps_backfill_one_hour_apart() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let batch = posts(&["first", "second", "third"]);
        let before = Utc::now();
        let (_, _, scored) = summarize(&batch, &scorer);

        let t0 = scored[0].post.created_at.unwrap();
        let t1 = scored[1].post.created_at.unwrap();
        let t2 = scored[2].post.created_at.unwrap();
        assert!(t0 >= before - Duration::seconds(5));
        assert_eq!(t0 - t1, Duration::hours(1));
        assert_eq!(t1 - t2, Duration::hours(1));
    }

    #[test]
    fn real_timestamps_are_never_mutated() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let ts = Utc.with_ymd_and_hms(2026, 8, 20, 14, 30, 0).unwrap();
        let mut post = Post::new("great launch", Source::Live);
        post.created_at = Some(ts);
        let (_, _, scored) = summarize(&[post], &scorer);
        assert_eq!(scored[0].post.created_at, Some(ts));
    }

    #[test]
    fn hourly_trends_omit_unobserved_hours() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let mut a = Post::new("love it", Source::Live);
        a.created_at = Some(Utc.with_ymd_and_hms(2026, 8, 20, 9, 0, 0).unwrap());
        let mut b = Post::new("hate it", Source::Live);
        b.created_at = Some(Utc.with_ymd_and_hms(2026, 8, 20, 9, 45, 0).unwrap());
        let mut c = Post::new("fine", Source::Live);
        c.created_at = Some(Utc.with_ymd_and_hms(2026, 8, 20, 17, 5, 0).unwrap());

        let (_, trends, _) = summarize(&[a, b, c], &scorer);
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[&9].total(), 2);
        assert_eq!(trends[&17].total(), 1);
        assert!(!trends.contains_key(&10));
    }

    #[test]
    fn daily_trends_bucket_by_date() {
        let scorer = SentimentScorer::new(ScoringMode::Blended);
        let mut a = Post::new("love it", Source::Live);
        a.created_at = Some(Utc.with_ymd_and_hms(2026, 8, 20, 9, 0, 0).unwrap());
        let mut b = Post::new("awful day", Source::Live);
        b.created_at = Some(Utc.with_ymd_and_hms(2026, 8, 21, 9, 0, 0).unwrap());

        let (_, _, scored) = summarize(&[a, b], &scorer);
        let daily = daily_trends(&scored);
        assert_eq!(daily.len(), 2);
        for row in daily.values() {
            assert_eq!(row.total(), 1);
        }
    }
}
