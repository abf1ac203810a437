//! Location extraction against a fixed gazetteer and the per-country /
//! per-region sentiment breakdown.

use serde::Serialize;
use std::collections::HashMap;

use super::keywords::contains_keyword;
use super::types::{LabelCounts, LabelPercentages, Post, ScoredPost, Sentiment};

/// One gazetteer entry. Enumeration order is the documented tie-break for
/// texts mentioning more than one country.
#[derive(Debug)]
pub struct CountryInfo {
    pub code: &'static str,
    pub keywords: &'static [&'static str],
    pub lat: f64,
    pub lon: f64,
    pub region: Option<&'static str>,
}

pub const GAZETTEER: &[CountryInfo] = &[
    CountryInfo {
        code: "usa",
        keywords: &["usa", "united states", "us", "america", "new york", "california", "texas", "florida"],
        lat: 37.0902,
        lon: -95.7129,
        region: Some("North America"),
    },
    CountryInfo {
        code: "uk",
        keywords: &["uk", "united kingdom", "britain", "london", "england", "scotland", "wales"],
        lat: 55.3781,
        lon: -3.4360,
        region: Some("Europe"),
    },
    CountryInfo {
        code: "canada",
        keywords: &["canada", "toronto", "vancouver", "montreal", "ottawa"],
        lat: 56.1304,
        lon: -106.3468,
        region: Some("North America"),
    },
    CountryInfo {
        code: "australia",
        keywords: &["australia", "sydney", "melbourne", "brisbane", "perth"],
        lat: -25.2744,
        lon: 133.7751,
        region: Some("Oceania"),
    },
    CountryInfo {
        code: "germany",
        keywords: &["germany", "berlin", "munich", "frankfurt", "hamburg"],
        lat: 51.1657,
        lon: 10.4515,
        region: Some("Europe"),
    },
    CountryInfo {
        code: "france",
        keywords: &["france", "paris", "lyon", "marseille", "toulouse"],
        lat: 46.6034,
        lon: 1.8883,
        region: Some("Europe"),
    },
    CountryInfo {
        code: "spain",
        keywords: &["spain", "madrid", "barcelona", "valencia", "seville"],
        lat: 40.4637,
        lon: -3.7492,
        region: Some("Europe"),
    },
    CountryInfo {
        code: "italy",
        keywords: &["italy", "rome", "milan", "naples", "turin"],
        lat: 41.8719,
        lon: 12.5674,
        region: Some("Europe"),
    },
    CountryInfo {
        code: "japan",
        keywords: &["japan", "tokyo", "osaka", "kyoto", "yokohama"],
        lat: 36.2048,
        lon: 138.2529,
        region: Some("Asia"),
    },
    CountryInfo {
        code: "china",
        keywords: &["china", "beijing", "shanghai", "hong kong", "shenzhen"],
        lat: 35.8617,
        lon: 104.1954,
        region: Some("Asia"),
    },
    CountryInfo {
        code: "india",
        keywords: &["india", "mumbai", "delhi", "bangalore", "chennai"],
        lat: 20.5937,
        lon: 78.9629,
        region: Some("Asia"),
    },
    CountryInfo {
        code: "brazil",
        keywords: &["brazil", "sao paulo", "rio de janeiro", "brasilia", "salvador"],
        lat: -14.2350,
        lon: -51.9253,
        region: Some("South America"),
    },
    CountryInfo {
        code: "mexico",
        keywords: &["mexico", "mexico city", "guadalajara", "monterrey", "puebla"],
        lat: 23.6345,
        lon: -102.5528,
        region: Some("North America"),
    },
    CountryInfo {
        code: "russia",
        keywords: &["russia", "moscow", "saint petersburg", "novosibirsk", "yekaterinburg"],
        lat: 61.5240,
        lon: 105.3188,
        region: Some("Europe/Asia"),
    },
];

/// Extra city names not in the country keyword lists, checked after the
/// gazetteer in this fixed order.
const CITY_COUNTRIES: &[(&str, &str)] = &[
    ("los angeles", "usa"),
    ("chicago", "usa"),
    ("manchester", "uk"),
    ("birmingham", "uk"),
];

fn country_by_code(code: &str) -> Option<&'static CountryInfo> {
    GAZETTEER.iter().find(|c| c.code == code)
}

/// Map a text to at most one country.
///
/// The first gazetteer entry (then city entry) with any keyword match wins;
/// a text mentioning several countries therefore always resolves the same
/// way.
pub fn extract_location(text: &str) -> Option<&'static CountryInfo> {
    let lower = text.to_lowercase();
    for country in GAZETTEER {
        if country.keywords.iter().any(|k| contains_keyword(&lower, k)) {
            return Some(country);
        }
    }
    for &(city, code) in CITY_COUNTRIES {
        if contains_keyword(&lower, city) {
            return country_by_code(code);
        }
    }
    None
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
    pub region: Option<&'static str>,
}

/// Per-country aggregate row.
#[derive(Debug, Clone, Serialize)]
pub struct CountryStats {
    pub total_posts: u64,
    pub counts: LabelCounts,
    pub distribution: LabelPercentages,
    pub average_score: f64,
    pub coordinates: Coordinates,
}

/// Per-region roll-up of the country rows sharing a region tag.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RegionStats {
    pub total_posts: u64,
    pub counts: LabelCounts,
    pub distribution: LabelPercentages,
    pub countries: Vec<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GeographicBreakdown {
    pub total_posts: usize,
    pub total_located_posts: usize,
    pub country_sentiments: HashMap<&'static str, CountryStats>,
    pub regional_sentiments: HashMap<&'static str, RegionStats>,
    pub coverage_percentage: f64,
}

impl GeographicBreakdown {
    fn empty() -> Self {
        Self {
            total_posts: 0,
            total_located_posts: 0,
            country_sentiments: HashMap::new(),
            regional_sentiments: HashMap::new(),
            coverage_percentage: 0.0,
        }
    }
}

/// Aggregate sentiment per country and region.
///
/// `scored` is the parallel per-post array already produced by the batch
/// aggregation; a post past its end counts as neutral with score zero.
/// Posts with no gazetteer match contribute to `total_posts` only.
pub fn breakdown_by_geography(posts: &[Post], scored: &[ScoredPost]) -> GeographicBreakdown {
    if posts.is_empty() {
        return GeographicBreakdown::empty();
    }

    let mut country_sentiments: HashMap<&'static str, CountryStats> = HashMap::new();
    let mut located = 0usize;

    for (i, post) in posts.iter().enumerate() {
        let Some(country) = extract_location(&post.text) else {
            continue;
        };
        located += 1;

        let (sentiment, score) = scored
            .get(i)
            .map(|sp| (sp.sentiment, sp.score))
            .unwrap_or((Sentiment::Neutral, 0.0));

        let stats = country_sentiments
            .entry(country.code)
            .or_insert_with(|| CountryStats {
                total_posts: 0,
                counts: LabelCounts::default(),
                distribution: LabelPercentages::default(),
                average_score: 0.0,
                coordinates: Coordinates {
                    lat: country.lat,
                    lon: country.lon,
                    region: country.region,
                },
            });

        stats.total_posts += 1;
        stats.counts.increment(sentiment);
        // Incremental mean update, equal to the plain running average.
        let n = stats.total_posts as f64;
        stats.average_score = (stats.average_score * (n - 1.0) + score) / n;
    }

    for stats in country_sentiments.values_mut() {
        stats.distribution = stats.counts.percentages();
    }

    let mut regional_sentiments: HashMap<&'static str, RegionStats> = HashMap::new();
    for (code, stats) in &country_sentiments {
        let Some(region) = stats.coordinates.region else {
            continue;
        };
        let row = regional_sentiments.entry(region).or_default();
        row.total_posts += stats.total_posts;
        row.counts.positive += stats.counts.positive;
        row.counts.neutral += stats.counts.neutral;
        row.counts.negative += stats.counts.negative;
        row.countries.push(code);
    }
    for row in regional_sentiments.values_mut() {
        row.distribution = row.counts.percentages();
        row.countries.sort_unstable();
    }

    GeographicBreakdown {
        total_posts: posts.len(),
        total_located_posts: located,
        country_sentiments,
        regional_sentiments,
        coverage_percentage: located as f64 / posts.len() as f64 * 100.0,
    }
}

/// Flat rows for a world-map view, one per located country.
#[derive(Debug, Clone, Serialize)]
pub struct MapRow {
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub total_posts: u64,
    pub sentiment: Sentiment,
    pub positive_percent: f64,
    pub negative_percent: f64,
    pub region: Option<&'static str>,
}

pub fn world_map_data(breakdown: &GeographicBreakdown) -> Vec<MapRow> {
    let mut rows: Vec<MapRow> = breakdown
        .country_sentiments
        .iter()
        .map(|(code, stats)| MapRow {
            country: title_case(code),
            lat: stats.coordinates.lat,
            lon: stats.coordinates.lon,
            total_posts: stats.total_posts,
            sentiment: stats.counts.dominant(),
            positive_percent: stats.distribution.positive,
            negative_percent: stats.distribution.negative,
            region: stats.coordinates.region,
        })
        .collect();
    rows.sort_by(|a, b| b.total_posts.cmp(&a.total_posts).then(a.country.cmp(&b.country)));
    rows
}

/// Human-readable one-liners for the dashboard.
pub fn insights(breakdown: &GeographicBreakdown) -> Vec<String> {
    if breakdown.total_located_posts == 0 {
        return vec!["No geographic data available for insights.".to_string()];
    }

    let mut lines = Vec::new();
    let countries = &breakdown.country_sentiments;

    if let Some((code, stats)) = countries.iter().max_by(|a, b| {
        a.1.distribution
            .positive
            .partial_cmp(&b.1.distribution.positive)
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        lines.push(format!(
            "Most positive sentiment in {} ({:.1}% positive)",
            title_case(code),
            stats.distribution.positive
        ));
    }

    if let Some((code, stats)) = countries.iter().max_by(|a, b| {
        a.1.distribution
            .negative
            .partial_cmp(&b.1.distribution.negative)
            .unwrap_or(std::cmp::Ordering::Equal)
    }) {
        lines.push(format!(
            "Most negative sentiment in {} ({:.1}% negative)",
            title_case(code),
            stats.distribution.negative
        ));
    }

    if let Some((region, stats)) = breakdown
        .regional_sentiments
        .iter()
        .max_by_key(|(_, stats)| stats.total_posts)
    {
        lines.push(format!(
            "Most active region: {} ({} posts)",
            region, stats.total_posts
        ));
    }

    lines.push(format!(
        "Geographic coverage: {:.1}% of posts located",
        breakdown.coverage_percentage
    ));
    lines
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::aggregate::summarize;
    use crate::analysis::scorer::{ScoringMode, SentimentScorer};
    use crate::analysis::types::Source;

    fn posts(texts: &[&str]) -> Vec<Post> {
        texts
            .iter()
            .map(|t| Post::new(*t, Source::Simulated))
            .collect()
    }

    fn scored(posts: &[Post]) -> Vec<ScoredPost> {
        let scorer = SentimentScorer::new(ScoringMode::Single);
        summarize(posts, &scorer).2
    }

    #[test]
    fn extracts_country_from_keyword() {
        assert_eq!(extract_location("Love the vibe in Tokyo!").unwrap().code, "japan");
        assert_eq!(extract_location("greetings from berlin").unwrap().code, "germany");
    }

    #[test]
    fn city_table_covers_extra_cities() {
        assert_eq!(extract_location("stuck in Chicago traffic").unwrap().code, "usa");
        assert_eq!(extract_location("rainy day in manchester").unwrap().code, "uk");
    }

    #[test]
    fn no_match_yields_none() {
        assert_eq!(extract_location("nothing geographic here").map(|c| c.code), None);
    }

    #[test]
    fn multi_country_mention_is_deterministic_first_match() {
        // usa precedes japan in the gazetteer.
        let text = "Flying from New York to Tokyo next week";
        for _ in 0..20 {
            assert_eq!(extract_location(text).unwrap().code, "usa");
        }
    }

    #[test]
    fn coverage_percentage_counts_located_posts() {
        let batch = posts(&[
            "Love the weather in New York today!",
            "Great conference in Tokyo!",
            "Just finished a long day of work",
            "Dinner was fine, nothing special",
            "Reading a decent book tonight",
        ]);
        let scored = scored(&batch);
        let breakdown = breakdown_by_geography(&batch, &scored);
        assert_eq!(breakdown.total_posts, 5);
        assert_eq!(breakdown.total_located_posts, 2);
        assert!((breakdown.coverage_percentage - 40.0).abs() < 1e-9);
    }

    #[test]
    fn empty_batch_yields_zero_breakdown() {
        let breakdown = breakdown_by_geography(&[], &[]);
        assert_eq!(breakdown.total_posts, 0);
        assert_eq!(breakdown.coverage_percentage, 0.0);
        assert!(breakdown.country_sentiments.is_empty());
        assert!(breakdown.regional_sentiments.is_empty());
    }

    #[test]
    fn running_average_matches_plain_mean() {
        let batch = posts(&[
            "I love the amazing food in Tokyo!",
            "Tokyo traffic is terrible and awful",
            "Tokyo is fine",
        ]);
        let scored = scored(&batch);
        let expected: f64 =
            scored.iter().map(|sp| sp.score).sum::<f64>() / scored.len() as f64;
        let breakdown = breakdown_by_geography(&batch, &scored);
        let japan = &breakdown.country_sentiments["japan"];
        assert_eq!(japan.total_posts, 3);
        assert!((japan.average_score - expected).abs() < 1e-9);
    }

    #[test]
    fn regions_sum_their_member_countries() {
        let batch = posts(&[
            "Berlin is wonderful this time of year",
            "Problems with service in London, very disappointed",
            "Great conference in Paris!",
            "Enjoying an excellent week in Sydney",
        ]);
        let scored = scored(&batch);
        let breakdown = breakdown_by_geography(&batch, &scored);

        let europe = &breakdown.regional_sentiments["Europe"];
        assert_eq!(europe.total_posts, 3);
        assert_eq!(
            europe.counts.total(),
            breakdown.country_sentiments["germany"].counts.total()
                + breakdown.country_sentiments["uk"].counts.total()
                + breakdown.country_sentiments["france"].counts.total()
        );
        assert_eq!(europe.countries.len(), 3);
        assert_eq!(breakdown.regional_sentiments["Oceania"].total_posts, 1);
    }

    #[test]
    fn unlocated_posts_count_toward_total_only() {
        let batch = posts(&["Berlin sunshine", "just an ordinary day"]);
        let scored = scored(&batch);
        let breakdown = breakdown_by_geography(&batch, &scored);
        assert_eq!(breakdown.total_posts, 2);
        assert_eq!(breakdown.total_located_posts, 1);
        let counted: u64 = breakdown
            .country_sentiments
            .values()
            .map(|c| c.total_posts)
            .sum();
        assert_eq!(counted, 1);
    }

    #[test]
    fn map_rows_carry_dominant_sentiment() {
        let batch = posts(&[
            "I love the amazing food in Tokyo!",
            "Tokyo is an excellent, wonderful city",
        ]);
        let scored = scored(&batch);
        let breakdown = breakdown_by_geography(&batch, &scored);
        let rows = world_map_data(&breakdown);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].country, "Japan");
        assert_eq!(rows[0].sentiment, Sentiment::Positive);
        assert_eq!(rows[0].region, Some("Asia"));
    }

    #[test]
    fn insights_cover_coverage_and_extremes() {
        let batch = posts(&[
            "Berlin is wonderful",
            "London service was terrible and awful",
        ]);
        let scored = scored(&batch);
        let breakdown = breakdown_by_geography(&batch, &scored);
        let lines = insights(&breakdown);
        assert!(lines.iter().any(|l| l.contains("Most positive sentiment in Germany")));
        assert!(lines.iter().any(|l| l.contains("Most negative sentiment in Uk")));
        assert!(lines.iter().any(|l| l.contains("100.0% of posts located")));
    }

    #[test]
    fn empty_insights_when_nothing_located() {
        let breakdown = breakdown_by_geography(&posts(&["plain text"]), &[]);
        let lines = insights(&breakdown);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("No geographic data"));
    }
}
