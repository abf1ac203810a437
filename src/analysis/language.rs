//! Language detection and the per-language sentiment breakdown.
//!
//! Detection is a keyword-frequency heuristic over a fixed language set with
//! a statistical fallback (`whatlang`); sentiment for non-English languages
//! is a coarse lexicon lookup, not statistical inference.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use tracing::debug;

use super::keywords::{contains_keyword, keyword_hits};
use super::scorer::SentimentScorer;
use super::types::{LabelCounts, LabelPercentages, Post, Sentiment};

/// Texts shorter than this always classify as the default language without
/// invoking detection.
const MIN_DETECTION_CHARS: usize = 10;

/// Keyword hit-counts must exceed this before the heuristic wins over the
/// statistical fallback.
const KEYWORD_HIT_FLOOR: usize = 2;

/// The fixed language set. `En` is the default and enumeration order is the
/// documented tie-break for keyword detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
    Fr,
    De,
    It,
    Pt,
    Nl,
    Ru,
    Zh,
    Ja,
    Ko,
    Ar,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Fr => "fr",
            Language::De => "de",
            Language::It => "it",
            Language::Pt => "pt",
            Language::Nl => "nl",
            Language::Ru => "ru",
            Language::Zh => "zh",
            Language::Ja => "ja",
            Language::Ko => "ko",
            Language::Ar => "ar",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::En => "English",
            Language::Es => "Spanish",
            Language::Fr => "French",
            Language::De => "German",
            Language::It => "Italian",
            Language::Pt => "Portuguese",
            Language::Nl => "Dutch",
            Language::Ru => "Russian",
            Language::Zh => "Chinese",
            Language::Ja => "Japanese",
            Language::Ko => "Korean",
            Language::Ar => "Arabic",
        }
    }

    pub fn all() -> &'static [Language] {
        &[
            Language::En,
            Language::Es,
            Language::Fr,
            Language::De,
            Language::It,
            Language::Pt,
            Language::Nl,
            Language::Ru,
            Language::Zh,
            Language::Ja,
            Language::Ko,
            Language::Ar,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// High-frequency function words per language. English carries no list; it
/// is the fallback, not a detection target. Matching follows the
/// [`keywords`](super::keywords) rules over the lowercased text.
const DETECTION_KEYWORDS: &[(Language, &[&str])] = &[
    (
        Language::Es,
        &["el", "la", "de", "que", "y", "en", "un", "es", "se", "no"],
    ),
    (
        Language::Fr,
        &["le", "la", "de", "et", "à", "en", "un", "est", "pour", "dans"],
    ),
    (
        Language::De,
        &["der", "die", "das", "und", "in", "den", "von", "zu", "ist", "sie"],
    ),
    (
        Language::It,
        &["il", "la", "di", "e", "in", "un", "è", "per", "che", "si"],
    ),
    (
        Language::Pt,
        &["o", "a", "de", "e", "em", "um", "é", "para", "com", "não"],
    ),
    (
        Language::Nl,
        &["de", "het", "en", "in", "van", "te", "dat", "is", "een", "op"],
    ),
    (
        Language::Ru,
        &["и", "в", "не", "на", "я", "быть", "с", "что", "а", "по"],
    ),
    (
        Language::Zh,
        &["的", "一", "是", "在", "不", "了", "有", "和", "人", "这"],
    ),
    (
        Language::Ja,
        &["の", "に", "は", "を", "た", "で", "し", "い", "て", "と"],
    ),
    (
        Language::Ko,
        &["이", "에", "는", "을", "의", "로", "다", "고", "하", "지"],
    ),
    (
        Language::Ar,
        &["ال", "في", "من", "على", "أن", "ما", "هو", "إلى", "كان", "لا"],
    ),
];

/// Fixed positive/negative word lists per non-English language, the static
/// dispatch table for the coarse keyword analyzer.
const SENTIMENT_WORDS: &[(Language, &[&str], &[&str])] = &[
    (
        Language::Es,
        &["bueno", "excelente", "fantástico", "maravilloso", "genial", "perfecto", "amo", "encanta"],
        &["malo", "terrible", "horrible", "odio", "problema", "error", "pésimo", "decepcionado"],
    ),
    (
        Language::Fr,
        &["bon", "excellent", "fantastique", "merveilleux", "génial", "parfait", "aime", "adore"],
        &["mauvais", "terrible", "horrible", "déteste", "problème", "erreur", "épouvantable", "déçu"],
    ),
    (
        Language::De,
        &["gut", "ausgezeichnet", "fantastisch", "wunderbar", "großartig", "perfekt", "liebe", "begeistert"],
        &["schlecht", "schrecklich", "furchtbar", "hasse", "problem", "fehler", "entsetzlich", "enttäuscht"],
    ),
    (
        Language::It,
        &["buono", "eccellente", "fantastico", "meraviglioso", "ottimo", "perfetto", "amo", "adoro"],
        &["cattivo", "terribile", "orribile", "odio", "problema", "errore", "pessimo", "deluso"],
    ),
    (
        Language::Pt,
        &["bom", "excelente", "fantástico", "maravilhoso", "ótimo", "perfeito", "amo", "adoro"],
        &["mau", "terrível", "horrível", "odeio", "problema", "erro", "péssimo", "decepcionado"],
    ),
    (
        Language::Nl,
        &["goed", "uitstekend", "fantastisch", "prachtig", "geweldig", "perfect", "hou", "enthousiast"],
        &["slecht", "verschrikkelijk", "vreselijk", "haat", "probleem", "fout", "afschuwelijk", "teleurgesteld"],
    ),
    (
        Language::Ru,
        &["хорошо", "отлично", "фантастика", "замечательно", "великолепно", "идеально", "люблю", "восхищен"],
        &["плохо", "ужасно", "кошмар", "ненавижу", "проблема", "ошибка", "отвратительно", "разочарован"],
    ),
    (
        Language::Zh,
        &["好", "优秀", "精彩", "美妙", "伟大", "完美", "爱", "喜欢"],
        &["坏", "糟糕", "可怕", "恨", "问题", "错误", "恶劣", "失望"],
    ),
    (
        Language::Ja,
        &["良い", "優秀", "素晴らしい", "見事", "偉大", "完璧", "愛", "好き"],
        &["悪い", "ひどい", "恐ろしい", "嫌い", "問題", "誤り", "最悪", "失望"],
    ),
    (
        Language::Ko,
        &["좋은", "훌륭한", "환상적인", "멋진", "대단한", "완벽한", "사랑", "좋아하는"],
        &["나쁜", "끔찍한", "무서운", "싫어", "문제", "오류", "최악", "실망"],
    ),
    (
        Language::Ar,
        &["جيد", "ممتاز", "رائع", "جميل", "عظيم", "مثالي", "أحب", "معجب"],
        &["سيء", "فظيع", "مرعب", "أكره", "مشكلة", "خطأ", "مروع", "خيبة أمل"],
    ),
];

/// Detect the language of a text within the fixed set.
///
/// Short texts skip detection entirely. The keyword heuristic wins only with
/// more than [`KEYWORD_HIT_FLOOR`] hits (ties go to the first-enumerated
/// language); otherwise the statistical detector decides, and any failure or
/// out-of-set verdict defaults to English.
pub fn detect_language(text: &str) -> Language {
    if text.trim().chars().count() < MIN_DETECTION_CHARS {
        return Language::En;
    }

    let lower = text.to_lowercase();
    let mut best = Language::En;
    let mut best_hits = 0usize;
    for &(lang, keywords) in DETECTION_KEYWORDS {
        let hits = keyword_hits(&lower, keywords);
        if hits > best_hits {
            best = lang;
            best_hits = hits;
        }
    }
    if best_hits > KEYWORD_HIT_FLOOR {
        return best;
    }

    statistical_fallback(text).unwrap_or(Language::En)
}

fn statistical_fallback(text: &str) -> Option<Language> {
    let info = whatlang::detect(text)?;
    let lang = match info.lang() {
        whatlang::Lang::Eng => Language::En,
        whatlang::Lang::Spa => Language::Es,
        whatlang::Lang::Fra => Language::Fr,
        whatlang::Lang::Deu => Language::De,
        whatlang::Lang::Ita => Language::It,
        whatlang::Lang::Por => Language::Pt,
        whatlang::Lang::Nld => Language::Nl,
        whatlang::Lang::Rus => Language::Ru,
        whatlang::Lang::Cmn => Language::Zh,
        whatlang::Lang::Jpn => Language::Ja,
        whatlang::Lang::Kor => Language::Ko,
        whatlang::Lang::Ara => Language::Ar,
        other => {
            debug!("statistical detector returned out-of-set language {other:?}");
            return None;
        }
    };
    Some(lang)
}

/// Score a text under its detected language.
///
/// English goes through the primary lexicon at single-model thresholds.
/// Every other language counts positive hits P against negative hits N:
/// P > N is positive with score `min(P/10, 1.0)`, N > P is negative with
/// score `-min(N/10, 1.0)`, a tie is neutral `0.0`.
pub fn score_for_language(
    language: Language,
    text: &str,
    scorer: &SentimentScorer,
) -> (Sentiment, f64) {
    let Some(&(_, positive, negative)) = SENTIMENT_WORDS
        .iter()
        .find(|(lang, _, _)| *lang == language)
    else {
        return scorer.score_single(text);
    };

    let lower = text.to_lowercase();
    let p = positive
        .iter()
        .filter(|w| contains_keyword(&lower, w))
        .count();
    let n = negative
        .iter()
        .filter(|w| contains_keyword(&lower, w))
        .count();

    if p > n {
        (Sentiment::Positive, (p as f64 / 10.0).min(1.0))
    } else if n > p {
        (Sentiment::Negative, -(n as f64 / 10.0).min(1.0))
    } else {
        (Sentiment::Neutral, 0.0)
    }
}

/// Per-language aggregate row.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageStats {
    pub name: &'static str,
    pub count: u64,
    pub counts: LabelCounts,
    pub percentages: LabelPercentages,
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageSummary {
    pub total_posts: usize,
    pub languages_detected: usize,
    pub breakdown: HashMap<Language, LanguageStats>,
}

/// One post with its detected language attached.
#[derive(Debug, Clone, Serialize)]
pub struct LanguageScoredPost {
    pub text: String,
    pub language: Language,
    pub language_name: &'static str,
    pub sentiment: Sentiment,
    pub score: f64,
}

/// Detect and score every post, then aggregate per language. Posts with
/// empty text are skipped, so the breakdown counts sum to the number of
/// posts with non-empty text.
pub fn breakdown_by_language(
    posts: &[Post],
    scorer: &SentimentScorer,
) -> (LanguageSummary, Vec<LanguageScoredPost>) {
    let mut breakdown: HashMap<Language, LanguageStats> = HashMap::new();
    let mut results = Vec::new();

    for post in posts {
        if post.text.trim().is_empty() {
            continue;
        }

        let language = detect_language(&post.text);
        let (sentiment, score) = score_for_language(language, &post.text, scorer);

        let stats = breakdown.entry(language).or_insert_with(|| LanguageStats {
            name: language.name(),
            count: 0,
            counts: LabelCounts::default(),
            percentages: LabelPercentages::default(),
        });
        stats.count += 1;
        stats.counts.increment(sentiment);

        results.push(LanguageScoredPost {
            text: post.text.clone(),
            language,
            language_name: language.name(),
            sentiment,
            score,
        });
    }

    for stats in breakdown.values_mut() {
        stats.percentages = stats.counts.percentages();
    }

    let summary = LanguageSummary {
        total_posts: results.len(),
        languages_detected: breakdown.len(),
        breakdown,
    };
    (summary, results)
}
