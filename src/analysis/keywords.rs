//! Keyword matching shared by the language and geography lookups.

/// Whether a lowercased text contains a lowercase keyword.
///
/// Single ASCII words must appear as standalone tokens so that function
/// words like "o" or "us" do not fire inside unrelated English words.
/// Multi-word phrases ("united states") and non-Latin keywords (CJK and
/// Arabic have no token boundaries to split on) match by containment.
pub(crate) fn contains_keyword(lower: &str, keyword: &str) -> bool {
    if keyword.is_ascii() && !keyword.contains(' ') {
        lower
            .split(|c: char| !c.is_alphanumeric())
            .any(|w| w == keyword)
    } else {
        lower.contains(keyword)
    }
}

/// Count the keywords from `keywords` present in the lowercased text, each
/// counted at most once.
pub(crate) fn keyword_hits(lower: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| contains_keyword(lower, k)).count()
}
