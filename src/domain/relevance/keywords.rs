//! Keyword extraction and TF-IDF weights

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens shorter than this are never keywords
pub const MIN_KEYWORD_CHARS: usize = 3;

static PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\p{L}\p{N}\s]").expect("punctuation pattern is valid"));

/// Italian function words ignored when extracting keywords
static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "il", "lo", "la", "i", "gli", "le", "un", "uno", "una", "di", "a", "da", "in", "con",
        "su", "per", "tra", "fra", "e", "o", "ma", "che", "non", "del", "dello", "della", "dei",
        "degli", "delle", "al", "allo", "alla", "ai", "agli", "alle", "dal", "dallo", "dalla",
        "dai", "dagli", "dalle", "nel", "nello", "nella", "nei", "negli", "nelle", "sul",
        "sullo", "sulla", "sui", "sugli", "sulle", "col", "coi", "come", "anche", "più", "questo",
        "questa", "questi", "queste", "quello", "quella", "quelli", "quelle", "sono", "essere",
        "è", "ha", "hanno", "abbiamo", "siamo", "suo", "sua", "suoi", "sue", "loro", "nostro",
        "nostra", "vostro", "vostra", "mio", "mia", "tuo", "tua", "cui", "chi", "dove", "quando",
        "perché", "quale", "quali", "ogni", "tutto", "tutti", "tutte", "molto", "poi", "già",
        "solo", "ancora", "sempre", "dopo", "prima", "senza", "però", "così", "ed", "se",
        "si", "ci", "ne", "mi", "ti", "vi", "noi", "voi", "lui", "lei", "essi", "era", "erano",
        "sei", "fare", "fa", "può", "possono", "deve", "devono",
    ]
    .into_iter()
    .collect()
});

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// Extracts the keyword universe of a text: lower-cased, punctuation
/// removed, at least three characters, no stop words, first appearance kept
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let cleaned = PUNCTUATION.replace_all(&lowered, " ");

    let mut seen = HashSet::new();
    let mut keywords = Vec::new();

    for token in cleaned.split_whitespace() {
        if token.chars().count() < MIN_KEYWORD_CHARS || is_stop_word(token) {
            continue;
        }

        if seen.insert(token) {
            keywords.push(token.to_string());
        }
    }

    keywords
}

/// Share of whitespace tokens of `text` that contain `keyword`
///
/// `text` is expected to be lower-cased already.
pub fn term_frequency(keyword: &str, text: &str) -> f64 {
    let mut total = 0usize;
    let mut matching = 0usize;

    for token in text.split_whitespace() {
        total += 1;

        if token.contains(keyword) {
            matching += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }

    matching as f64 / total as f64
}

/// `ln(total / (containing + 1))` over lower-cased texts
///
/// The `+ 1` smoothing makes the value zero or negative for keywords found
/// in (nearly) every document.
pub fn inverse_document_frequency<S: AsRef<str>>(keyword: &str, corpus: &[S]) -> f64 {
    let containing = corpus
        .iter()
        .filter(|text| text.as_ref().contains(keyword))
        .count();

    (corpus.len() as f64 / (containing as f64 + 1.0)).ln()
}
