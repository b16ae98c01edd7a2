//! Text cleanup passes applied to raw record fields before escaping.
//!
//! Each pass is a function `&str -> String`. Titles run through
//! [`clean_title`]; conference lines use [`sentence`] and [`trim_location`].

use std::sync::LazyLock;

use regex::Regex;

/// Run the title cleanup pipeline.
pub fn clean_title(title: &str) -> String {
    let mut result = title.to_string();

    result = strip_inline_markup(&result);
    result = collapse_whitespace(&result);

    result
}

// ---------------------------------------------------------------------------
// Pass 1: Strip inline markup
// ---------------------------------------------------------------------------

/// Remove `<inf>`/`</inf>` subscript markers that bibliographic exports leave
/// in titles, keeping the enclosed text.
fn strip_inline_markup(text: &str) -> String {
    static INF_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"</?inf>").expect("valid regex"));

    INF_RE.replace_all(text, "").to_string()
}

// ---------------------------------------------------------------------------
// Pass 2: Collapse whitespace
// ---------------------------------------------------------------------------

/// Collapse runs of whitespace (including newlines) into a single space.
fn collapse_whitespace(text: &str) -> String {
    static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

    WS_RE.replace_all(text.trim(), " ").to_string()
}

// ---------------------------------------------------------------------------
// Sentence helpers
// ---------------------------------------------------------------------------

/// Drop trailing periods and spaces, then end with a period unless the text
/// is a question.
pub fn sentence(text: &str) -> String {
    let trimmed = text.trim_end_matches('.').trim_end_matches(' ');
    if trimmed.ends_with('?') {
        trimmed.to_string()
    } else {
        format!("{trimmed}.")
    }
}

/// Drop trailing periods, spaces and commas from a location.
pub fn trim_location(text: &str) -> String {
    text.trim_end_matches('.')
        .trim_end_matches(' ')
        .trim_end_matches(',')
        .to_string()
}
