//! Recency classification for free-text "posted" strings.
//!
//! Listing services describe age loosely: "Posted Today", "Posted Yesterday",
//! "Posted 3 Days Ago", "Posted 30+ Days Ago". Only text that is confidently
//! inside the window passes; everything else degrades to "not recent".

use std::sync::OnceLock;

use regex::Regex;

fn day_count_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\b(\d+)\s*days?\b").ok())
        .as_ref()
}

/// "30+" style counts with no upper bound.
fn open_ended_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\s*\+").ok()).as_ref()
}

/// Returns true iff `text` says "today", "yesterday", or "N day(s)" with
/// `N <= max_age_days`. An open-ended count like "30+ Days Ago" is not
/// recent; a `+` anywhere else in the text is ignored.
pub fn is_recent(text: &str, max_age_days: u32) -> bool {
    let lowered = text.to_lowercase();

    if lowered.contains("today") || lowered.contains("yesterday") {
        return true;
    }
    if open_ended_pattern().is_none_or(|re| re.is_match(&lowered)) {
        return false;
    }

    day_count_pattern()
        .and_then(|re| re.captures(&lowered))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .is_some_and(|days| days <= max_age_days)
}
