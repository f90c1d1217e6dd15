//! Pure text normalization and word-frequency analysis.
//!
//! These functions anchor the test suite: scraped and translated content is
//! nondeterministic, so everything downstream of it must be deterministic
//! and side-effect free. Identical input always yields identical output.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Words occurring strictly more than this many times count as repeated.
const REPEAT_THRESHOLD: usize = 2;

static NON_WORD: OnceLock<Regex> = OnceLock::new();

fn non_word() -> &'static Regex {
    // \w is Unicode-aware here, so accented letters survive the strip.
    NON_WORD.get_or_init(|| Regex::new(r"[^\w\s]").unwrap())
}

/// Lowercase, strip punctuation, and split into words.
///
/// Drops empty tokens; never produces punctuation or uppercase output.
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let stripped = non_word().replace_all(&lowered, "");
    stripped
        .split_whitespace()
        .map(|w| w.to_string())
        .collect()
}

/// Word-frequency report over a batch of translated headlines.
///
/// `repeated` is always the subset of `counts` with count > 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordReport {
    pub counts: HashMap<String, usize>,
    pub repeated: HashMap<String, usize>,
}

/// Count token occurrences across all non-empty headlines and report the
/// words repeated more than twice.
pub fn analyze(headlines: &[String]) -> WordReport {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for headline in headlines {
        if headline.is_empty() {
            continue;
        }
        for word in tokenize(headline) {
            *counts.entry(word).or_insert(0) += 1;
        }
    }

    let repeated = counts
        .iter()
        .filter(|(_, &c)| c > REPEAT_THRESHOLD)
        .map(|(w, &c)| (w.clone(), c))
        .collect();

    WordReport { counts, repeated }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_lowercases_and_strips_punctuation() {
        let tokens = tokenize("The Triumph, of Secularism!");
        assert_eq!(tokens, vec!["the", "triumph", "of", "secularism"]);
    }

    #[test]
    fn tokenize_keeps_unicode_word_characters() {
        let tokens = tokenize("¡La opinión de ayer!");
        assert_eq!(tokens, vec!["la", "opinión", "de", "ayer"]);
    }

    #[test]
    fn tokenize_never_emits_empty_tokens() {
        for input in ["", "   ", "...", "a  b", "—"] {
            assert!(tokenize(input).iter().all(|t| !t.is_empty()));
        }
    }

    #[test]
    fn analyze_empty_input_yields_empty_report() {
        let report = analyze(&[]);
        assert!(report.counts.is_empty());
        assert!(report.repeated.is_empty());
    }

    #[test]
    fn analyze_reports_words_repeated_more_than_twice() {
        let headlines = vec![
            "The triumph of secularism".to_string(),
            "The violence of crime".to_string(),
            "The nature of celebration".to_string(),
        ];
        let report = analyze(&headlines);
        assert_eq!(report.repeated.get("the"), Some(&3));
        assert_eq!(report.repeated.get("of"), Some(&3));
        assert!(!report.repeated.contains_key("triumph"));
        assert!(!report.repeated.contains_key("violence"));
    }

    #[test]
    fn analyze_without_repeats_yields_empty_repeated_map() {
        let headlines = vec![
            "One unique title".to_string(),
            "Another different header".to_string(),
        ];
        let report = analyze(&headlines);
        assert!(report.repeated.is_empty());
        assert_eq!(report.counts.get("unique"), Some(&1));
    }

    #[test]
    fn analyze_skips_empty_headlines() {
        let headlines = vec![String::new(), "solo header".to_string()];
        let report = analyze(&headlines);
        assert_eq!(report.counts.len(), 2);
    }

    #[test]
    fn analyze_is_idempotent() {
        let headlines = vec![
            "The triumph of secularism".to_string(),
            "The violence of crime".to_string(),
        ];
        assert_eq!(analyze(&headlines), analyze(&headlines));
    }
}
