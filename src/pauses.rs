//! Pause normalization for narration text.
//!
//! Inserts break markers the speech provider renders as silence. Applied once,
//! right before synthesis: the translation cache always holds plain text.

use regex::Regex;
use std::sync::LazyLock;

/// Pacing silences understood by the speech provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseMarker {
    /// Between sentences.
    Sentence,
    /// Where the author wrote an ellipsis.
    Short,
    /// Where the author wrote a long run of periods.
    Long,
}

impl PauseMarker {
    pub fn as_str(self) -> &'static str {
        match self {
            PauseMarker::Sentence => r#"<break time="0.5s" />"#,
            PauseMarker::Short => r#"<break time="1.0s" />"#,
            PauseMarker::Long => r#"<break time="2.0s" />"#,
        }
    }
}

// Order matters: long runs must be consumed before the ellipsis rule sees them.
static LONG_RUN: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*\.{6,}\s*"));
static ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| compile(r"\s*(?:\.{3,5}|…)\s*"));
static SENTENCE_END: LazyLock<Regex> = LazyLock::new(|| compile(r"\.\s+(\p{Lu})"));

#[allow(clippy::expect_used)]
fn compile(pattern: &str) -> Regex {
    // SAFETY: patterns are string literals in this module, covered by tests
    Regex::new(pattern).expect("static pause pattern")
}

/// Insert pause markers into `text`.
///
/// - six or more periods become a long pause
/// - an ellipsis (`...` or `…`) becomes a short pause
/// - a period followed by a capitalized word gains a sentence pause
///
/// Text without any of these patterns is returned unchanged.
pub fn normalize_pauses(text: &str) -> String {
    let long = format!(" {} ", PauseMarker::Long.as_str());
    let short = format!(" {} ", PauseMarker::Short.as_str());
    let sentence = format!(". {} ${{1}}", PauseMarker::Sentence.as_str());

    let text = LONG_RUN.replace_all(text, long.as_str());
    let text = ELLIPSIS.replace_all(&text, short.as_str());
    let text = SENTENCE_END.replace_all(&text, sentence.as_str());
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(normalize_pauses("just breathe"), "just breathe");
        assert_eq!(normalize_pauses(""), "");
    }

    #[test]
    fn ellipsis_becomes_short_pause() {
        assert_eq!(
            normalize_pauses("Breathe in... hold... breathe out."),
            r#"Breathe in <break time="1.0s" /> hold <break time="1.0s" /> breathe out."#
        );
    }

    #[test]
    fn unicode_ellipsis_becomes_short_pause() {
        assert_eq!(
            normalize_pauses("relax…now"),
            r#"relax <break time="1.0s" /> now"#
        );
    }

    #[test]
    fn long_run_becomes_long_pause() {
        assert_eq!(
            normalize_pauses("let go.......... and rest"),
            r#"let go <break time="2.0s" /> and rest"#
        );
    }

    #[test]
    fn six_periods_is_long_five_is_short() {
        assert!(normalize_pauses("a......b").contains(PauseMarker::Long.as_str()));
        assert!(normalize_pauses("a.....b").contains(PauseMarker::Short.as_str()));
        assert!(!normalize_pauses("a.....b").contains(PauseMarker::Long.as_str()));
    }

    #[test]
    fn sentence_end_before_capital_gains_pause() {
        assert_eq!(
            normalize_pauses("Close your eyes. Feel the ground."),
            r#"Close your eyes. <break time="0.5s" /> Feel the ground."#
        );
    }

    #[test]
    fn sentence_end_before_lowercase_is_untouched() {
        assert_eq!(normalize_pauses("e.g. this one"), "e.g. this one");
    }

    #[test]
    fn sentence_rule_handles_non_ascii_capitals() {
        let out = normalize_pauses("Adem in. Één moment.");
        assert!(out.contains(PauseMarker::Sentence.as_str()));
    }
}
