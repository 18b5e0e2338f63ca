//! Plain-text measurements shared by the scorer and the generator

use once_cell::sync::Lazy;
use regex::Regex;

static HASHTAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"#[\p{L}\p{N}_]+").expect("valid hashtag regex"));
static NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:[.,]\d+)?%?").expect("valid number regex"));
static SENTENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?…]+(?:\s+|$)|\n+").expect("valid sentence regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Collapse runs of whitespace and trim
pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RE.replace_all(text.trim(), " ").into_owned()
}

/// Hashtags in order of appearance, including the leading `#`
pub fn hashtags(text: &str) -> Vec<String> {
    HASHTAG_RE.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Text with hashtags removed
pub fn strip_hashtags(text: &str) -> String {
    HASHTAG_RE.replace_all(text, "").into_owned()
}

pub fn number_count(text: &str) -> usize {
    NUMBER_RE.find_iter(text).count()
}

/// Sentences, split on terminal punctuation and line breaks
pub fn sentences(text: &str) -> Vec<String> {
    SENTENCE_END_RE
        .split(text)
        .map(|s| s.trim())
        .filter(|s| s.chars().any(|c| c.is_alphanumeric()))
        .map(|s| s.to_string())
        .collect()
}

pub fn words(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .filter(|w| w.chars().any(|c| c.is_alphanumeric()))
        .collect()
}

pub fn word_count(text: &str) -> usize {
    words(text).len()
}

/// Non-empty paragraphs (blocks separated by blank lines)
pub fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.trim().is_empty() {
                out.push(current.trim().to_string());
            }
            current.clear();
        } else {
            if !current.is_empty() {
                current.push('\n');
            }
            current.push_str(line);
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// First non-empty line
pub fn first_line(text: &str) -> &str {
    text.lines().map(|l| l.trim()).find(|l| !l.is_empty()).unwrap_or("")
}

/// Lines that look like list items (`1.`, `2)`, `-`, `•`, `✅`)
pub fn list_line_count(text: &str) -> usize {
    text.lines()
        .map(|l| l.trim_start())
        .filter(|l| {
            let digits = l.chars().take_while(|c| c.is_ascii_digit()).count();
            (digits > 0 && matches!(l[digits..].chars().next(), Some('.') | Some(')')))
                || l.starts_with("- ")
                || l.starts_with('•')
                || l.starts_with('✅')
                || l.starts_with('→')
        })
        .count()
}

/// Truncate on a char boundary, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    if let Some(idx) = out.rfind(' ') {
        if idx > max_chars / 2 {
            out.truncate(idx);
        }
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentences_split() {
        let s = sentences("One two. Three four! Five?\nSix");
        assert_eq!(s, vec!["One two", "Three four", "Five", "Six"]);
    }

    #[test]
    fn test_hashtags_unicode() {
        assert_eq!(hashtags("Hi #sănătate and #fit_life"), vec!["#sănătate", "#fit_life"]);
    }

    #[test]
    fn test_paragraphs_and_lists() {
        let text = "Hook\n\n1. a\n2. b\n\nCTA";
        assert_eq!(paragraphs(text).len(), 3);
        assert_eq!(list_line_count(text), 2);
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        let cut = truncate_chars("a long sentence that needs cutting", 12);
        assert!(cut.chars().count() <= 12);
        assert!(cut.ends_with('…'));
    }
}
