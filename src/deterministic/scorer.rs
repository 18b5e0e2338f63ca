//! Heuristic quality scorer
//!
//! Nine independent metrics, each 0-100 with a one-line explanation, folded
//! into a weighted overall score and a letter grade. The scorer is total: any
//! input string, including an empty one, produces a score.

use serde::{Deserialize, Serialize};

use super::text;
use crate::signals::{self, CreativeSignals, CtaType, Framework, HookType, SignalClassifier};
use crate::types::{ContentType, Platform};

/// A scored quality dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    HookStrength,
    Readability,
    Structure,
    CtaClarity,
    LengthFit,
    HashtagStrategy,
    EmotionalPull,
    Specificity,
    FrameworkQuality,
}

impl Metric {
    pub fn all() -> &'static [Metric] {
        &[
            Metric::HookStrength,
            Metric::Readability,
            Metric::Structure,
            Metric::CtaClarity,
            Metric::LengthFit,
            Metric::HashtagStrategy,
            Metric::EmotionalPull,
            Metric::Specificity,
            Metric::FrameworkQuality,
        ]
    }

    /// Weights sum to 1.0
    pub fn weight(&self) -> f64 {
        match self {
            Metric::HookStrength => 0.16,
            Metric::Readability => 0.10,
            Metric::Structure => 0.10,
            Metric::CtaClarity => 0.12,
            Metric::LengthFit => 0.12,
            Metric::HashtagStrategy => 0.08,
            Metric::EmotionalPull => 0.10,
            Metric::Specificity => 0.10,
            Metric::FrameworkQuality => 0.12,
        }
    }

    fn suggestion(&self, platform: Platform, content_type: ContentType) -> String {
        match self {
            Metric::HookStrength => {
                "Open with a question, a number or a pattern interrupt in the first 12 words.".to_string()
            }
            Metric::Readability => {
                "Shorten sentences to around 16 words or fewer.".to_string()
            }
            Metric::Structure => {
                "Break the text into 3+ short paragraphs or a list so it scans on mobile.".to_string()
            }
            Metric::CtaClarity => {
                "End with one explicit call to action (comment, save, share or click).".to_string()
            }
            Metric::LengthFit => {
                let (lo, hi) = ideal_length(platform, content_type);
                format!("Aim for {}-{} characters on {}.", lo, hi, platform)
            }
            Metric::HashtagStrategy => {
                let (lo, hi) = ideal_hashtags(platform);
                format!("Use {}-{} relevant, non-duplicated hashtags on {}.", lo, hi, platform)
            }
            Metric::EmotionalPull => {
                "Name a feeling or a stake the reader cares about.".to_string()
            }
            Metric::Specificity => {
                "Add a concrete number, result or example.".to_string()
            }
            Metric::FrameworkQuality => {
                "Follow a clear structure such as problem-agitate-solve or a numbered list.".to_string()
            }
        }
    }
}

/// Letter grade of an overall score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    S,
    A,
    B,
    C,
    D,
    F,
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Grade::S => "S",
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        };
        write!(f, "{}", s)
    }
}

pub fn grade_for(score: u32) -> Grade {
    match score {
        95.. => Grade::S,
        80..=94 => Grade::A,
        65..=79 => Grade::B,
        50..=64 => Grade::C,
        35..=49 => Grade::D,
        _ => Grade::F,
    }
}

/// One metric's result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub metric: Metric,
    pub score: u32,
    pub weight: f64,
    pub explanation: String,
}

/// Full scoring result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeterministicScore {
    pub overall_score: u32,
    pub grade: Grade,
    pub metrics: Vec<MetricScore>,
    pub improvements: Vec<String>,
    pub signals: CreativeSignals,
}

impl DeterministicScore {
    pub fn metric(&self, metric: Metric) -> Option<&MetricScore> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

/// Ideal caption length in characters
pub fn ideal_length(platform: Platform, content_type: ContentType) -> (usize, usize) {
    match (platform, content_type) {
        (Platform::Facebook, ContentType::Reel) => (50, 200),
        (Platform::Facebook, ContentType::Video) => (80, 300),
        (Platform::Facebook, _) => (100, 400),
        (Platform::Instagram, ContentType::Reel) => (80, 300),
        (Platform::Instagram, ContentType::Carousel) => (200, 800),
        (Platform::Instagram, ContentType::Video) => (100, 400),
        (Platform::Instagram, ContentType::Post) => (150, 600),
        (Platform::Tiktok, ContentType::Carousel) => (80, 300),
        (Platform::Tiktok, _) => (50, 200),
        (Platform::Youtube, ContentType::Reel) => (50, 200),
        (Platform::Youtube, ContentType::Video) => (200, 1000),
        (Platform::Youtube, _) => (100, 500),
    }
}

/// Ideal hashtag count
pub fn ideal_hashtags(platform: Platform) -> (usize, usize) {
    match platform {
        Platform::Facebook => (0, 3),
        Platform::Instagram => (5, 15),
        Platform::Tiktok => (3, 6),
        Platform::Youtube => (2, 5),
    }
}

/// 100 inside `[lo, hi]`, falling linearly to 0 over the given distances
pub fn triangular_score(value: f64, lo: f64, hi: f64, below_falloff: f64, above_falloff: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let score = if value < lo {
        100.0 * (1.0 - (lo - value) / below_falloff.max(1.0))
    } else if value > hi {
        100.0 * (1.0 - (value - hi) / above_falloff.max(1.0))
    } else {
        100.0
    };
    score.clamp(0.0, 100.0)
}

fn bounded(score: f64) -> u32 {
    if score.is_finite() {
        score.round().clamp(0.0, 100.0) as u32
    } else {
        0
    }
}

fn score_hook(first_line: &str, hook: HookType) -> (f64, String) {
    let base = match hook {
        HookType::Question => 82.0,
        HookType::Interrupt => 85.0,
        HookType::List => 80.0,
        HookType::Story => 78.0,
        HookType::Educational => 72.0,
        HookType::Statement => 55.0,
        HookType::Unknown => return (0.0, "No opening line".to_string()),
    };
    let words = text::word_count(first_line);
    let mut score = base;
    if words <= 12 {
        score += 10.0;
    } else if words > 25 {
        score -= 15.0;
    }
    if text::number_count(first_line) > 0 {
        score += 5.0;
    }
    (score, format!("{} hook, {} words in the opening line", hook.as_str(), words))
}

fn score_readability(body: &str) -> (f64, String) {
    let sentences = text::sentences(body);
    if sentences.is_empty() {
        return (0.0, "No readable sentences".to_string());
    }
    let words: Vec<&str> = sentences.iter().flat_map(|s| text::words(s)).collect();
    let avg = words.len() as f64 / sentences.len() as f64;
    let mut score = if avg <= 16.0 { 100.0 } else { 100.0 - (avg - 16.0) * 4.0 };
    let long_words = words.iter().filter(|w| w.chars().count() > 12).count();
    if !words.is_empty() && long_words as f64 / words.len() as f64 > 0.15 {
        score -= 10.0;
    }
    (score, format!("{:.1} words per sentence", avg))
}

fn score_structure(body: &str) -> (f64, String) {
    let paragraphs = text::paragraphs(body);
    let list_lines = text::list_line_count(body);
    let mut score: f64 = match paragraphs.len() {
        0 => 0.0,
        1 => 45.0,
        2 => 65.0,
        _ => 85.0,
    };
    if list_lines >= 2 {
        score += 10.0;
    }
    let longest = paragraphs.iter().map(|p| text::word_count(p)).max().unwrap_or(0);
    if longest > 60 {
        score -= 15.0;
    }
    (score, format!("{} paragraphs, {} list lines", paragraphs.len(), list_lines))
}

fn score_cta(body: &str, cta: CtaType) -> (f64, String) {
    if cta == CtaType::None {
        return (30.0, "No clear call to action".to_string());
    }
    let lines: Vec<&str> = body.lines().map(|l| l.trim()).filter(|l| !l.is_empty()).collect();
    let tail = lines[lines.len().saturating_sub(2)..].join(" ");
    let mut score = 75.0;
    if signals::default_classifier().classify_cta(&tail) != CtaType::None {
        score += 15.0;
    }
    if lines.last().map(|l| l.contains('?')).unwrap_or(false) {
        score += 10.0;
    }
    (score, format!("{} call to action", cta.as_str()))
}

fn score_length(content: &str, platform: Platform, content_type: ContentType) -> (f64, String) {
    let chars = content.trim().chars().count();
    let (lo, hi) = ideal_length(platform, content_type);
    let score = triangular_score(chars as f64, lo as f64, hi as f64, lo as f64, hi as f64);
    (score, format!("{} characters (ideal {}-{})", chars, lo, hi))
}

fn score_hashtags(content: &str, platform: Platform) -> (f64, String) {
    let tags = text::hashtags(content);
    let (lo, hi) = ideal_hashtags(platform);
    let mut score = triangular_score(
        tags.len() as f64,
        lo as f64,
        hi as f64,
        (lo + 3) as f64,
        (hi + 2).max(3) as f64,
    );
    let mut seen = std::collections::HashSet::new();
    let duplicates = tags.iter().filter(|t| !seen.insert(t.to_lowercase())).count();
    let overlong = tags.iter().filter(|t| t.chars().count() > 25).count();
    score -= duplicates as f64 * 10.0 + overlong as f64 * 5.0;
    (score, format!("{} hashtags (ideal {}-{})", tags.len(), lo, hi))
}

fn score_emotion(body: &str) -> (f64, String) {
    let hits = signals::default_classifier().count_emotion(body);
    let exclamations = body.matches('!').count();
    let mut score: f64 = match hits {
        0 => 40.0,
        1 => 60.0,
        2 => 75.0,
        _ => 88.0,
    };
    if exclamations > 3 {
        score -= 15.0;
    }
    let normalized = signals::keywords::NormalizedText::new(body);
    if normalized.contains_any(&["you", "your", "tu", "tine", "voi", "tau"]) {
        score += 7.0;
    }
    (score, format!("{} emotional cues", hits))
}

fn score_specificity(body: &str) -> (f64, String) {
    let numbers = text::number_count(body);
    let mut score: f64 = match numbers {
        0 => 45.0,
        1 => 70.0,
        _ => 85.0,
    };
    if body.contains('%') || body.contains('$') || body.contains('€') || body.to_lowercase().contains(" lei") {
        score += 5.0;
    }
    (score, format!("{} concrete numbers", numbers))
}

fn score_framework(body: &str, framework: Framework) -> (f64, String) {
    let paragraphs = text::paragraphs(body).len();
    let list_lines = text::list_line_count(body);
    let sentences = text::sentences(body).len();
    let mut score: f64 = if framework == Framework::Generic { 50.0 } else { 78.0 };
    match framework {
        Framework::Listicle if list_lines >= 3 => score += 12.0,
        Framework::Listicle if list_lines >= 2 => score += 6.0,
        Framework::Pas | Framework::Bab | Framework::Aida if paragraphs >= 3 => score += 12.0,
        Framework::Story if sentences >= 3 => score += 12.0,
        _ => {}
    }
    (score, format!("{} framework", framework.as_str()))
}

/// Score `content` for `platform`/`content_type`
pub fn build_deterministic_score(content: &str, platform: Platform, content_type: ContentType) -> DeterministicScore {
    let body = text::strip_hashtags(content);
    let signals = signals::derive_creative_signals(&body, None);

    let results = [
        (Metric::HookStrength, score_hook(text::first_line(&body), signals.hook_type)),
        (Metric::Readability, score_readability(&body)),
        (Metric::Structure, score_structure(&body)),
        (Metric::CtaClarity, score_cta(&body, signals.cta_type)),
        (Metric::LengthFit, score_length(content, platform, content_type)),
        (Metric::HashtagStrategy, score_hashtags(content, platform)),
        (Metric::EmotionalPull, score_emotion(&body)),
        (Metric::Specificity, score_specificity(&body)),
        (Metric::FrameworkQuality, score_framework(&body, signals.framework)),
    ];

    let metrics: Vec<MetricScore> = results
        .into_iter()
        .map(|(metric, (score, explanation))| MetricScore {
            metric,
            score: bounded(score),
            weight: metric.weight(),
            explanation,
        })
        .collect();

    let weighted: f64 = metrics.iter().map(|m| m.score as f64 * m.weight).sum();
    let total_weight: f64 = metrics.iter().map(|m| m.weight).sum();
    let overall_score = bounded(weighted / total_weight);

    let mut weak: Vec<&MetricScore> = metrics.iter().filter(|m| m.score < 70).collect();
    weak.sort_by_key(|m| m.score);
    let mut improvements: Vec<String> = weak
        .iter()
        .take(5)
        .map(|m| m.metric.suggestion(platform, content_type))
        .collect();
    if improvements.is_empty() {
        improvements.push("Strong draft: test an alternative hook to keep learning what resonates.".to_string());
    }

    DeterministicScore {
        overall_score,
        grade: grade_for(overall_score),
        metrics,
        improvements,
        signals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grade_thresholds_exact() {
        assert_eq!(grade_for(100), Grade::S);
        assert_eq!(grade_for(95), Grade::S);
        assert_eq!(grade_for(94), Grade::A);
        assert_eq!(grade_for(80), Grade::A);
        assert_eq!(grade_for(79), Grade::B);
        assert_eq!(grade_for(65), Grade::B);
        assert_eq!(grade_for(64), Grade::C);
        assert_eq!(grade_for(50), Grade::C);
        assert_eq!(grade_for(49), Grade::D);
        assert_eq!(grade_for(35), Grade::D);
        assert_eq!(grade_for(34), Grade::F);
        assert_eq!(grade_for(0), Grade::F);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = Metric::all().iter().map(|m| m.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_triangular_score() {
        assert_eq!(triangular_score(150.0, 100.0, 400.0, 100.0, 400.0), 100.0);
        assert_eq!(triangular_score(50.0, 100.0, 400.0, 100.0, 400.0), 50.0);
        assert_eq!(triangular_score(600.0, 100.0, 400.0, 100.0, 400.0), 50.0);
        assert_eq!(triangular_score(2000.0, 100.0, 400.0, 100.0, 400.0), 0.0);
    }

    #[test]
    fn test_empty_content_scores_low_with_suggestions() {
        let score = build_deterministic_score("", Platform::Facebook, ContentType::Post);
        assert!(score.overall_score < 35);
        assert_eq!(score.grade, Grade::F);
        assert!(!score.improvements.is_empty());
        assert!(score.improvements.len() <= 5);
        assert_eq!(score.metrics.len(), 9);
    }

    #[test]
    fn test_well_formed_post_beats_one_liner() {
        let good = "Still struggling to get 10 new clients a month?\n\n\
            The problem: most posts talk about you, not your customer.\n\n\
            The fix: share 1 real result per week and ask what they think.\n\n\
            What do you think? Tell me in the comments.\n\n#marketing #smallbusiness";
        let good_score = build_deterministic_score(good, Platform::Facebook, ContentType::Post);
        let weak_score = build_deterministic_score("ok", Platform::Facebook, ContentType::Post);
        assert!(good_score.overall_score > weak_score.overall_score);
        assert!(good_score.overall_score >= 65);
    }

    #[test]
    fn test_hashtag_metric_penalizes_excess_on_facebook() {
        let text = "Nice post about our bakery. #a #b #c #d #e #f #g #h #i";
        let score = build_deterministic_score(text, Platform::Facebook, ContentType::Post);
        let hashtags = score.metric(Metric::HashtagStrategy).unwrap();
        assert!(hashtags.score < 70);
    }

    proptest! {
        #[test]
        fn prop_overall_score_in_range(content in ".{0,400}") {
            for platform in Platform::all() {
                let score = build_deterministic_score(&content, *platform, ContentType::Post);
                prop_assert!(score.overall_score <= 100);
                prop_assert!(score.metrics.iter().all(|m| m.score <= 100));
                prop_assert!(!score.improvements.is_empty() && score.improvements.len() <= 5);
            }
        }
    }
}
