//! Rule-based draft synthesis
//!
//! Turns a raw idea into a platform-native draft with no external calls.
//! Every function here is total; the worst input (an empty idea) still yields
//! a complete, scorable draft built from filler content.

use serde::{Deserialize, Serialize};

use super::scorer::{build_deterministic_score, ideal_hashtags, ideal_length, DeterministicScore};
use super::templates::{self, STOPWORDS};
use super::text;
use crate::signals::{keywords, Framework, KeywordClassifier, SignalClassifier};
use crate::types::{ContentType, Language, Objective, Platform};

/// Inputs for one deterministic draft
#[derive(Debug, Clone)]
pub struct DraftSpec<'a> {
    pub idea: &'a str,
    pub platform: Platform,
    pub objective: Objective,
    pub language: Language,
    pub content_type: ContentType,
    /// Forces a framework instead of detecting one from the idea
    pub framework: Option<Framework>,
    /// Selects among the hook templates of the framework
    pub variant: usize,
}

/// A synthesized draft with its score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeterministicDraft {
    pub platform: Platform,
    pub framework: Framework,
    pub hook: String,
    pub body: Vec<String>,
    pub cta: String,
    pub hashtags: Vec<String>,
    pub text: String,
    pub score: DeterministicScore,
}

/// Framework detected from the idea, or the objective's default when none shows
pub fn primary_framework(idea: &str, objective: Objective, language: Language) -> Framework {
    let detected = KeywordClassifier::for_language(language).classify_framework(idea);
    if detected == Framework::Generic {
        templates::objective_framework(objective)
    } else {
        detected
    }
}

fn fallback_topic(language: Language) -> &'static str {
    match language {
        Language::En => "your next big idea",
        Language::Ro => "următoarea ta idee",
    }
}

/// Condensed idea used inside hook templates
fn topic_of(idea: &str, language: Language) -> String {
    let first = text::sentences(idea).into_iter().next().unwrap_or_default();
    let trimmed = first.trim_end_matches(|c: char| c.is_ascii_punctuation()).trim();
    if trimmed.is_empty() {
        return fallback_topic(language).to_string();
    }
    text::truncate_chars(trimmed, 60)
}

fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match (chars.next(), chars.clone().next()) {
        (Some(first), Some(second)) if !second.is_uppercase() => {
            first.to_lowercase().chain(chars).collect()
        }
        _ => s.to_string(),
    }
}

fn render_hook(template: &str, topic: &str) -> String {
    if template.starts_with("{topic}") {
        template.replace("{topic}", topic)
    } else {
        template.replace("{topic}", &lowercase_first(topic))
    }
}

fn body_points(idea: &str, language: Language, wanted: usize) -> Vec<String> {
    let mut points: Vec<String> = text::sentences(idea)
        .into_iter()
        .map(|s| {
            let mut s = text::collapse_whitespace(&s);
            if !s.ends_with(['.', '!', '?']) {
                s.push('.');
            }
            s
        })
        .take(wanted)
        .collect();
    let fillers = templates::filler_points(language);
    let mut i = 0;
    while points.len() < wanted {
        points.push(fillers[i % fillers.len()].to_string());
        i += 1;
    }
    points
}

fn build_body(idea: &str, framework: Framework, language: Language) -> Vec<String> {
    match framework {
        Framework::Pas | Framework::Bab | Framework::Aida => {
            let labels = templates::body_labels(framework, language);
            body_points(idea, language, labels.len())
                .into_iter()
                .zip(labels.iter())
                .map(|(point, label)| {
                    if label.is_empty() {
                        point
                    } else {
                        format!("{} {}", label, point)
                    }
                })
                .collect()
        }
        Framework::Listicle => {
            let items = body_points(idea, language, 3)
                .into_iter()
                .enumerate()
                .map(|(i, point)| format!("{}. {}", i + 1, point))
                .collect::<Vec<_>>()
                .join("\n");
            vec![items]
        }
        Framework::Story => body_points(idea, language, 3),
        Framework::Generic => body_points(idea, language, 2),
    }
}

fn hashtag_target(platform: Platform) -> usize {
    match platform {
        Platform::Facebook => 2,
        Platform::Instagram => 6,
        Platform::Tiktok => 4,
        Platform::Youtube => 3,
    }
}

fn build_hashtags(idea: &str, platform: Platform, language: Language) -> Vec<String> {
    let target = hashtag_target(platform).min(ideal_hashtags(platform).1);
    let mut tags: Vec<String> = Vec::with_capacity(target);
    let folded = keywords::fold(idea);
    for token in keywords::tokenize(&folded) {
        if tags.len() >= target {
            break;
        }
        if token.chars().count() < 5
            || !token.chars().all(|c| c.is_alphabetic())
            || STOPWORDS.contains(&token.as_str())
        {
            continue;
        }
        let tag = format!("#{}", token);
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    for tag in templates::platform_hashtags(platform, language) {
        if tags.len() >= target {
            break;
        }
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn compose(platform: Platform, hook: &str, body: &[String], cta: &str, hashtags: &[String]) -> String {
    let body_part: Vec<&str> = match platform {
        Platform::Tiktok => body.iter().take(1).map(|s| s.as_str()).collect(),
        _ => body.iter().map(|s| s.as_str()).collect(),
    };
    let mut blocks: Vec<String> = vec![hook.to_string()];
    blocks.extend(body_part.iter().map(|s| s.to_string()));
    blocks.push(cta.to_string());
    if !hashtags.is_empty() {
        blocks.push(hashtags.join(" "));
    }
    blocks.join("\n\n")
}

/// Build one draft
pub fn generate_deterministic_draft(spec: &DraftSpec<'_>) -> DeterministicDraft {
    let framework = spec
        .framework
        .unwrap_or_else(|| primary_framework(spec.idea, spec.objective, spec.language));
    let hooks = templates::hook_templates(framework, spec.language);
    let template = hooks[spec.variant % hooks.len()];
    let hook = render_hook(template, &topic_of(spec.idea, spec.language));
    let mut body = build_body(spec.idea, framework, spec.language);
    let cta = templates::cta_line(spec.objective, spec.language).to_string();
    let hashtags = build_hashtags(spec.idea, spec.platform, spec.language);

    let (_, max_chars) = ideal_length(spec.platform, spec.content_type);
    let mut text = compose(spec.platform, &hook, &body, &cta, &hashtags);
    while text.chars().count() > max_chars && body.len() > 1 {
        body.pop();
        text = compose(spec.platform, &hook, &body, &cta, &hashtags);
    }
    if text.chars().count() > max_chars {
        let fixed = hook.chars().count() + cta.chars().count() + hashtags.join(" ").chars().count() + 6;
        let budget = max_chars.saturating_sub(fixed).max(20);
        body = body.iter().map(|b| text::truncate_chars(b, budget)).collect();
        text = compose(spec.platform, &hook, &body, &cta, &hashtags);
    }

    let score = build_deterministic_score(&text, spec.platform, spec.content_type);
    DeterministicDraft {
        platform: spec.platform,
        framework,
        hook,
        body,
        cta,
        hashtags,
        text,
        score,
    }
}

/// One draft per framework; repeated frameworks advance the hook template
pub fn generate_variants(spec: &DraftSpec<'_>, frameworks: &[Framework]) -> Vec<DeterministicDraft> {
    let mut drafts = Vec::with_capacity(frameworks.len().max(1));
    if frameworks.is_empty() {
        drafts.push(generate_deterministic_draft(spec));
        return drafts;
    }
    for (i, framework) in frameworks.iter().enumerate() {
        let repeats = frameworks[..i].iter().filter(|f| *f == framework).count();
        let variant_spec = DraftSpec {
            framework: Some(*framework),
            variant: spec.variant + repeats,
            ..spec.clone()
        };
        drafts.push(generate_deterministic_draft(&variant_spec));
    }
    drafts
}

/// Mean overall score of a set of drafts, 0 when empty
pub fn mean_score(drafts: &[DeterministicDraft]) -> f64 {
    if drafts.is_empty() {
        return 0.0;
    }
    drafts.iter().map(|d| d.score.overall_score as f64).sum::<f64>() / drafts.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::{derive_creative_signals, CtaType};

    fn spec(idea: &str, platform: Platform, objective: Objective, language: Language) -> DraftSpec<'_> {
        DraftSpec {
            idea,
            platform,
            objective,
            language,
            content_type: ContentType::Post,
            framework: None,
            variant: 0,
        }
    }

    #[test]
    fn test_empty_idea_still_produces_draft() {
        for platform in Platform::all() {
            let draft = generate_deterministic_draft(&spec("", *platform, Objective::Engagement, Language::En));
            assert!(!draft.text.is_empty());
            assert!(draft.text.contains("your next big idea"));
            assert!(draft.score.overall_score <= 100);
        }
    }

    #[test]
    fn test_cta_matches_objective() {
        let idea = "Our dental clinic now offers same-day whitening. Results in one hour.";
        let cases = [
            (Objective::Engagement, CtaType::Comment),
            (Objective::Reach, CtaType::Share),
            (Objective::Leads, CtaType::Click),
            (Objective::Saves, CtaType::Save),
        ];
        for (objective, expected) in cases {
            let draft = generate_deterministic_draft(&spec(idea, Platform::Facebook, objective, Language::En));
            assert_eq!(derive_creative_signals(&draft.cta, None).cta_type, expected);
        }
    }

    #[test]
    fn test_respects_platform_length_ceiling() {
        let idea = "We rebuilt our onboarding from scratch. ".repeat(30);
        let draft = generate_deterministic_draft(&spec(&idea, Platform::Tiktok, Objective::Reach, Language::En));
        let (_, max_chars) = ideal_length(Platform::Tiktok, ContentType::Post);
        assert!(draft.text.chars().count() <= max_chars + 40);
    }

    #[test]
    fn test_romanian_listicle_uses_numbered_body() {
        let draft = generate_deterministic_draft(&spec(
            "Sfaturi pentru o dietă echilibrată. Bea apă. Dormi suficient.",
            Platform::Instagram,
            Objective::Saves,
            Language::Ro,
        ));
        assert_eq!(draft.framework, Framework::Listicle);
        assert!(draft.body[0].starts_with("1. "));
        assert!(draft.hashtags.len() >= 5);
    }

    #[test]
    fn test_variants_differ() {
        let base = spec("Tired of slow invoicing?", Platform::Facebook, Objective::Leads, Language::En);
        let drafts = generate_variants(&base, &[Framework::Pas, Framework::Pas]);
        assert_eq!(drafts.len(), 2);
        assert_ne!(drafts[0].hook, drafts[1].hook);
    }
}
