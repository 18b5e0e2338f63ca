//! Creative signal extraction
//!
//! Classifies a piece of copy into the hook / framework / CTA triple that the
//! learning engine uses as its join key (`memory_key`). Everything here is a
//! pure function of the input text; locale specifics live behind the
//! [`SignalClassifier`] trait so keyword tables can be swapped per language.

pub mod keywords;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::types::Language;
use keywords::{KeywordTables, NormalizedText, ENGLISH, ROMANIAN};

/// Opening device of a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookType {
    Question,
    Interrupt,
    List,
    Story,
    Educational,
    Statement,
    Unknown,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::Question => "question",
            HookType::Interrupt => "interrupt",
            HookType::List => "list",
            HookType::Story => "story",
            HookType::Educational => "educational",
            HookType::Statement => "statement",
            HookType::Unknown => "unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "question" => Some(HookType::Question),
            "interrupt" => Some(HookType::Interrupt),
            "list" => Some(HookType::List),
            "story" => Some(HookType::Story),
            "educational" => Some(HookType::Educational),
            "statement" => Some(HookType::Statement),
            "unknown" => Some(HookType::Unknown),
            _ => None,
        }
    }
}

/// Copywriting structure of the body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    Pas,
    Bab,
    Listicle,
    Story,
    Aida,
    Generic,
}

impl Framework {
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Pas => "pas",
            Framework::Bab => "bab",
            Framework::Listicle => "listicle",
            Framework::Story => "story",
            Framework::Aida => "aida",
            Framework::Generic => "generic",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pas" => Some(Framework::Pas),
            "bab" => Some(Framework::Bab),
            "listicle" => Some(Framework::Listicle),
            "story" => Some(Framework::Story),
            "aida" => Some(Framework::Aida),
            "generic" => Some(Framework::Generic),
            _ => None,
        }
    }

    /// Named frameworks, excluding the generic fallback
    pub fn named() -> &'static [Framework] {
        &[Framework::Pas, Framework::Bab, Framework::Listicle, Framework::Story, Framework::Aida]
    }
}

/// Closing instruction to the reader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CtaType {
    Comment,
    Save,
    Share,
    Follow,
    Click,
    None,
}

impl CtaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CtaType::Comment => "comment",
            CtaType::Save => "save",
            CtaType::Share => "share",
            CtaType::Follow => "follow",
            CtaType::Click => "click",
            CtaType::None => "none",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "comment" => Some(CtaType::Comment),
            "save" => Some(CtaType::Save),
            "share" => Some(CtaType::Share),
            "follow" => Some(CtaType::Follow),
            "click" => Some(CtaType::Click),
            "none" => Some(CtaType::None),
            _ => None,
        }
    }
}

/// Derived signals for one text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreativeSignals {
    pub hook_type: HookType,
    pub framework: Framework,
    pub cta_type: CtaType,
    pub memory_key: String,
}

impl CreativeSignals {
    pub fn new(hook_type: HookType, framework: Framework, cta_type: CtaType) -> Self {
        Self {
            hook_type,
            framework,
            cta_type,
            memory_key: memory_key(hook_type, framework, cta_type),
        }
    }
}

/// `hook|framework|cta`
pub fn memory_key(hook: HookType, framework: Framework, cta: CtaType) -> String {
    format!("{}|{}|{}", hook.as_str(), framework.as_str(), cta.as_str())
}

/// Split a memory key back into its triple
pub fn parse_memory_key(key: &str) -> Option<(HookType, Framework, CtaType)> {
    let mut parts = key.split('|');
    let hook = HookType::parse(parts.next()?)?;
    let framework = Framework::parse(parts.next()?)?;
    let cta = CtaType::parse(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }
    Some((hook, framework, cta))
}

/// Locale-specific classification seam
pub trait SignalClassifier: Send + Sync {
    fn classify_hook(&self, text: &str) -> HookType;
    fn classify_framework(&self, text: &str) -> Framework;
    fn classify_cta(&self, text: &str) -> CtaType;
}

/// Keyword-table classifier over one or more languages
pub struct KeywordClassifier {
    tables: Vec<&'static KeywordTables>,
}

impl KeywordClassifier {
    pub fn for_language(language: Language) -> Self {
        let tables = match language {
            Language::En => vec![&ENGLISH],
            Language::Ro => vec![&ROMANIAN],
        };
        Self { tables }
    }

    /// Consults every known table; used when the language is not known
    pub fn multilingual() -> Self {
        Self { tables: vec![&ENGLISH, &ROMANIAN] }
    }

    fn any(&self, text: &NormalizedText, pick: impl Fn(&KeywordTables) -> &'static [&'static str]) -> bool {
        self.tables.iter().any(|t| text.contains_any(pick(*t)))
    }

    pub fn count_emotion(&self, text: &str) -> usize {
        let normalized = NormalizedText::new(text);
        self.tables.iter().map(|t| normalized.count_matches(t.emotion)).sum()
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::multilingual()
    }
}

fn starts_with_number(text: &NormalizedText) -> bool {
    text.tokens()
        .first()
        .map(|t| t.chars().all(|c| c.is_ascii_digit()))
        .unwrap_or(false)
}

fn has_numbered_lines(text: &str) -> bool {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
            digits > 0 && matches!(trimmed[digits..].chars().next(), Some('.') | Some(')'))
        })
        .count()
        >= 2
}

impl SignalClassifier for KeywordClassifier {
    fn classify_hook(&self, text: &str) -> HookType {
        if text.trim().is_empty() {
            return HookType::Unknown;
        }
        if text.contains('?') {
            return HookType::Question;
        }
        let normalized = NormalizedText::new(text);
        if self.any(&normalized, |t| t.interrupt) {
            HookType::Interrupt
        } else if starts_with_number(&normalized) || self.any(&normalized, |t| t.list) {
            HookType::List
        } else if self.any(&normalized, |t| t.narrative) {
            HookType::Story
        } else if self.any(&normalized, |t| t.explanatory) {
            HookType::Educational
        } else {
            HookType::Statement
        }
    }

    fn classify_framework(&self, text: &str) -> Framework {
        let normalized = NormalizedText::new(text);
        if self.any(&normalized, |t| t.pain) {
            Framework::Pas
        } else if self.any(&normalized, |t| t.transformation) {
            Framework::Bab
        } else if has_numbered_lines(text) || self.any(&normalized, |t| t.list) {
            Framework::Listicle
        } else if self.any(&normalized, |t| t.narrative) {
            Framework::Story
        } else if self.any(&normalized, |t| t.desire) {
            Framework::Aida
        } else {
            Framework::Generic
        }
    }

    fn classify_cta(&self, text: &str) -> CtaType {
        let normalized = NormalizedText::new(text);
        if self.any(&normalized, |t| t.cta_comment) {
            CtaType::Comment
        } else if self.any(&normalized, |t| t.cta_save) {
            CtaType::Save
        } else if self.any(&normalized, |t| t.cta_share) {
            CtaType::Share
        } else if self.any(&normalized, |t| t.cta_follow) {
            CtaType::Follow
        } else if self.any(&normalized, |t| t.cta_click) {
            CtaType::Click
        } else {
            CtaType::None
        }
    }
}

static DEFAULT_CLASSIFIER: Lazy<KeywordClassifier> = Lazy::new(KeywordClassifier::multilingual);

/// Shared multilingual classifier
pub fn default_classifier() -> &'static KeywordClassifier {
    &DEFAULT_CLASSIFIER
}

/// Derive the signal triple of `text`; `hook_override` wins over detection
pub fn derive_creative_signals_with(
    classifier: &dyn SignalClassifier,
    text: &str,
    hook_override: Option<HookType>,
) -> CreativeSignals {
    let hook = hook_override.unwrap_or_else(|| classifier.classify_hook(text));
    CreativeSignals::new(hook, classifier.classify_framework(text), classifier.classify_cta(text))
}

/// [`derive_creative_signals_with`] using the multilingual default tables
pub fn derive_creative_signals(text: &str, hook_override: Option<HookType>) -> CreativeSignals {
    derive_creative_signals_with(default_classifier(), text, hook_override)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_text_is_unknown() {
        let signals = derive_creative_signals("", None);
        assert_eq!(signals.memory_key, "unknown|generic|none");
    }

    #[test]
    fn test_question_hook_wins() {
        let signals = derive_creative_signals("De ce 90% din pacienti aleg gresit?", None);
        assert_eq!(signals.hook_type, HookType::Question);
        assert_eq!(signals.framework, Framework::Pas);
    }

    #[test]
    fn test_override_hook() {
        let signals = derive_creative_signals("Why does this work?", Some(HookType::Story));
        assert_eq!(signals.hook_type, HookType::Story);
    }

    #[test]
    fn test_hook_priority_order() {
        let c = KeywordClassifier::for_language(Language::En);
        assert_eq!(c.classify_hook("Stop scrolling. This changes everything"), HookType::Interrupt);
        assert_eq!(c.classify_hook("5 habits of calm founders"), HookType::List);
        assert_eq!(c.classify_hook("Last year I almost quit"), HookType::Story);
        assert_eq!(c.classify_hook("How to plan a content week"), HookType::Educational);
        assert_eq!(c.classify_hook("ok"), HookType::Statement);
    }

    #[test]
    fn test_framework_detection() {
        let c = KeywordClassifier::multilingual();
        assert_eq!(c.classify_framework("Tired of chasing clients?"), Framework::Pas);
        assert_eq!(c.classify_framework("Before: chaos. After: calm."), Framework::Bab);
        assert_eq!(c.classify_framework("1. Plan\n2. Write\n3. Ship"), Framework::Listicle);
        assert_eq!(c.classify_framework("My first client story"), Framework::Story);
        assert_eq!(c.classify_framework("Discover the offer"), Framework::Aida);
        assert_eq!(c.classify_framework("Hello there"), Framework::Generic);
    }

    #[test]
    fn test_cta_family_order() {
        let c = KeywordClassifier::multilingual();
        assert_eq!(c.classify_cta("Share your thoughts below"), CtaType::Comment);
        assert_eq!(c.classify_cta("Save this for later"), CtaType::Save);
        assert_eq!(c.classify_cta("Tag a friend who needs it"), CtaType::Share);
        assert_eq!(c.classify_cta("Follow for more"), CtaType::Follow);
        assert_eq!(c.classify_cta("Programează-te acum, link in bio"), CtaType::Click);
        assert_eq!(c.classify_cta("Nice day"), CtaType::None);
    }

    #[test]
    fn test_memory_key_round_trip() {
        let key = memory_key(HookType::List, Framework::Listicle, CtaType::Save);
        assert_eq!(parse_memory_key(&key), Some((HookType::List, Framework::Listicle, CtaType::Save)));
        assert_eq!(parse_memory_key("list|listicle"), None);
        assert_eq!(parse_memory_key("list|listicle|save|x"), None);
    }

    proptest! {
        #[test]
        fn prop_memory_key_shape(text in ".*") {
            let signals = derive_creative_signals(&text, None);
            let parts: Vec<&str> = signals.memory_key.split('|').collect();
            prop_assert_eq!(parts.len(), 3);
            for part in parts {
                prop_assert!(!part.is_empty());
                prop_assert!(part.chars().all(|c| c.is_ascii_lowercase()));
            }
        }
    }
}
