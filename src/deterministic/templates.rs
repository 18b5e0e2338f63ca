//! Template tables for deterministic drafts
//!
//! `{topic}` is replaced with the condensed idea. Tables are indexed by
//! framework × language so a new locale only needs new rows here.

use crate::signals::Framework;
use crate::types::{Language, Objective, Platform};

/// Hook line templates
pub fn hook_templates(framework: Framework, language: Language) -> &'static [&'static str] {
    match (framework, language) {
        (Framework::Pas, Language::En) => &[
            "Still struggling with {topic}?",
            "The real problem with {topic} nobody talks about",
        ],
        (Framework::Pas, Language::Ro) => &[
            "Încă te lupți cu {topic}?",
            "Problema reală cu {topic} despre care nu vorbește nimeni",
        ],
        (Framework::Bab, Language::En) => &[
            "Before vs. after: {topic}",
            "Imagine {topic} actually working for you",
        ],
        (Framework::Bab, Language::Ro) => &[
            "Înainte și după: {topic}",
            "Imaginează-ți că {topic} chiar funcționează pentru tine",
        ],
        (Framework::Listicle, Language::En) => &[
            "3 things to know about {topic}",
            "Save these 3 tips on {topic}",
        ],
        (Framework::Listicle, Language::Ro) => &[
            "3 lucruri de știut despre {topic}",
            "3 sfaturi despre {topic} de păstrat",
        ],
        (Framework::Story, Language::En) => &[
            "Last year, {topic} changed how we work",
            "A short story about {topic}",
        ],
        (Framework::Story, Language::Ro) => &[
            "Anul trecut, {topic} ne-a schimbat modul de lucru",
            "O scurtă poveste despre {topic}",
        ],
        (Framework::Aida, Language::En) => &[
            "Stop scrolling: {topic}",
            "Discover what {topic} can do for you",
        ],
        (Framework::Aida, Language::Ro) => &[
            "Stop! {topic}",
            "Descoperă ce poate face {topic} pentru tine",
        ],
        (Framework::Generic, Language::En) => &["{topic}", "Here is the thing about {topic}"],
        (Framework::Generic, Language::Ro) => &["{topic}", "Iată ce contează despre {topic}"],
    }
}

/// Section labels a framework body is built from
pub fn body_labels(framework: Framework, language: Language) -> &'static [&'static str] {
    match (framework, language) {
        (Framework::Pas, Language::En) => &["The problem:", "Why it hurts:", "The fix:"],
        (Framework::Pas, Language::Ro) => &["Problema:", "De ce doare:", "Soluția:"],
        (Framework::Bab, Language::En) => &["Before:", "After:", "How to get there:"],
        (Framework::Bab, Language::Ro) => &["Înainte:", "După:", "Cum ajungi acolo:"],
        (Framework::Aida, Language::En) => &["", "Why it matters:", "What you get:"],
        (Framework::Aida, Language::Ro) => &["", "De ce contează:", "Ce câștigi:"],
        (Framework::Listicle, _) | (Framework::Story, _) | (Framework::Generic, _) => &[],
    }
}

/// Generic filler points when the idea is too short to fill a body
pub fn filler_points(language: Language) -> &'static [&'static str] {
    match language {
        Language::En => &[
            "Start small and measure what changes in the first week.",
            "Focus on the one step that removes the most friction.",
            "Repeat what works and drop what does not.",
        ],
        Language::Ro => &[
            "Începe cu pași mici și urmărește ce se schimbă în prima săptămână.",
            "Concentrează-te pe pasul care elimină cea mai mare fricțiune.",
            "Repetă ce funcționează și renunță la ce nu funcționează.",
        ],
    }
}

/// Closing CTA per objective
pub fn cta_line(objective: Objective, language: Language) -> &'static str {
    match (objective, language) {
        (Objective::Engagement, Language::En) => "What do you think? Tell me in the comments.",
        (Objective::Engagement, Language::Ro) => "Ce părere ai? Spune-mi în comentarii.",
        (Objective::Reach, Language::En) => "Share this with someone who needs it today.",
        (Objective::Reach, Language::Ro) => "Distribuie postarea cu cineva care are nevoie de ea azi.",
        (Objective::Leads, Language::En) => "Send us a message or click the link in bio to book a call.",
        (Objective::Leads, Language::Ro) => "Scrie-ne un mesaj sau accesează link in bio pentru o programare.",
        (Objective::Saves, Language::En) => "Save this post so you have it when you need it.",
        (Objective::Saves, Language::Ro) => "Salvează postarea ca s-o ai la îndemână.",
    }
}

/// Framework to fall back to when the idea itself shows none
pub fn objective_framework(objective: Objective) -> Framework {
    match objective {
        Objective::Engagement => Framework::Pas,
        Objective::Reach => Framework::Aida,
        Objective::Leads => Framework::Pas,
        Objective::Saves => Framework::Listicle,
    }
}

/// Platform tags used to top up hashtags when the idea yields too few
pub fn platform_hashtags(platform: Platform, language: Language) -> &'static [&'static str] {
    match (platform, language) {
        (Platform::Facebook, Language::En) => &["#community", "#smallbusiness"],
        (Platform::Facebook, Language::Ro) => &["#comunitate", "#afacerilocale"],
        (Platform::Instagram, Language::En) => &[
            "#instagood", "#tips", "#learnoninstagram", "#dailytips", "#inspiration",
        ],
        (Platform::Instagram, Language::Ro) => &[
            "#romania", "#sfaturi", "#inspiratie", "#zilnic", "#comunitate",
        ],
        (Platform::Tiktok, Language::En) => &["#fyp", "#learnontiktok", "#tips"],
        (Platform::Tiktok, Language::Ro) => &["#fyp", "#pentrutine", "#romania"],
        (Platform::Youtube, Language::En) => &["#shorts", "#howto"],
        (Platform::Youtube, Language::Ro) => &["#shorts", "#romania"],
    }
}

/// Words never turned into hashtags
pub const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "your", "you", "are", "from", "have", "what",
    "when", "about", "into", "more", "than", "they", "their", "will", "would", "there", "which",
    "pentru", "care", "este", "sunt", "despre", "acest", "aceasta", "cand", "unde", "mai",
    "din", "prin", "doar", "foarte", "fiecare", "toate", "intr", "dintre",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_framework_has_hooks_in_every_language() {
        for framework in Framework::named().iter().chain(std::iter::once(&Framework::Generic)) {
            for language in [Language::En, Language::Ro] {
                let hooks = hook_templates(*framework, language);
                assert!(!hooks.is_empty());
                assert!(hooks.iter().all(|h| h.contains("{topic}")));
            }
        }
    }
}
