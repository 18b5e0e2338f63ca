//! Shared types used across modules
//!
//! This module contains the domain enums that the generator, the learning
//! engine and the orchestrator all speak, so none of them has to depend on
//! another just to name a platform or an objective.

use serde::{Deserialize, Serialize};

/// Target social platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Facebook,
    Instagram,
    Tiktok,
    Youtube,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Tiktok => "tiktok",
            Platform::Youtube => "youtube",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "facebook" | "fb" => Some(Platform::Facebook),
            "instagram" | "ig" => Some(Platform::Instagram),
            "tiktok" => Some(Platform::Tiktok),
            "youtube" | "yt" => Some(Platform::Youtube),
            _ => None,
        }
    }

    pub fn all() -> &'static [Platform] {
        &[Platform::Facebook, Platform::Instagram, Platform::Tiktok, Platform::Youtube]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What the post is optimized for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Engagement,
    Reach,
    Leads,
    Saves,
}

impl Objective {
    pub fn as_str(&self) -> &'static str {
        match self {
            Objective::Engagement => "engagement",
            Objective::Reach => "reach",
            Objective::Leads => "leads",
            Objective::Saves => "saves",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "engagement" => Some(Objective::Engagement),
            "reach" | "awareness" => Some(Objective::Reach),
            "leads" | "lead" | "conversions" => Some(Objective::Leads),
            "saves" | "save" => Some(Objective::Saves),
            _ => None,
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Output language of generated drafts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ro,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ro => "ro",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Language::En),
            "ro" | "romanian" | "română" | "romana" => Some(Language::Ro),
            _ => None,
        }
    }
}

/// How much the caller is willing to spend on quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    /// Never call a model
    Deterministic,
    /// Economy tier only
    Economy,
    /// Let the ROI gate choose the tier
    #[default]
    Auto,
    /// Premium tier whenever the budget allows it
    Premium,
}

impl QualityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityMode::Deterministic => "deterministic",
            QualityMode::Economy => "economy",
            QualityMode::Auto => "auto",
            QualityMode::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deterministic" | "offline" => Some(QualityMode::Deterministic),
            "economy" | "cheap" => Some(QualityMode::Economy),
            "auto" | "balanced" => Some(QualityMode::Auto),
            "premium" => Some(QualityMode::Premium),
            _ => None,
        }
    }
}

/// Format of the post being drafted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    #[default]
    Post,
    Reel,
    Carousel,
    Video,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Post => "post",
            ContentType::Reel => "reel",
            ContentType::Carousel => "carousel",
            ContentType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "post" => Some(ContentType::Post),
            "reel" | "short" | "shorts" => Some(ContentType::Reel),
            "carousel" => Some(ContentType::Carousel),
            "video" => Some(ContentType::Video),
            _ => None,
        }
    }
}

/// Language model price/quality tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Economy,
    Premium,
}

impl ModelTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelTier::Economy => "economy",
            ModelTier::Premium => "premium",
        }
    }
}

/// Which path actually produced a response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Cache,
    Deterministic,
    Economy,
    Premium,
}

impl GenerationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::Cache => "cache",
            GenerationMode::Deterministic => "deterministic",
            GenerationMode::Economy => "economy",
            GenerationMode::Premium => "premium",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cache" => Some(GenerationMode::Cache),
            "deterministic" => Some(GenerationMode::Deterministic),
            "economy" => Some(GenerationMode::Economy),
            "premium" => Some(GenerationMode::Premium),
            _ => None,
        }
    }
}

impl From<ModelTier> for GenerationMode {
    fn from(tier: ModelTier) -> Self {
        match tier {
            ModelTier::Economy => GenerationMode::Economy,
            ModelTier::Premium => GenerationMode::Premium,
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Convert to OpenAI-style role string
    pub fn to_openai_string(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// A single chat message sent to a model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}
