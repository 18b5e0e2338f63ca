//! Configuration management
//!
//! Engine economics (budget caps, ROI thresholds, bandit tuning), cache
//! lifetimes and model routing. Loaded once from `config.toml`, overlaid with
//! environment variables, then passed around immutably.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::types::Objective;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub budget: BudgetConfig,
    #[serde(default)]
    pub roi: RoiConfig,
    #[serde(default)]
    pub bandit: BanditConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub models: ModelsConfig,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    /// SQLite file; defaults to the platform data dir
    #[serde(default)]
    pub database_path: Option<PathBuf>,
}

/// Default spend caps, overridable per organization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetConfig {
    /// Daily spending limit in USD
    #[serde(default = "default_daily_usd")]
    pub daily_usd: f64,
    /// Monthly spending limit in USD
    #[serde(default = "default_monthly_usd")]
    pub monthly_usd: f64,
}

fn default_daily_usd() -> f64 {
    2.0
}

fn default_monthly_usd() -> f64 {
    45.0
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            daily_usd: default_daily_usd(),
            monthly_usd: default_monthly_usd(),
        }
    }
}

/// Premium escalation economics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoiConfig {
    /// Dollar value of one quality-score point before objective weighting
    #[serde(default = "default_value_per_point")]
    pub base_value_per_point_usd: f64,
    #[serde(default = "default_engagement_multiplier")]
    pub engagement_multiplier: f64,
    #[serde(default = "default_reach_multiplier")]
    pub reach_multiplier: f64,
    #[serde(default = "default_leads_multiplier")]
    pub leads_multiplier: f64,
    #[serde(default = "default_saves_multiplier")]
    pub saves_multiplier: f64,
    /// Minimum ROI multiple for every objective except leads
    #[serde(default = "default_min_roi_multiple")]
    pub min_roi_multiple: f64,
    #[serde(default = "default_leads_min_roi_multiple")]
    pub leads_min_roi_multiple: f64,
    /// Share of the deterministic score's headroom an economy model recovers
    #[serde(default = "default_economy_capture")]
    pub economy_capture: f64,
    /// Share of the headroom a premium model recovers
    #[serde(default = "default_premium_capture")]
    pub premium_capture: f64,
    #[serde(default = "default_lead_window_days")]
    pub lead_window_days: i64,
    #[serde(default = "default_lead_min_samples")]
    pub lead_min_samples: usize,
    /// Lead value at which learned economics equal the static defaults
    #[serde(default = "default_reference_lead_value")]
    pub reference_lead_value_usd: f64,
    /// Single reported lead values are clamped to this
    #[serde(default = "default_max_lead_value")]
    pub max_lead_value_usd: f64,
    #[serde(default = "default_lead_ratio_min")]
    pub lead_ratio_min: f64,
    #[serde(default = "default_lead_ratio_max")]
    pub lead_ratio_max: f64,
    #[serde(default = "default_leads_min_roi_floor")]
    pub leads_min_roi_floor: f64,
    #[serde(default = "default_leads_min_roi_ceiling")]
    pub leads_min_roi_ceiling: f64,
}

fn default_value_per_point() -> f64 {
    0.004
}

fn default_engagement_multiplier() -> f64 {
    1.0
}

fn default_reach_multiplier() -> f64 {
    0.9
}

fn default_leads_multiplier() -> f64 {
    3.2
}

fn default_saves_multiplier() -> f64 {
    1.3
}

fn default_min_roi_multiple() -> f64 {
    3.0
}

fn default_leads_min_roi_multiple() -> f64 {
    1.8
}

fn default_economy_capture() -> f64 {
    0.35
}

fn default_premium_capture() -> f64 {
    0.55
}

fn default_lead_window_days() -> i64 {
    180
}

fn default_lead_min_samples() -> usize {
    3
}

fn default_reference_lead_value() -> f64 {
    25.0
}

fn default_max_lead_value() -> f64 {
    5000.0
}

fn default_lead_ratio_min() -> f64 {
    0.25
}

fn default_lead_ratio_max() -> f64 {
    4.0
}

fn default_leads_min_roi_floor() -> f64 {
    1.2
}

fn default_leads_min_roi_ceiling() -> f64 {
    3.0
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            base_value_per_point_usd: default_value_per_point(),
            engagement_multiplier: default_engagement_multiplier(),
            reach_multiplier: default_reach_multiplier(),
            leads_multiplier: default_leads_multiplier(),
            saves_multiplier: default_saves_multiplier(),
            min_roi_multiple: default_min_roi_multiple(),
            leads_min_roi_multiple: default_leads_min_roi_multiple(),
            economy_capture: default_economy_capture(),
            premium_capture: default_premium_capture(),
            lead_window_days: default_lead_window_days(),
            lead_min_samples: default_lead_min_samples(),
            reference_lead_value_usd: default_reference_lead_value(),
            max_lead_value_usd: default_max_lead_value(),
            lead_ratio_min: default_lead_ratio_min(),
            lead_ratio_max: default_lead_ratio_max(),
            leads_min_roi_floor: default_leads_min_roi_floor(),
            leads_min_roi_ceiling: default_leads_min_roi_ceiling(),
        }
    }
}

impl RoiConfig {
    pub fn objective_multiplier(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Engagement => self.engagement_multiplier,
            Objective::Reach => self.reach_multiplier,
            Objective::Leads => self.leads_multiplier,
            Objective::Saves => self.saves_multiplier,
        }
    }

    pub fn default_min_roi(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Leads => self.leads_min_roi_multiple,
            _ => self.min_roi_multiple,
        }
    }
}

/// Variant selection tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BanditConfig {
    #[serde(default = "default_exploration_constant")]
    pub exploration_constant: f64,
    /// Engagement rate (percent) at or above which an outcome counts as a success
    #[serde(default = "default_success_engagement_rate")]
    pub success_engagement_rate: f64,
    /// Recent decisions consulted as session history
    #[serde(default = "default_session_history_limit")]
    pub session_history_limit: usize,
}

fn default_exploration_constant() -> f64 {
    0.45
}

fn default_success_engagement_rate() -> f64 {
    2.0
}

fn default_session_history_limit() -> usize {
    50
}

impl Default for BanditConfig {
    fn default() -> Self {
        Self {
            exploration_constant: default_exploration_constant(),
            success_engagement_rate: default_success_engagement_rate(),
            session_history_limit: default_session_history_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: i64,
    /// Lifetime of fallback entries written after a budget denial
    #[serde(default = "default_budget_exceeded_ttl")]
    pub budget_exceeded_ttl_secs: i64,
    /// Bump to invalidate every cached response
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
}

fn default_cache_ttl() -> i64 {
    7 * 24 * 3600
}

fn default_budget_exceeded_ttl() -> i64 {
    600
}

fn default_schema_version() -> String {
    "drafts-v1".to_string()
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
            budget_exceeded_ttl_secs: default_budget_exceeded_ttl(),
            schema_version: default_schema_version(),
        }
    }
}

/// Model per tier, with pricing per million tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(default = "default_economy_model")]
    pub economy: String,
    #[serde(default = "default_premium_model")]
    pub premium: String,
    #[serde(default = "default_economy_input_price")]
    pub economy_input_per_mtok: f64,
    #[serde(default = "default_economy_output_price")]
    pub economy_output_per_mtok: f64,
    #[serde(default = "default_premium_input_price")]
    pub premium_input_per_mtok: f64,
    #[serde(default = "default_premium_output_price")]
    pub premium_output_per_mtok: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_variants_per_platform")]
    pub variants_per_platform: usize,
}

fn default_economy_model() -> String {
    "openai/gpt-4o-mini".to_string()
}

fn default_premium_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_economy_input_price() -> f64 {
    0.15
}

fn default_economy_output_price() -> f64 {
    0.60
}

fn default_premium_input_price() -> f64 {
    3.0
}

fn default_premium_output_price() -> f64 {
    15.0
}

fn default_max_tokens() -> u32 {
    1200
}

fn default_variants_per_platform() -> usize {
    2
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            economy: default_economy_model(),
            premium: default_premium_model(),
            economy_input_per_mtok: default_economy_input_price(),
            economy_output_per_mtok: default_economy_output_price(),
            premium_input_per_mtok: default_premium_input_price(),
            premium_output_per_mtok: default_premium_output_price(),
            max_tokens: default_max_tokens(),
            variants_per_platform: default_variants_per_platform(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Read from `OPENROUTER_API_KEY`, never written to disk
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    crate::llm::openrouter::OPENROUTER_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            budget: BudgetConfig::default(),
            roi: RoiConfig::default(),
            bandit: BanditConfig::default(),
            cache: CacheConfig::default(),
            models: ModelsConfig::default(),
            openrouter: OpenRouterConfig::default(),
            database_path: None,
        }
    }
}

impl Config {
    /// Load from the default location, falling back to defaults, then apply env overrides
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Config::default()
        };
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from an explicit file, then apply env overrides
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let parent = path.parent().context("Config path has no parent")?;
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents).context("Failed to write config file")?;
        Ok(())
    }

    /// Overlay environment values; `lookup` is injected so tests need not touch the process env
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let number = |key: &str| -> Option<f64> {
            let raw = lookup(key)?;
            match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
                _ => {
                    warn!("Ignoring invalid value for {}: {:?}", key, raw);
                    None
                }
            }
        };

        if let Some(v) = number("DRAFTWISE_DAILY_BUDGET_USD") {
            self.budget.daily_usd = v;
        }
        if let Some(v) = number("DRAFTWISE_MONTHLY_BUDGET_USD") {
            self.budget.monthly_usd = v;
        }
        if let Some(v) = number("DRAFTWISE_EXPLORATION_CONSTANT") {
            self.bandit.exploration_constant = v;
        }
        if let Some(v) = number("DRAFTWISE_SUCCESS_ENGAGEMENT_RATE") {
            self.bandit.success_engagement_rate = v;
        }
        if let Some(v) = number("DRAFTWISE_MIN_ROI_MULTIPLE") {
            self.roi.min_roi_multiple = v;
        }
        if let Some(v) = number("DRAFTWISE_LEADS_MIN_ROI_MULTIPLE") {
            self.roi.leads_min_roi_multiple = v;
        }
        if let Some(v) = number("DRAFTWISE_VALUE_PER_POINT_USD") {
            self.roi.base_value_per_point_usd = v;
        }
        if let Some(path) = lookup("DRAFTWISE_DATABASE_PATH").filter(|p| !p.trim().is_empty()) {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(key) = lookup("OPENROUTER_API_KEY").filter(|k| !k.trim().is_empty()) {
            self.openrouter.api_key = Some(key.trim().to_string());
        }
    }

    /// Database file, defaulting to the platform data dir
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(data_dir()?.join("draftwise.db")),
        }
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "draftwise", "draftwise").context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}
