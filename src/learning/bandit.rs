//! UCB variant selection
//!
//! Picks the best of several candidate texts for one (org, platform,
//! objective) from blended creative memory and recent session outcomes.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BanditConfig;
use crate::signals::{derive_creative_signals, CreativeSignals, CtaType, HookType};
use crate::store::EngineStore;
use crate::types::{Objective, Platform};

use super::outcomes::session_history;

pub const REASON_SINGLE_VARIANT: &str = "single_variant";

/// Observed performance for one memory key
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct VariantStats {
    pub sample_size: u32,
    pub success_count: u32,
    pub total_engagement: f64,
}

impl VariantStats {
    pub fn avg_engagement(&self) -> f64 {
        if self.sample_size == 0 {
            0.0
        } else {
            self.total_engagement / self.sample_size as f64
        }
    }

    fn absorb(&mut self, engagement: f64, success_threshold: f64) {
        self.sample_size += 1;
        if engagement >= success_threshold {
            self.success_count += 1;
        }
        self.total_engagement += engagement;
    }
}

/// Score breakdown for one candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedVariant {
    pub index: usize,
    pub signals: CreativeSignals,
    pub sample_size: u32,
    pub success_rate: f64,
    pub ucb: f64,
    pub normalized_engagement: f64,
    pub objective_bonus: f64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BanditSelection {
    pub selected_index: usize,
    pub reason: String,
    /// Best first; empty for the single-variant shortcut
    pub ranked: Vec<RankedVariant>,
}

impl BanditSelection {
    fn single() -> Self {
        Self {
            selected_index: 0,
            reason: REASON_SINGLE_VARIANT.to_string(),
            ranked: Vec::new(),
        }
    }
}

/// Bonus for signals that serve the objective
pub fn objective_bonus(objective: Objective, signals: &CreativeSignals) -> f64 {
    match objective {
        Objective::Leads if signals.cta_type == CtaType::Click => 0.08,
        Objective::Saves if signals.cta_type == CtaType::Save => 0.08,
        Objective::Reach if matches!(signals.hook_type, HookType::Interrupt | HookType::List) => 0.04,
        Objective::Engagement
            if signals.cta_type == CtaType::Comment || signals.hook_type == HookType::Question =>
        {
            0.05
        }
        _ => 0.0,
    }
}

fn distinct_non_empty(variants: &[String]) -> usize {
    let mut seen: Vec<&str> = Vec::new();
    for v in variants {
        let t = v.trim();
        if !t.is_empty() && !seen.contains(&t) {
            seen.push(t);
        }
    }
    seen.len()
}

/// Rank candidates against known stats; pure
pub fn rank_variants(
    variants: &[String],
    stats: &HashMap<String, VariantStats>,
    objective: Objective,
    exploration_constant: f64,
) -> BanditSelection {
    if distinct_non_empty(variants) <= 1 {
        return BanditSelection::single();
    }

    let signals: Vec<CreativeSignals> = variants.iter().map(|v| derive_creative_signals(v, None)).collect();
    let mut counted: Vec<&str> = Vec::new();
    let mut total_samples: u64 = 0;
    for s in &signals {
        if !counted.contains(&s.memory_key.as_str()) {
            counted.push(&s.memory_key);
            total_samples += stats.get(&s.memory_key).map(|st| st.sample_size as u64).unwrap_or(0);
        }
    }
    let log_term = ((total_samples as f64 + 2.0).max(2.0)).ln();

    let mut ranked: Vec<RankedVariant> = signals
        .into_iter()
        .enumerate()
        .map(|(index, signals)| {
            let st = stats.get(&signals.memory_key).copied().unwrap_or_default();
            let success_rate = (st.success_count.min(st.sample_size) as f64 + 1.0) / (st.sample_size as f64 + 2.0);
            let ucb = success_rate + exploration_constant * (log_term / (st.sample_size as f64 + 1.0)).sqrt();
            let normalized_engagement = (st.avg_engagement() / 10.0).clamp(0.0, 1.0);
            let bonus = objective_bonus(objective, &signals);
            RankedVariant {
                index,
                signals,
                sample_size: st.sample_size,
                success_rate,
                ucb,
                normalized_engagement,
                objective_bonus: bonus,
                score: ucb + 0.25 * normalized_engagement + bonus,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.sample_size.cmp(&b.sample_size))
            .then(a.index.cmp(&b.index))
    });

    BanditSelection {
        selected_index: ranked.first().map(|r| r.index).unwrap_or(0),
        reason: format!("bandit_ucb_objective_{}", objective.as_str()),
        ranked,
    }
}

/// Select the best variant using persisted memory plus session history.
///
/// Read failures degrade to zero samples.
pub async fn select_best_variant(
    store: &dyn EngineStore,
    config: &BanditConfig,
    org_id: &str,
    platform: Platform,
    objective: Objective,
    variants: &[String],
) -> BanditSelection {
    if distinct_non_empty(variants) <= 1 {
        return BanditSelection::single();
    }

    let mut stats: HashMap<String, VariantStats> = HashMap::new();
    match store.creative_insights(org_id, platform, objective).await {
        Ok(insights) => {
            for insight in insights {
                stats.insert(
                    insight.memory_key.clone(),
                    VariantStats {
                        sample_size: insight.sample_size,
                        success_count: insight.success_count,
                        total_engagement: insight.total_engagement,
                    },
                );
            }
        }
        Err(e) => warn!("Failed to read creative memory for {}: {}", org_id, e),
    }

    for (memory_key, engagement) in
        session_history(store, org_id, platform, objective, config.session_history_limit).await
    {
        stats
            .entry(memory_key)
            .or_default()
            .absorb(engagement, config.success_engagement_rate);
    }

    rank_variants(variants, &stats, objective, config.exploration_constant)
}
