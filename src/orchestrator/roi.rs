//! Premium escalation gate
//!
//! Converts projected quality uplift into dollars and compares it with the
//! extra cost of the premium tier. For the leads objective the dollar value
//! of a point is learned from reported lead values.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::RoiConfig;
use crate::store::EngineStore;
use crate::types::Objective;

pub const REASON_NO_UPLIFT: &str = "no_uplift_predicted";
pub const REASON_NOT_MORE_EXPENSIVE: &str = "premium_not_more_expensive";
pub const REASON_ABOVE_THRESHOLD: &str = "roi_above_threshold";
pub const REASON_BELOW_THRESHOLD: &str = "roi_below_threshold";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoiInput {
    pub baseline_score: f64,
    pub projected_premium_score: f64,
    pub economy_cost_usd: f64,
    pub premium_cost_usd: f64,
    pub objective: Objective,
    pub min_roi_multiple: Option<f64>,
    /// Unweighted value of a score point; the objective multiplier still applies
    pub value_per_score_point_usd: Option<f64>,
}

/// Escalation verdict with the numbers behind it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PremiumRoiDecision {
    pub should_escalate: bool,
    /// Infinite when premium costs no more than economy
    #[serde(with = "finite_or_null")]
    pub roi_multiple: f64,
    pub expected_uplift_points: f64,
    pub expected_incremental_value_usd: f64,
    pub incremental_cost_usd: f64,
    pub min_roi_multiple: f64,
    pub reason: String,
}

mod finite_or_null {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if value.is_finite() {
            serializer.serialize_some(value)
        } else {
            serializer.serialize_none()
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::INFINITY))
    }
}

fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 100.0)
    }
}

fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

pub fn evaluate_premium_roi_gate(input: &RoiInput, config: &RoiConfig) -> PremiumRoiDecision {
    let uplift = (clamp_score(input.projected_premium_score) - clamp_score(input.baseline_score)).max(0.0);
    let base_value = positive(input.value_per_score_point_usd)
        .or_else(|| positive(Some(config.base_value_per_point_usd)))
        .unwrap_or(0.0);
    let value_per_point = base_value * config.objective_multiplier(input.objective);
    let expected_value = uplift * value_per_point;
    let cost_diff = input.premium_cost_usd - input.economy_cost_usd;
    let incremental_cost = if cost_diff.is_finite() { cost_diff.max(0.0) } else { f64::INFINITY };
    let min_roi_multiple = positive(input.min_roi_multiple).unwrap_or_else(|| config.default_min_roi(input.objective));

    let decision = |should_escalate: bool, roi_multiple: f64, reason: &str| PremiumRoiDecision {
        should_escalate,
        roi_multiple,
        expected_uplift_points: uplift,
        expected_incremental_value_usd: expected_value,
        incremental_cost_usd: incremental_cost,
        min_roi_multiple,
        reason: reason.to_string(),
    };

    if uplift <= 0.0 {
        return decision(false, 0.0, REASON_NO_UPLIFT);
    }
    if incremental_cost <= 0.0 {
        return decision(true, f64::INFINITY, REASON_NOT_MORE_EXPENSIVE);
    }
    // unknown or unbounded premium cost never pays off
    if !incremental_cost.is_finite() {
        return decision(false, 0.0, REASON_BELOW_THRESHOLD);
    }
    let roi_multiple = expected_value / incremental_cost;
    if roi_multiple >= min_roi_multiple {
        decision(true, roi_multiple, REASON_ABOVE_THRESHOLD)
    } else {
        decision(false, roi_multiple, REASON_BELOW_THRESHOLD)
    }
}

/// Lead economics learned from reported lead values
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LeadEconomics {
    pub sample_count: usize,
    pub avg_lead_value_usd: f64,
    /// Average relative to the reference lead value, clamped
    pub value_ratio: f64,
    pub value_per_point_usd: f64,
    pub min_roi_multiple: f64,
}

fn lead_value(metadata: &serde_json::Value) -> Option<f64> {
    let raw = metadata.get("lead_value_usd").or_else(|| metadata.get("leadValueUsd"))?;
    let value = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

/// Learn lead economics; `None` until enough usable samples exist.
///
/// Each sample is clamped to `max_lead_value_usd` and the resulting ratio to
/// `[lead_ratio_min, lead_ratio_max]`.
pub fn learn_lead_economics(metadata: &[serde_json::Value], config: &RoiConfig) -> Option<LeadEconomics> {
    let samples: Vec<f64> = metadata
        .iter()
        .filter_map(lead_value)
        .map(|v| v.min(config.max_lead_value_usd))
        .collect();
    if samples.len() < config.lead_min_samples.max(1) || config.reference_lead_value_usd <= 0.0 {
        return None;
    }
    let avg = samples.iter().sum::<f64>() / samples.len() as f64;
    let ratio = (avg / config.reference_lead_value_usd).clamp(config.lead_ratio_min, config.lead_ratio_max);
    if ratio <= 0.0 {
        return None;
    }
    Some(LeadEconomics {
        sample_count: samples.len(),
        avg_lead_value_usd: avg,
        value_ratio: ratio,
        value_per_point_usd: config.base_value_per_point_usd * ratio,
        min_roi_multiple: (config.leads_min_roi_multiple / ratio)
            .clamp(config.leads_min_roi_floor, config.leads_min_roi_ceiling),
    })
}

/// Per-request gate overrides
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoiOverrides {
    pub min_roi_multiple: Option<f64>,
    pub value_per_score_point_usd: Option<f64>,
    pub learned_leads: Option<LeadEconomics>,
}

fn settings_number(settings: &serde_json::Value, keys: &[&str]) -> Option<f64> {
    let section = settings.get("roi")?;
    let value = keys.iter().find_map(|key| match section.get(*key)? {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    });
    positive(value)
}

/// Resolve overrides: explicit org settings, then learned lead economics, then config
pub async fn resolve_roi_overrides(
    store: &dyn EngineStore,
    org_id: &str,
    objective: Objective,
    settings: &serde_json::Value,
    config: &RoiConfig,
    now: DateTime<Utc>,
) -> RoiOverrides {
    let mut overrides = RoiOverrides {
        min_roi_multiple: settings_number(settings, &["min_roi_multiple", "minRoiMultiple"]),
        value_per_score_point_usd: settings_number(settings, &["value_per_score_point_usd", "valuePerScorePointUsd"]),
        learned_leads: None,
    };
    if objective != Objective::Leads {
        return overrides;
    }

    let since = now - Duration::days(config.lead_window_days.max(0));
    let metadata = match store.outcome_metadata_since(org_id, since).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!("Failed to read lead values for {}: {}", org_id, e);
            Vec::new()
        }
    };
    if let Some(learned) = learn_lead_economics(&metadata, config) {
        overrides.min_roi_multiple = overrides.min_roi_multiple.or(Some(learned.min_roi_multiple));
        overrides.value_per_score_point_usd = overrides
            .value_per_score_point_usd
            .or(Some(learned.value_per_point_usd));
        overrides.learned_leads = Some(learned);
    }
    overrides
}
