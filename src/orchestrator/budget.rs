//! Budget management
//!
//! Caps come from the org settings blob when present, else from config.
//! Usage is summed from the usage ledger at request time; this module never
//! writes the ledger.

use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::BudgetConfig;
use crate::store::EngineStore;

use super::router::usd;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetCaps {
    pub daily_usd: Decimal,
    pub monthly_usd: Decimal,
}

impl BudgetCaps {
    pub fn from_config(config: &BudgetConfig) -> Self {
        Self {
            daily_usd: usd(config.daily_usd),
            monthly_usd: usd(config.monthly_usd),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BudgetUsage {
    pub daily_spent_usd: Decimal,
    pub monthly_spent_usd: Decimal,
}

/// Go/no-go for one costed call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    pub caps: BudgetCaps,
    pub usage: BudgetUsage,
    pub projected_daily_usd: Decimal,
    pub projected_monthly_usd: Decimal,
}

/// Caps, usage and headroom for reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub caps: BudgetCaps,
    pub usage: BudgetUsage,
    pub remaining_daily_usd: Decimal,
    pub remaining_monthly_usd: Decimal,
}

/// Decide whether an additional cost fits under both caps.
///
/// Free calls are always allowed.
pub fn decide_paid_ai_access(caps: &BudgetCaps, usage: &BudgetUsage, estimated_additional_cost_usd: Decimal) -> BudgetDecision {
    let estimate = estimated_additional_cost_usd.max(Decimal::ZERO);
    let projected_daily_usd = usage.daily_spent_usd + estimate;
    let projected_monthly_usd = usage.monthly_spent_usd + estimate;

    let reason = if estimate.is_zero() {
        None
    } else if projected_daily_usd > caps.daily_usd {
        Some(format!(
            "Daily AI budget exceeded: ${} spent + ${} estimated exceeds the ${} daily cap",
            usage.daily_spent_usd.round_dp(4),
            estimate.round_dp(4),
            caps.daily_usd.round_dp(2)
        ))
    } else if projected_monthly_usd > caps.monthly_usd {
        Some(format!(
            "Monthly AI budget exceeded: ${} spent + ${} estimated exceeds the ${} monthly cap",
            usage.monthly_spent_usd.round_dp(4),
            estimate.round_dp(4),
            caps.monthly_usd.round_dp(2)
        ))
    } else {
        None
    };

    BudgetDecision {
        allowed: reason.is_none(),
        reason,
        caps: *caps,
        usage: *usage,
        projected_daily_usd,
        projected_monthly_usd,
    }
}

fn decimal_field(section: &serde_json::Value, keys: &[&str]) -> Option<Decimal> {
    keys.iter().find_map(|key| {
        let value = section.get(*key)?;
        let parsed = match value {
            serde_json::Value::Number(n) => n.as_f64().and_then(Decimal::from_f64),
            serde_json::Value::String(s) => s.trim().parse::<Decimal>().ok(),
            _ => None,
        };
        parsed.filter(|d| *d >= Decimal::ZERO)
    })
}

/// Org settings override the configured caps key by key
pub fn resolve_budget_caps(settings: &serde_json::Value, defaults: &BudgetConfig) -> BudgetCaps {
    let mut caps = BudgetCaps::from_config(defaults);
    let section = settings.get("ai_budget").or_else(|| settings.get("aiBudget"));
    if let Some(section) = section {
        if let Some(daily) = decimal_field(section, &["daily_usd", "dailyUsd"]) {
            caps.daily_usd = daily;
        }
        if let Some(monthly) = decimal_field(section, &["monthly_usd", "monthlyUsd"]) {
            caps.monthly_usd = monthly;
        }
    }
    caps
}

/// Start of the UTC day containing `now`
pub fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Start of the UTC month containing `now`
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(now.year(), now.month(), 1)
        .map(|d| d.and_time(NaiveTime::MIN).and_utc())
        .unwrap_or_else(|| day_start(now))
}

/// Budget governor backed by the usage ledger
#[derive(Clone)]
pub struct BudgetGovernor {
    store: Arc<dyn EngineStore>,
    defaults: BudgetConfig,
}

impl BudgetGovernor {
    pub fn new(store: Arc<dyn EngineStore>, defaults: BudgetConfig) -> Self {
        Self { store, defaults }
    }

    /// Resolved caps; unreadable settings mean defaults
    pub async fn caps(&self, org_id: &str) -> BudgetCaps {
        match self.store.org_settings(org_id).await {
            Ok(settings) => resolve_budget_caps(&settings, &self.defaults),
            Err(e) => {
                warn!("Failed to read org settings for {}: {}", org_id, e);
                BudgetCaps::from_config(&self.defaults)
            }
        }
    }

    /// Spend since the UTC day and month start; unreadable ledger means zero
    pub async fn usage(&self, org_id: &str, now: DateTime<Utc>) -> BudgetUsage {
        let daily_spent_usd = match self.store.sum_usage_cost_since(org_id, day_start(now)).await {
            Ok(sum) => sum,
            Err(e) => {
                warn!("Failed to sum daily usage for {}: {}", org_id, e);
                Decimal::ZERO
            }
        };
        let monthly_spent_usd = match self.store.sum_usage_cost_since(org_id, month_start(now)).await {
            Ok(sum) => sum,
            Err(e) => {
                warn!("Failed to sum monthly usage for {}: {}", org_id, e);
                Decimal::ZERO
            }
        };
        BudgetUsage {
            daily_spent_usd,
            monthly_spent_usd,
        }
    }

    pub async fn decide(&self, org_id: &str, estimated_additional_cost_usd: Decimal) -> BudgetDecision {
        self.decide_at(org_id, estimated_additional_cost_usd, Utc::now()).await
    }

    pub async fn decide_at(
        &self,
        org_id: &str,
        estimated_additional_cost_usd: Decimal,
        now: DateTime<Utc>,
    ) -> BudgetDecision {
        let caps = self.caps(org_id).await;
        let usage = self.usage(org_id, now).await;
        decide_paid_ai_access(&caps, &usage, estimated_additional_cost_usd)
    }

    pub async fn status(&self, org_id: &str) -> BudgetStatus {
        let caps = self.caps(org_id).await;
        let usage = self.usage(org_id, Utc::now()).await;
        BudgetStatus {
            caps,
            usage,
            remaining_daily_usd: (caps.daily_usd - usage.daily_spent_usd).max(Decimal::ZERO),
            remaining_monthly_usd: (caps.monthly_usd - usage.monthly_spent_usd).max(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn caps(daily: Decimal, monthly: Decimal) -> BudgetCaps {
        BudgetCaps {
            daily_usd: daily,
            monthly_usd: monthly,
        }
    }

    #[test]
    fn test_large_estimate_exceeds_daily_cap() {
        let decision = decide_paid_ai_access(&caps(dec!(2), dec!(45)), &BudgetUsage::default(), dec!(100));
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("Daily AI budget exceeded"));
        assert_eq!(decision.projected_daily_usd, dec!(100));
    }

    #[test]
    fn test_monthly_cap_checked_after_daily() {
        let usage = BudgetUsage {
            daily_spent_usd: dec!(0.10),
            monthly_spent_usd: dec!(44.95),
        };
        let decision = decide_paid_ai_access(&caps(dec!(2), dec!(45)), &usage, dec!(0.10));
        assert!(!decision.allowed);
        assert!(decision.reason.unwrap().contains("Monthly AI budget exceeded"));
    }

    #[test]
    fn test_exact_cap_is_allowed() {
        let usage = BudgetUsage {
            daily_spent_usd: dec!(1.50),
            monthly_spent_usd: dec!(10),
        };
        let decision = decide_paid_ai_access(&caps(dec!(2), dec!(45)), &usage, dec!(0.50));
        assert!(decision.allowed);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn test_free_call_always_allowed() {
        let usage = BudgetUsage {
            daily_spent_usd: dec!(5),
            monthly_spent_usd: dec!(50),
        };
        assert!(decide_paid_ai_access(&caps(dec!(2), dec!(45)), &usage, Decimal::ZERO).allowed);
        assert!(decide_paid_ai_access(&caps(dec!(2), dec!(45)), &usage, dec!(-1)).allowed);
    }

    #[test]
    fn test_resolve_caps_from_settings() {
        let defaults = BudgetConfig::default();
        let settings = serde_json::json!({"ai_budget": {"daily_usd": 0.5, "monthlyUsd": "12.5"}});
        let resolved = resolve_budget_caps(&settings, &defaults);
        assert_eq!(resolved.daily_usd, dec!(0.5));
        assert_eq!(resolved.monthly_usd, dec!(12.5));

        let camel = serde_json::json!({"aiBudget": {"dailyUsd": -3, "monthly_usd": true}});
        let resolved = resolve_budget_caps(&camel, &defaults);
        assert_eq!(resolved, BudgetCaps::from_config(&defaults));

        assert_eq!(resolve_budget_caps(&serde_json::Value::Null, &defaults).daily_usd, dec!(2));
    }

    #[test]
    fn test_period_starts() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 15, 42, 9).unwrap();
        assert_eq!(day_start(now), Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap());
        assert_eq!(month_start(now), Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
    }
}
