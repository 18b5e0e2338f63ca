//! Cost-aware model router
//!
//! Routes economy → premium tiers and prices calls before they are made.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

use crate::config::ModelsConfig;
use crate::types::ModelTier;

/// Model configuration for one tier
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: u32,
    /// USD per million input tokens
    pub input_per_mtok: Decimal,
    /// USD per million output tokens
    pub output_per_mtok: Decimal,
}

impl ModelConfig {
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> Decimal {
        let million = Decimal::from(1_000_000u32);
        (Decimal::from(input_tokens) * self.input_per_mtok + Decimal::from(output_tokens) * self.output_per_mtok)
            / million
    }
}

pub(crate) fn usd(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or(Decimal::ZERO).round_dp(6)
}

/// Rough prompt tokenization: four characters per token, rounded up
pub fn estimate_tokens(chars: usize) -> u32 {
    chars.div_ceil(4).min(u32::MAX as usize) as u32
}

/// Cost-optimized model router
#[derive(Debug, Clone)]
pub struct ModelRouter {
    economy: ModelConfig,
    premium: ModelConfig,
}

impl ModelRouter {
    pub fn from_config(models: &ModelsConfig) -> Self {
        Self {
            economy: ModelConfig {
                model: models.economy.clone(),
                max_tokens: models.max_tokens,
                input_per_mtok: usd(models.economy_input_per_mtok),
                output_per_mtok: usd(models.economy_output_per_mtok),
            },
            premium: ModelConfig {
                model: models.premium.clone(),
                max_tokens: models.max_tokens,
                input_per_mtok: usd(models.premium_input_per_mtok),
                output_per_mtok: usd(models.premium_output_per_mtok),
            },
        }
    }

    pub fn model_for(&self, tier: ModelTier) -> &ModelConfig {
        match tier {
            ModelTier::Economy => &self.economy,
            ModelTier::Premium => &self.premium,
        }
    }

    /// Worst-case cost of a call: estimated prompt tokens plus the full output allowance
    pub fn estimate_cost(&self, tier: ModelTier, prompt_chars: usize) -> Decimal {
        let model = self.model_for(tier);
        model.cost(estimate_tokens(prompt_chars), model.max_tokens)
    }

    /// Cost of a finished call; falls back to the estimate when the provider reports no usage
    pub fn actual_cost(&self, tier: ModelTier, input_tokens: u32, output_tokens: u32, prompt_chars: usize) -> Decimal {
        if input_tokens == 0 && output_tokens == 0 {
            return self.estimate_cost(tier, prompt_chars);
        }
        self.model_for(tier).cost(input_tokens, output_tokens)
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::from_config(&ModelsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(4), 1);
        assert_eq!(estimate_tokens(5), 2);
    }

    #[test]
    fn test_premium_costs_more() {
        let router = ModelRouter::default();
        let economy = router.estimate_cost(ModelTier::Economy, 2000);
        let premium = router.estimate_cost(ModelTier::Premium, 2000);
        assert!(economy > Decimal::ZERO);
        assert!(premium > economy);
    }

    #[test]
    fn test_cost_per_million() {
        let model = ModelConfig {
            model: "m".to_string(),
            max_tokens: 100,
            input_per_mtok: dec!(3),
            output_per_mtok: dec!(15),
        };
        assert_eq!(model.cost(1_000_000, 0), dec!(3));
        assert_eq!(model.cost(1000, 1000), dec!(0.018));
    }

    #[test]
    fn test_actual_cost_falls_back_to_estimate() {
        let router = ModelRouter::default();
        assert_eq!(
            router.actual_cost(ModelTier::Economy, 0, 0, 400),
            router.estimate_cost(ModelTier::Economy, 400)
        );
    }
}
