//! Self-improving creative learning
//!
//! Turns measured outcomes into per-organization creative memory and uses
//! that memory to suggest angles and pick between candidate variants.

pub mod angles;
pub mod bandit;
pub mod memory;
pub mod outcomes;

pub use angles::{generate_creative_angles, predicted_score, CreativeAngle};
pub use bandit::{objective_bonus, rank_variants, select_best_variant, BanditSelection, RankedVariant, VariantStats};
pub use memory::{refresh_creative_memory_from_post, PostPerformance};
pub use outcomes::{log_decision, log_outcome_for_post, metrics_hash, session_history, NewOutcome};
