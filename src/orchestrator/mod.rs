//! Generation orchestration
//!
//! Decides, per request, between the intent cache, a deterministic draft and
//! an economy or premium model call, and keeps spend inside the org budget.

pub mod budget;
pub mod cache;
pub mod pipeline;
pub mod roi;
pub mod router;

// Re-export commonly used types
pub use budget::{decide_paid_ai_access, BudgetCaps, BudgetDecision, BudgetGovernor, BudgetStatus, BudgetUsage};
pub use cache::{build_intent_cache_key, content_hash, normalize_intent_payload, IntentCache};
pub use pipeline::{
    project_scores, GenerationEngine, GenerationRequest, GenerationResponse, PlatformDraft, ProjectedScores,
    PublishRecord, ROUTE_GENERATE,
};
pub use roi::{evaluate_premium_roi_gate, learn_lead_economics, PremiumRoiDecision, RoiInput};
pub use router::{ModelConfig, ModelRouter};
