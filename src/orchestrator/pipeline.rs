//! Draft generation pipeline
//!
//! request → intent cache → deterministic speculation → ROI gate → budget
//! gate → model call or deterministic synthesis → variant selection →
//! background cache write and usage log.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::{Config, RoiConfig};
use crate::deterministic::{
    build_deterministic_score, generate_variants, mean_score, primary_framework, DeterministicDraft,
    DeterministicScore, DraftSpec,
};
use crate::error::GenerationError;
use crate::learning::{
    generate_creative_angles, log_decision, log_outcome_for_post, refresh_creative_memory_from_post,
    select_best_variant, CreativeAngle, NewOutcome, PostPerformance,
};
use crate::llm::{normalize_model_output, schema_reminder, LlmProvider, LlmRequest, LlmResponse, ModelDraft};
use crate::signals::{derive_creative_signals, CreativeSignals};
use crate::store::{CreativeMemoryInsight, DecisionLog, EngineStore, UsageEvent};
use crate::telemetry::Telemetry;
use crate::types::{ContentType, GenerationMode, Language, Message, ModelTier, Objective, Platform, QualityMode};

use super::budget::{decide_paid_ai_access, BudgetDecision, BudgetGovernor};
use super::cache::{build_intent_cache_key, normalize_intent_payload, IntentCache};
use super::roi::{evaluate_premium_roi_gate, resolve_roi_overrides, PremiumRoiDecision, RoiInput};
use super::router::ModelRouter;

pub const ROUTE_GENERATE: &str = "generate_drafts";

/// A request for drafts on one or more platforms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub org_id: String,
    pub idea: String,
    pub platforms: Vec<Platform>,
    pub objective: Objective,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub quality_mode: QualityMode,
    #[serde(default)]
    pub content_type: ContentType,
    /// Referenced external content (business profile, landing page text)
    #[serde(default)]
    pub context: Vec<String>,
}

/// Selected draft for one platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformDraft {
    pub platform: Platform,
    pub text: String,
    pub variants: Vec<String>,
    pub selected_variant: usize,
    pub selection_reason: String,
    pub signals: CreativeSignals,
    pub score: DeterministicScore,
    pub angles: Vec<CreativeAngle>,
}

/// Deterministic score and the model scores projected from it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectedScores {
    pub deterministic: f64,
    pub baseline: f64,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResponse {
    pub drafts: Vec<PlatformDraft>,
    pub mode: GenerationMode,
    pub model: Option<String>,
    pub cache_hit: bool,
    pub intent_hash: String,
    pub cost_usd: Decimal,
    pub projected: Option<ProjectedScores>,
    pub roi: Option<PremiumRoiDecision>,
    pub budget: Option<BudgetDecision>,
    pub warnings: Vec<String>,
}

/// What was published, for the decision log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishRecord {
    pub org_id: String,
    pub post_id: String,
    pub platform: Platform,
    pub objective: Objective,
    pub text: String,
    #[serde(default)]
    pub model: Option<String>,
    pub mode: GenerationMode,
    #[serde(default)]
    pub variant_index: usize,
    #[serde(default)]
    pub roi: Option<PremiumRoiDecision>,
}

/// Economy and premium scores implied by a deterministic score.
///
/// Each tier recovers a fixed share of the headroom above the deterministic
/// score.
pub fn project_scores(deterministic: f64, roi: &RoiConfig) -> ProjectedScores {
    let det = deterministic.clamp(0.0, 100.0);
    let headroom = 100.0 - det;
    ProjectedScores {
        deterministic: det,
        baseline: det + headroom * roi.economy_capture.clamp(0.0, 1.0),
        premium: det + headroom * roi.premium_capture.clamp(0.0, 1.0),
    }
}

fn language_name(language: Language) -> &'static str {
    match language {
        Language::En => "English",
        Language::Ro => "Romanian",
    }
}

fn dedup_platforms(platforms: &[Platform]) -> Vec<Platform> {
    let mut out = Vec::with_capacity(platforms.len());
    for p in platforms {
        if !out.contains(p) {
            out.push(*p);
        }
    }
    out
}

/// Deterministic speculation and angles for one platform
struct PlatformPlan {
    platform: Platform,
    angles: Vec<CreativeAngle>,
    drafts: Vec<DeterministicDraft>,
}

/// Generation engine wired to a store, a provider and config
#[derive(Clone)]
pub struct GenerationEngine {
    store: Arc<dyn EngineStore>,
    provider: Arc<dyn LlmProvider>,
    config: Arc<Config>,
    router: ModelRouter,
    budget: BudgetGovernor,
    cache: IntentCache,
    telemetry: Telemetry,
}

impl GenerationEngine {
    pub fn new(store: Arc<dyn EngineStore>, provider: Arc<dyn LlmProvider>, config: Arc<Config>) -> Self {
        Self {
            router: ModelRouter::from_config(&config.models),
            budget: BudgetGovernor::new(store.clone(), config.budget.clone()),
            cache: IntentCache::new(store.clone()),
            telemetry: Telemetry::new(),
            store,
            provider,
            config,
        }
    }

    pub fn store(&self) -> &Arc<dyn EngineStore> {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn budget(&self) -> &BudgetGovernor {
        &self.budget
    }

    pub fn router(&self) -> &ModelRouter {
        &self.router
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    async fn insights(&self, org_id: &str, platform: Platform, objective: Objective) -> Vec<CreativeMemoryInsight> {
        match self.store.creative_insights(org_id, platform, objective).await {
            Ok(insights) => insights,
            Err(e) => {
                warn!("Failed to read creative memory for {}: {}", org_id, e);
                Vec::new()
            }
        }
    }

    /// Ranked creative angles for one scope
    pub async fn creative_angles(&self, org_id: &str, platform: Platform, objective: Objective) -> Vec<CreativeAngle> {
        let insights = self.insights(org_id, platform, objective).await;
        generate_creative_angles(&insights, platform, objective, &mut rand::rng())
    }

    /// ROI verdict for explicit scores and costs, with org overrides applied
    pub async fn evaluate_roi(
        &self,
        org_id: &str,
        objective: Objective,
        baseline_score: f64,
        projected_premium_score: f64,
        economy_cost_usd: f64,
        premium_cost_usd: f64,
    ) -> PremiumRoiDecision {
        let settings = self.org_settings(org_id).await;
        let overrides =
            resolve_roi_overrides(self.store.as_ref(), org_id, objective, &settings, &self.config.roi, Utc::now()).await;
        evaluate_premium_roi_gate(
            &RoiInput {
                baseline_score,
                projected_premium_score,
                economy_cost_usd,
                premium_cost_usd,
                objective,
                min_roi_multiple: overrides.min_roi_multiple,
                value_per_score_point_usd: overrides.value_per_score_point_usd,
            },
            &self.config.roi,
        )
    }

    async fn org_settings(&self, org_id: &str) -> serde_json::Value {
        match self.store.org_settings(org_id).await {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to read org settings for {}: {}", org_id, e);
                serde_json::Value::Null
            }
        }
    }

    /// Generate drafts for every requested platform.
    ///
    /// Only an invalid request or model output that stays malformed after one
    /// retry produce an error; provider and budget failures degrade to
    /// deterministic drafts.
    pub async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, GenerationError> {
        let org_id = request.org_id.trim().to_string();
        if org_id.is_empty() {
            return Err(GenerationError::InvalidRequest("org_id is required".to_string()));
        }
        let platforms = dedup_platforms(&request.platforms);
        if platforms.is_empty() {
            return Err(GenerationError::InvalidRequest("at least one platform is required".to_string()));
        }

        let payload = normalize_intent_payload(&request);
        let intent_hash = build_intent_cache_key(ROUTE_GENERATE, &payload, &self.config.cache.schema_version);

        if let Some(cached) = self.cache.get(&org_id, ROUTE_GENERATE, &intent_hash).await {
            match serde_json::from_value::<GenerationResponse>(cached) {
                Ok(mut response) => {
                    debug!("Intent cache hit {} for {}", intent_hash, org_id);
                    response.cache_hit = true;
                    response.mode = GenerationMode::Cache;
                    response.cost_usd = Decimal::ZERO;
                    let mut usage = UsageEvent::new(&org_id, ROUTE_GENERATE, GenerationMode::Cache);
                    usage.cache_hit = true;
                    usage.model = response.model.clone();
                    self.log_usage(usage).await;
                    return Ok(response);
                }
                Err(e) => warn!("Discarding unreadable cache entry {}: {}", intent_hash, e),
            }
        }

        let mut plans = Vec::with_capacity(platforms.len());
        for platform in &platforms {
            plans.push(self.plan_platform(&org_id, &request, *platform).await);
        }
        let all_drafts: Vec<DeterministicDraft> = plans.iter().flat_map(|p| p.drafts.iter().cloned()).collect();
        let projected = project_scores(mean_score(&all_drafts), &self.config.roi);

        let (system_prompt, user_prompt) = self.build_prompts(&request, &plans);
        let prompt_chars = system_prompt.chars().count() + user_prompt.chars().count();
        let economy_estimate = self.router.estimate_cost(ModelTier::Economy, prompt_chars);
        let premium_estimate = self.router.estimate_cost(ModelTier::Premium, prompt_chars);

        let mut warnings = Vec::new();
        let mut roi = None;
        let mut tier = match request.quality_mode {
            QualityMode::Deterministic => {
                let response = self
                    .deterministic_response(&org_id, &request, plans, &intent_hash, projected, None, None, warnings)
                    .await;
                let usage = UsageEvent::new(&org_id, ROUTE_GENERATE, GenerationMode::Deterministic);
                self.finish(&org_id, &intent_hash, &response, usage, Some(self.config.cache.ttl_secs)).await;
                return Ok(response);
            }
            QualityMode::Economy => ModelTier::Economy,
            QualityMode::Premium => ModelTier::Premium,
            QualityMode::Auto => {
                let decision = self
                    .evaluate_roi(
                        &org_id,
                        request.objective,
                        projected.baseline,
                        projected.premium,
                        economy_estimate.to_f64().unwrap_or(0.0),
                        premium_estimate.to_f64().unwrap_or(0.0),
                    )
                    .await;
                let tier = if decision.should_escalate {
                    ModelTier::Premium
                } else {
                    ModelTier::Economy
                };
                info!("ROI gate for {}: {} ({}, {})", org_id, tier.as_str(), decision.reason, request.objective);
                roi = Some(decision);
                tier
            }
        };

        // budget is read once; a premium denial may still fit the economy tier
        let caps = self.budget.caps(&org_id).await;
        let spent = self.budget.usage(&org_id, Utc::now()).await;
        let estimate_for = |tier: ModelTier| match tier {
            ModelTier::Economy => economy_estimate,
            ModelTier::Premium => premium_estimate,
        };
        let mut budget = decide_paid_ai_access(&caps, &spent, estimate_for(tier));
        if !budget.allowed && tier == ModelTier::Premium {
            let economy = decide_paid_ai_access(&caps, &spent, economy_estimate);
            if economy.allowed {
                warnings.push(format!(
                    "Premium model skipped ({}); using the economy model",
                    budget.reason.clone().unwrap_or_default()
                ));
                tier = ModelTier::Economy;
                budget = economy;
            }
        }
        if !budget.allowed {
            let denied =
                GenerationError::BudgetExceeded(budget.reason.clone().unwrap_or_else(|| "AI budget exceeded".to_string()));
            warn!("Budget denied model call for {}: {}", org_id, denied);
            warnings.push(format!("{}. Served deterministic drafts instead.", denied));
            let response = self
                .deterministic_response(&org_id, &request, plans, &intent_hash, projected, roi, Some(budget), warnings)
                .await;
            let mut usage = UsageEvent::new(&org_id, ROUTE_GENERATE, GenerationMode::Deterministic);
            usage.error_code = Some(denied.code().to_string());
            self.finish(&org_id, &intent_hash, &response, usage, Some(self.config.cache.budget_exceeded_ttl_secs))
                .await;
            return Ok(response);
        }

        let model = self.router.model_for(tier).clone();
        let mut llm_request = LlmRequest {
            model: model.model.clone(),
            system_prompt,
            messages: vec![Message::user(user_prompt)],
            max_tokens: model.max_tokens,
        };
        let mut usage = UsageEvent::new(&org_id, ROUTE_GENERATE, tier.into());
        usage.model = Some(model.model.clone());

        let first = match self.provider.call(&llm_request).await {
            Ok(response) => response,
            Err(e) => {
                let error = GenerationError::ProviderUnavailable(e.to_string());
                return Ok(self
                    .provider_fallback(&org_id, &request, plans, &intent_hash, projected, roi, budget, warnings, usage, error)
                    .await);
            }
        };
        self.account(&mut usage, tier, &first, prompt_chars);

        let model_drafts = match normalize_model_output(&first.text, &platforms) {
            Ok(drafts) => drafts,
            Err(err) => {
                debug!("Model output rejected ({}); retrying once", err);
                llm_request.messages.push(Message::assistant(first.text.clone()));
                llm_request.messages.push(Message::user(schema_reminder(&platforms, &err)));
                let retry_chars = llm_request.prompt_chars();
                let second = match self.provider.call(&llm_request).await {
                    Ok(response) => response,
                    Err(e) => {
                        let error = GenerationError::ProviderUnavailable(e.to_string());
                        return Ok(self
                            .provider_fallback(&org_id, &request, plans, &intent_hash, projected, roi, budget, warnings, usage, error)
                            .await);
                    }
                };
                self.account(&mut usage, tier, &second, retry_chars);
                match normalize_model_output(&second.text, &platforms) {
                    Ok(drafts) => drafts,
                    Err(err) => {
                        warn!("Model output for {} invalid after retry: {}", org_id, err);
                        let err = GenerationError::SchemaInvalid(err.to_string());
                        usage.success = false;
                        usage.error_code = Some(err.code().to_string());
                        self.log_usage(usage).await;
                        return Err(err);
                    }
                }
            }
        };

        let response = self
            .model_response(&org_id, &request, plans, model_drafts, &intent_hash, projected, roi, budget, warnings, &usage)
            .await;
        self.finish(&org_id, &intent_hash, &response, usage, Some(self.config.cache.ttl_secs)).await;
        Ok(response)
    }

    async fn plan_platform(&self, org_id: &str, request: &GenerationRequest, platform: Platform) -> PlatformPlan {
        let insights = self.insights(org_id, platform, request.objective).await;
        let angles = generate_creative_angles(&insights, platform, request.objective, &mut rand::rng());
        let primary = primary_framework(&request.idea, request.objective, request.language);
        let secondary = angles.first().map(|a| a.framework).unwrap_or(primary);
        let spec = DraftSpec {
            idea: &request.idea,
            platform,
            objective: request.objective,
            language: request.language,
            content_type: request.content_type,
            framework: None,
            variant: 0,
        };
        PlatformPlan {
            platform,
            angles,
            drafts: generate_variants(&spec, &[primary, secondary]),
        }
    }

    fn build_prompts(&self, request: &GenerationRequest, plans: &[PlatformPlan]) -> (String, String) {
        let variants = self.config.models.variants_per_platform.max(1);
        let mut system = format!(
            "You are a social media copywriter. Write in {language}. Optimize every post for {objective}.\n\
             For each platform write {variants} distinct, platform-native variants of a {content_type}.\n\
             Respond with JSON only, in the form \
             {{\"drafts\":[{{\"platform\":\"<name>\",\"variants\":[\"<post text>\"]}}]}}.\n",
            language = language_name(request.language),
            objective = request.objective,
            variants = variants,
            content_type = request.content_type.as_str(),
        );
        for plan in plans {
            system.push_str(&format!("\nCreative directions for {}:\n", plan.platform));
            for angle in plan.angles.iter().take(3) {
                system.push_str(&format!(
                    "- {}: {} hook, {} structure, {} call to action. {}\n",
                    angle.name,
                    angle.hook_type.as_str(),
                    angle.framework.as_str(),
                    angle.cta_type.as_str(),
                    angle.reasoning
                ));
            }
        }

        let names: Vec<&str> = plans.iter().map(|p| p.platform.as_str()).collect();
        let mut user = format!("Idea: {}\nPlatforms: {}\n", request.idea.trim(), names.join(", "));
        let context: Vec<&str> = request.context.iter().map(|c| c.trim()).filter(|c| !c.is_empty()).collect();
        if !context.is_empty() {
            user.push_str("Context:\n");
            for c in context {
                user.push_str(c);
                user.push('\n');
            }
        }
        (system, user)
    }

    fn account(&self, usage: &mut UsageEvent, tier: ModelTier, response: &LlmResponse, prompt_chars: usize) {
        usage.cost_usd += self
            .router
            .actual_cost(tier, response.input_tokens, response.output_tokens, prompt_chars);
        usage.input_tokens = usage.input_tokens.saturating_add(response.input_tokens);
        usage.output_tokens = usage.output_tokens.saturating_add(response.output_tokens);
        usage.latency_ms += response.latency_ms;
        usage.provider = Some(response.provider.clone());
        usage.model = Some(response.model.clone());
    }

    #[allow(clippy::too_many_arguments)]
    async fn select(
        &self,
        org_id: &str,
        objective: Objective,
        platform: Platform,
        variants: Vec<String>,
        angles: Vec<CreativeAngle>,
        scores: Option<Vec<DeterministicScore>>,
        content_type: ContentType,
    ) -> PlatformDraft {
        let selection =
            select_best_variant(self.store.as_ref(), &self.config.bandit, org_id, platform, objective, &variants).await;
        let index = selection.selected_index.min(variants.len().saturating_sub(1));
        let text = variants.get(index).cloned().unwrap_or_default();
        let score = scores
            .and_then(|mut s| (index < s.len()).then(|| s.swap_remove(index)))
            .unwrap_or_else(|| build_deterministic_score(&text, platform, content_type));
        PlatformDraft {
            platform,
            signals: derive_creative_signals(&text, None),
            text,
            variants,
            selected_variant: index,
            selection_reason: selection.reason,
            score,
            angles,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn deterministic_response(
        &self,
        org_id: &str,
        request: &GenerationRequest,
        plans: Vec<PlatformPlan>,
        intent_hash: &str,
        projected: ProjectedScores,
        roi: Option<PremiumRoiDecision>,
        budget: Option<BudgetDecision>,
        warnings: Vec<String>,
    ) -> GenerationResponse {
        let mut drafts = Vec::with_capacity(plans.len());
        for plan in plans {
            let (variants, scores): (Vec<String>, Vec<DeterministicScore>) =
                plan.drafts.into_iter().map(|d| (d.text, d.score)).unzip();
            drafts.push(
                self.select(org_id, request.objective, plan.platform, variants, plan.angles, Some(scores), request.content_type)
                    .await,
            );
        }
        GenerationResponse {
            drafts,
            mode: GenerationMode::Deterministic,
            model: None,
            cache_hit: false,
            intent_hash: intent_hash.to_string(),
            cost_usd: Decimal::ZERO,
            projected: Some(projected),
            roi,
            budget,
            warnings,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn model_response(
        &self,
        org_id: &str,
        request: &GenerationRequest,
        plans: Vec<PlatformPlan>,
        model_drafts: Vec<ModelDraft>,
        intent_hash: &str,
        projected: ProjectedScores,
        roi: Option<PremiumRoiDecision>,
        budget: BudgetDecision,
        warnings: Vec<String>,
        usage: &UsageEvent,
    ) -> GenerationResponse {
        let limit = self.config.models.variants_per_platform.max(1);
        let mut drafts = Vec::with_capacity(plans.len());
        for plan in plans {
            let mut variants: Vec<String> = model_drafts
                .iter()
                .find(|d| d.platform == plan.platform)
                .map(|d| d.variants.clone())
                .unwrap_or_default();
            variants.truncate(limit);
            if variants.is_empty() {
                variants = plan.drafts.into_iter().map(|d| d.text).collect();
            }
            drafts.push(
                self.select(org_id, request.objective, plan.platform, variants, plan.angles, None, request.content_type)
                    .await,
            );
        }
        GenerationResponse {
            drafts,
            mode: usage.mode,
            model: usage.model.clone(),
            cache_hit: false,
            intent_hash: intent_hash.to_string(),
            cost_usd: usage.cost_usd,
            projected: Some(projected),
            roi,
            budget: Some(budget),
            warnings,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn provider_fallback(
        &self,
        org_id: &str,
        request: &GenerationRequest,
        plans: Vec<PlatformPlan>,
        intent_hash: &str,
        projected: ProjectedScores,
        roi: Option<PremiumRoiDecision>,
        budget: BudgetDecision,
        mut warnings: Vec<String>,
        mut usage: UsageEvent,
        error: GenerationError,
    ) -> GenerationResponse {
        warn!("Model call failed for {}: {}", org_id, error);
        warnings.push("Language model unavailable; served deterministic drafts.".to_string());
        let response = self
            .deterministic_response(org_id, request, plans, intent_hash, projected, roi, Some(budget), warnings)
            .await;
        usage.mode = GenerationMode::Deterministic;
        usage.success = false;
        usage.error_code = Some(error.code().to_string());
        // not cached, so the next identical request tries the model again
        self.finish(org_id, intent_hash, &response, usage, None).await;
        response
    }

    async fn log_usage(&self, usage: UsageEvent) {
        let store = self.store.clone();
        self.telemetry
            .spawn("usage log", async move { store.insert_usage_event(&usage).await })
            .await;
    }

    async fn finish(
        &self,
        org_id: &str,
        intent_hash: &str,
        response: &GenerationResponse,
        usage: UsageEvent,
        cache_ttl_secs: Option<i64>,
    ) {
        if let Some(ttl) = cache_ttl_secs {
            match serde_json::to_value(response) {
                Ok(value) => {
                    let cache = self.cache.clone();
                    let org_id = org_id.to_string();
                    let intent_hash = intent_hash.to_string();
                    self.telemetry
                        .spawn("cache write", async move {
                            cache.put(&org_id, ROUTE_GENERATE, &intent_hash, value, ttl).await
                        })
                        .await;
                }
                Err(e) => warn!("Failed to serialize response for cache: {}", e),
            }
        }
        self.log_usage(usage).await;
    }

    /// Log the decision behind a published post; `None` when the write failed
    pub async fn record_publish(&self, publish: PublishRecord) -> Option<DecisionLog> {
        let decision = DecisionLog {
            id: uuid::Uuid::new_v4().to_string(),
            org_id: publish.org_id,
            post_id: publish.post_id,
            platform: publish.platform,
            objective: publish.objective,
            model: publish.model.unwrap_or_else(|| publish.mode.as_str().to_string()),
            mode: publish.mode,
            variant_index: publish.variant_index,
            memory_key: derive_creative_signals(&publish.text, None).memory_key,
            roi: publish.roi,
            created_at: Utc::now(),
        };
        log_decision(self.store.as_ref(), &decision).await.then_some(decision)
    }

    /// Log a measured outcome; new outcomes refresh creative memory in the background
    pub async fn record_outcome(&self, outcome: NewOutcome) -> bool {
        let fresh = log_outcome_for_post(self.store.as_ref(), &outcome).await;
        if fresh {
            let store = self.store.clone();
            let threshold = self.config.bandit.success_engagement_rate;
            self.telemetry
                .spawn(
                    "creative memory refresh",
                    refresh_from_decision(store, outcome.org_id, outcome.post_id, outcome.metrics.engagement_rate, threshold),
                )
                .await;
        }
        fresh
    }
}

async fn refresh_from_decision(
    store: Arc<dyn EngineStore>,
    org_id: String,
    post_id: String,
    engagement_rate: f64,
    success_engagement_rate: f64,
) -> Result<(), GenerationError> {
    let Some(decision) = store.decision_for_post(&org_id, &post_id).await? else {
        debug!("No decision logged for post {}; creative memory unchanged", post_id);
        return Ok(());
    };
    let post = PostPerformance {
        org_id,
        post_id,
        platform: decision.platform,
        objective: decision.objective,
        memory_key: decision.memory_key,
        engagement_rate,
    };
    refresh_creative_memory_from_post(store.as_ref(), &post, success_engagement_rate).await?;
    Ok(())
}
