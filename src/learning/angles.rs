//! Creative angle generation
//!
//! Up to five directions for the next post, ranked by a predicted score
//! derived from the organization's creative memory.

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::signals::{self, CtaType, Framework, HookType};
use crate::store::{CreativeMemoryInsight, InsightRank};
use crate::types::{Objective, Platform};

pub const MAX_ANGLES: usize = 5;

/// One suggested creative direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreativeAngle {
    pub id: String,
    pub name: String,
    pub hook_type: HookType,
    pub framework: Framework,
    pub cta_type: CtaType,
    pub memory_key: String,
    pub predicted_score: f64,
    pub is_contrarian: bool,
    pub reasoning: String,
}

/// Fixed triple that best serves an objective
pub fn objective_triple(objective: Objective) -> (HookType, Framework, CtaType) {
    match objective {
        Objective::Engagement => (HookType::Question, Framework::Pas, CtaType::Comment),
        Objective::Reach => (HookType::Interrupt, Framework::Aida, CtaType::Share),
        Objective::Leads => (HookType::Educational, Framework::Pas, CtaType::Click),
        Objective::Saves => (HookType::List, Framework::Listicle, CtaType::Save),
    }
}

/// Fixed triple native to a platform
pub fn platform_triple(platform: Platform) -> (HookType, Framework, CtaType) {
    match platform {
        Platform::Facebook => (HookType::Question, Framework::Pas, CtaType::Comment),
        Platform::Instagram => (HookType::List, Framework::Listicle, CtaType::Save),
        Platform::Tiktok => (HookType::Interrupt, Framework::Story, CtaType::Comment),
        Platform::Youtube => (HookType::Educational, Framework::Aida, CtaType::Click),
    }
}

/// Contrarian substitution cycle
pub fn opposite_hook(hook: HookType) -> HookType {
    match hook {
        HookType::Question => HookType::Statement,
        HookType::Statement => HookType::Story,
        HookType::Story => HookType::Interrupt,
        HookType::Interrupt => HookType::Educational,
        HookType::Educational => HookType::Question,
        HookType::List => HookType::Story,
        HookType::Unknown => HookType::Question,
    }
}

fn hook_base_score(hook: HookType) -> f64 {
    match hook {
        HookType::Question => 72.0,
        HookType::Interrupt => 68.0,
        HookType::List => 70.0,
        HookType::Story => 74.0,
        HookType::Educational => 66.0,
        HookType::Statement | HookType::Unknown => 60.0,
    }
}

fn alignment_bonus(hook: HookType, cta: CtaType, objective: Objective) -> f64 {
    let (target_hook, _, target_cta) = objective_triple(objective);
    let mut bonus = 0.0;
    if hook == target_hook {
        bonus += 5.0;
    }
    if cta == target_cta {
        bonus += 5.0;
    }
    bonus
}

/// Predicted performance of a signal triple.
///
/// Exact memory with at least 3 samples wins, then memory of the same hook,
/// then a fixed per-hook prior plus objective alignment.
pub fn predicted_score(
    hook: HookType,
    framework: Framework,
    cta: CtaType,
    objective: Objective,
    insights: &[CreativeMemoryInsight],
) -> f64 {
    let key = signals::memory_key(hook, framework, cta);
    if let Some(exact) = insights.iter().find(|i| i.memory_key == key && i.sample_size >= 3) {
        return 50.0 + exact.success_rate() * 30.0 + (exact.avg_engagement * 3.0).min(20.0);
    }

    let same_hook: Vec<&CreativeMemoryInsight> = insights
        .iter()
        .filter(|i| i.sample_size > 0 && i.hook_type() == Some(hook))
        .collect();
    if !same_hook.is_empty() {
        let n = same_hook.len() as f64;
        let avg_success = same_hook.iter().map(|i| i.success_rate()).sum::<f64>() / n;
        let avg_engagement = same_hook.iter().map(|i| i.avg_engagement).sum::<f64>() / n;
        return 45.0 + avg_success * 25.0 + (avg_engagement * 3.0).min(20.0);
    }

    (hook_base_score(hook) + alignment_bonus(hook, cta, objective)).min(95.0)
}

fn angle(
    id: &str,
    name: &str,
    triple: (HookType, Framework, CtaType),
    objective: Objective,
    insights: &[CreativeMemoryInsight],
    is_contrarian: bool,
    reasoning: String,
) -> CreativeAngle {
    let (hook_type, framework, cta_type) = triple;
    CreativeAngle {
        id: id.to_string(),
        name: name.to_string(),
        hook_type,
        framework,
        cta_type,
        memory_key: signals::memory_key(hook_type, framework, cta_type),
        predicted_score: predicted_score(hook_type, framework, cta_type, objective, insights),
        is_contrarian,
        reasoning,
    }
}

fn most_sampled_hook(insights: &[CreativeMemoryInsight]) -> Option<HookType> {
    let mut totals: Vec<(HookType, u64)> = Vec::new();
    for insight in insights {
        let Some(hook) = insight.hook_type() else { continue };
        match totals.iter_mut().find(|(h, _)| *h == hook) {
            Some((_, total)) => *total += insight.sample_size as u64,
            None => totals.push((hook, insight.sample_size as u64)),
        }
    }
    totals.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    totals.first().map(|(hook, _)| *hook)
}

fn least_sampled_framework(insights: &[CreativeMemoryInsight]) -> Framework {
    let sampled = |framework: Framework| -> u64 {
        insights
            .iter()
            .filter(|i| i.framework() == Some(framework))
            .map(|i| i.sample_size as u64)
            .sum()
    };
    Framework::named()
        .iter()
        .copied()
        .min_by_key(|f| sampled(*f))
        .unwrap_or(Framework::Story)
}

/// Generate ranked creative angles for one platform and objective.
///
/// `insights` should be the organization's memory for that scope; the
/// exploration angle is drawn with `rng`.
pub fn generate_creative_angles<R: Rng + ?Sized>(
    insights: &[CreativeMemoryInsight],
    platform: Platform,
    objective: Objective,
    rng: &mut R,
) -> Vec<CreativeAngle> {
    let mut angles = Vec::with_capacity(MAX_ANGLES);

    let proven = insights
        .iter()
        .filter(|i| i.rank() == InsightRank::Top)
        .filter_map(|i| i.signals().map(|s| (i, s)))
        .max_by(|(a, _), (b, _)| a.avg_engagement.total_cmp(&b.avg_engagement));
    if let Some((winner, triple)) = proven {
        angles.push(angle(
            "proven_winner",
            "Proven winner",
            triple,
            objective,
            insights,
            false,
            format!(
                "Top performer: {:.0}% success over {} posts, {:.1}% average engagement",
                winner.success_rate() * 100.0,
                winner.sample_size,
                winner.avg_engagement
            ),
        ));
    }

    angles.push(angle(
        "objective_optimized",
        "Objective optimized",
        objective_triple(objective),
        objective,
        insights,
        false,
        format!("Hook, structure and CTA chosen for the {} objective", objective),
    ));

    if let Some(dominant) = most_sampled_hook(insights) {
        let hook = opposite_hook(dominant);
        let framework = least_sampled_framework(insights);
        let (_, _, cta) = objective_triple(objective);
        angles.push(angle(
            "contrarian",
            "Contrarian",
            (hook, framework, cta),
            objective,
            insights,
            true,
            format!(
                "Breaks the usual {} hook with a {} hook and the least tried {} structure",
                dominant.as_str(),
                hook.as_str(),
                framework.as_str()
            ),
        ));
    }

    let untested: Vec<(&CreativeMemoryInsight, (HookType, Framework, CtaType))> = insights
        .iter()
        .filter(|i| i.sample_size < 3)
        .filter_map(|i| i.signals().map(|s| (i, s)))
        .collect();
    if let Some((candidate, triple)) = untested.choose(rng) {
        angles.push(angle(
            "exploration",
            "Exploration",
            *triple,
            objective,
            insights,
            false,
            format!("Only {} posts so far; worth another test", candidate.sample_size),
        ));
    }

    angles.push(angle(
        "platform_native",
        "Platform native",
        platform_triple(platform),
        objective,
        insights,
        false,
        format!("Format that fits {} conventions", platform),
    ));

    // stable sort keeps insertion order among equal scores
    angles.sort_by(|a, b| {
        a.is_contrarian
            .cmp(&b.is_contrarian)
            .then(b.predicted_score.total_cmp(&a.predicted_score))
    });
    angles.truncate(MAX_ANGLES);
    angles
}
