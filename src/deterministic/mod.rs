//! Deterministic generation and heuristic scoring
//!
//! The safety net of the engine: a dependency-free generator that can always
//! produce a platform-native draft, and the scorer that grades any text. The
//! same scorer projects baseline/premium quality for the ROI gate.

pub mod generator;
pub mod scorer;
pub mod templates;
pub mod text;

pub use generator::{
    generate_deterministic_draft, generate_variants, mean_score, primary_framework, DeterministicDraft,
    DraftSpec,
};
pub use scorer::{
    build_deterministic_score, grade_for, ideal_hashtags, ideal_length, triangular_score, DeterministicScore,
    Grade, Metric, MetricScore,
};
