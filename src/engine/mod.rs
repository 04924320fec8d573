//! Survey score prediction engine.
//!
//! [`ScoreEngine`] is the facade over the whole pipeline: it trains one
//! model per survey metric from historical hospital observations, keeps
//! the winners in a [`ModelRegistry`], predicts scores with confidence
//! values, explains them through key factors, and derives
//! opportunity/risk insights from prediction gaps.
//!
//! Training mutates the engine (`&mut self`); prediction and insight
//! generation are read-only (`&self`), so a trained engine can be
//! shared behind an `Arc` and queried from many threads at once.
//!
//! # Example
//!
//! ```
//! use pulso::engine::ScoreEngine;
//! use pulso::features::N_FEATURES;
//!
//! let engine = ScoreEngine::new();
//! // No model registered for this metric: sentinel scores, no factors.
//! let (score, confidence) = engine.predict_metric("cleanliness", &[0.0; N_FEATURES]);
//! assert_eq!((score, confidence), (0.0, 0.0));
//! assert!(engine.key_factors("cleanliness", &[0.0; N_FEATURES]).is_empty());
//! ```

use crate::error::Result;
use crate::features::{describe_factor, FEATURE_NAMES, N_FEATURES};
use crate::insights::{generate_insights, Insight};
use crate::primitives::{Matrix, Vector};
use crate::registry::{CandidateScore, ModelRegistry};
use crate::traits::{Estimator, Transformer};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

mod candidate;
mod trainer;

pub use candidate::Candidate;
pub use trainer::{train_metric, SkipReason, TrainingOutcome, MIN_TRAINING_OBSERVATIONS};

/// The ten standard patient-experience survey metrics.
pub const SURVEY_METRICS: [&str; 10] = [
    "communication_nurses",
    "communication_doctors",
    "responsiveness_staff",
    "pain_management",
    "medication_communication",
    "cleanliness",
    "quietness",
    "discharge_information",
    "overall_rating",
    "recommend_hospital",
];

/// Maximum number of key factors reported per prediction.
const FACTOR_COUNT: usize = 3;
/// Importance weights at or below this never become key factors.
const IMPORTANCE_FLOOR: f32 = 0.01;
/// Features listed in the performance summary's importance ranking.
const TOP_FEATURE_COUNT: usize = 5;

/// Per-metric outcome of a [`ScoreEngine::train_all`] run.
#[derive(Debug, Clone, Serialize)]
pub struct MetricReport {
    /// Whether a model was produced for this metric.
    pub status: TrainingStatus,
    /// Name of the winning candidate, if one was elected.
    pub best_model: Option<String>,
    /// Held-out and cross-validated scores of the winner.
    pub performance: Option<CandidateScore>,
    /// Why the metric was skipped, when it was.
    pub note: Option<String>,
}

impl MetricReport {
    fn skipped(note: String) -> Self {
        Self {
            status: TrainingStatus::Skipped,
            best_model: None,
            performance: None,
            note: Some(note),
        }
    }
}

/// Whether a metric ended a training run with a registered model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    /// A winner was elected and registered.
    Trained,
    /// No model was produced; see the report note.
    Skipped,
}

/// Training outcomes keyed by metric name, in ascending order.
pub type TrainingReport = BTreeMap<String, MetricReport>;

/// Scores, confidences, and key factors for a set of requested metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictionSet {
    /// Predicted score per metric, bounded to [0, 100], one decimal.
    pub predictions: BTreeMap<String, f32>,
    /// Held-out R² of the serving model per metric, three decimals.
    pub confidences: BTreeMap<String, f32>,
    /// Human-readable top factors per metric, strongest first.
    pub factors: BTreeMap<String, Vec<String>>,
}

/// Aggregate quality statistics over every registered model.
#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    /// Fleet-wide R² statistics; `None` when nothing is trained.
    pub overall: Option<OverallPerformance>,
    /// Per-winning-model-type statistics, keyed by model name.
    pub by_model: BTreeMap<String, ModelTypeSummary>,
    /// Importance averaged across metrics; `None` when nothing is trained.
    pub importance: Option<ImportanceSummary>,
}

/// R² statistics across all registered models.
#[derive(Debug, Clone, Serialize)]
pub struct OverallPerformance {
    /// Mean held-out R².
    pub average_r2: f32,
    /// Highest held-out R².
    pub best_r2: f32,
    /// Lowest held-out R².
    pub worst_r2: f32,
    /// Number of registered models.
    pub total_models: usize,
}

/// How often a model type won elections, and how well it scored.
#[derive(Debug, Clone, Serialize)]
pub struct ModelTypeSummary {
    /// Number of metrics this model type serves.
    pub count: usize,
    /// Mean held-out R² across those metrics.
    pub average_r2: f32,
    /// Population standard deviation of those R² values.
    pub std_r2: f32,
}

/// Feature importance averaged over every registered model.
#[derive(Debug, Clone, Serialize)]
pub struct ImportanceSummary {
    /// Mean importance per feature, indexed like [`FEATURE_NAMES`].
    pub average: Vec<f32>,
    /// The highest-ranked feature names, strongest first.
    pub top_features: Vec<String>,
}

/// Trains, serves, persists, and explains per-metric score models.
#[derive(Debug)]
pub struct ScoreEngine {
    registry: ModelRegistry,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ScoreEngine {
    /// Creates an engine with an empty model registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: ModelRegistry::new(),
        }
    }

    /// Creates an engine serving a pre-built registry.
    #[must_use]
    pub fn with_registry(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Returns the underlying model registry.
    #[must_use]
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Trains one model per metric and registers every winner.
    ///
    /// `features` holds one row per historical observation, with columns
    /// in [`FEATURE_NAMES`] order. `targets` maps each metric name to
    /// its per-observation scores, aligned with the feature rows.
    /// Metrics train independently and in parallel; one metric failing
    /// or lacking data never affects the others. A metric that trained
    /// before and is skipped now keeps its previous model.
    ///
    /// The returned report has one entry per requested metric, in
    /// ascending name order.
    pub fn train_all(
        &mut self,
        features: &Matrix<f32>,
        targets: &BTreeMap<String, Vec<f32>>,
    ) -> TrainingReport {
        log::info!("Training models for {} metrics", targets.len());

        let outcomes: Vec<(String, Result<TrainingOutcome>)> = targets
            .par_iter()
            .map(|(metric, values)| {
                let y = Vector::from_slice(values);
                (metric.clone(), train_metric(metric, features, &y))
            })
            .collect();

        let mut report = TrainingReport::new();
        for (metric, outcome) in outcomes {
            match outcome {
                Ok(TrainingOutcome::Trained(model)) => {
                    report.insert(
                        metric.clone(),
                        MetricReport {
                            status: TrainingStatus::Trained,
                            best_model: Some(model.best_model_name().to_string()),
                            performance: Some(model.performance),
                            note: None,
                        },
                    );
                    self.registry.register(metric, *model);
                }
                Ok(TrainingOutcome::Skipped(reason)) => {
                    report.insert(metric, MetricReport::skipped(reason.to_string()));
                }
                Err(e) => {
                    log::warn!("Training failed for {metric}: {e}");
                    report.insert(metric, MetricReport::skipped(e.to_string()));
                }
            }
        }

        let trained = report
            .values()
            .filter(|entry| entry.status == TrainingStatus::Trained)
            .count();
        log::info!("Training complete: {trained}/{} metrics trained", report.len());

        report
    }

    /// Predicts one metric's score for a hospital.
    ///
    /// Returns `(score, confidence)`: the score is bounded to
    /// [0, 100] and rounded to one decimal, the confidence is the
    /// serving model's held-out R² rounded to three decimals (and can
    /// be negative for a model worse than the mean). A metric without
    /// a registered model returns the `(0.0, 0.0)` sentinel.
    ///
    /// # Panics
    ///
    /// Panics if a registered model was trained on a feature layout
    /// other than [`FEATURE_NAMES`].
    #[must_use]
    pub fn predict_metric(&self, metric: &str, features: &[f32; N_FEATURES]) -> (f32, f32) {
        let Some(entry) = self.registry.get(metric) else {
            return (0.0, 0.0);
        };

        let x = Matrix::from_vec(1, N_FEATURES, features.to_vec())
            .expect("single-row feature matrix dimensions are consistent");
        let scaled = entry
            .scaler
            .transform(&x)
            .expect("scaler fitted at training time with this feature layout");
        let selected = entry
            .selector
            .transform(&scaled)
            .expect("selector fitted at training time with this feature layout");

        let raw = entry.model.predict(&selected)[0];
        let bounded = raw.clamp(0.0, 100.0);

        (round1(bounded), round3(entry.performance.r2))
    }

    /// Explains a prediction through its strongest feature weights.
    ///
    /// Returns up to three factor descriptions, strongest first. Only
    /// features whose importance weight is strictly above the floor
    /// qualify, so an untrained metric or an all-weak model yields an
    /// empty list.
    #[must_use]
    pub fn key_factors(&self, metric: &str, features: &[f32; N_FEATURES]) -> Vec<String> {
        let Some(entry) = self.registry.get(metric) else {
            return Vec::new();
        };

        entry
            .importance
            .top_ranked(FACTOR_COUNT, IMPORTANCE_FLOOR)
            .into_iter()
            .map(|idx| describe_factor(FEATURE_NAMES[idx], features[idx]))
            .collect()
    }

    /// Predicts every requested metric for one hospital.
    ///
    /// Untrained metrics appear in the result with sentinel scores and
    /// empty factor lists, so callers can request the full
    /// [`SURVEY_METRICS`] panel without checking what trained.
    #[must_use]
    pub fn predict<S: AsRef<str>>(
        &self,
        features: &[f32; N_FEATURES],
        metrics: &[S],
    ) -> PredictionSet {
        let mut set = PredictionSet::default();
        for metric in metrics {
            let metric = metric.as_ref();
            let (score, confidence) = self.predict_metric(metric, features);
            set.predictions.insert(metric.to_string(), score);
            set.confidences.insert(metric.to_string(), confidence);
            set.factors
                .insert(metric.to_string(), self.key_factors(metric, features));
        }
        set
    }

    /// Derives opportunity and risk insights from score gaps.
    ///
    /// Compares predicted scores against current actuals; see
    /// [`generate_insights`] for the gap thresholds.
    #[allow(clippy::unused_self)]
    #[must_use]
    pub fn insights(
        &self,
        actuals: &BTreeMap<String, f32>,
        predictions: &BTreeMap<String, f32>,
    ) -> Vec<Insight> {
        generate_insights(actuals, predictions)
    }

    /// Persists every registered model to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the filesystem write fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.registry.save(path)
    }

    /// Replaces the registry with models loaded from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or unreadable, the blob
    /// does not decode, or it was built against a different feature
    /// layout. The current registry is kept untouched on failure.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.registry.load(path)
    }

    /// Summarizes model quality across every trained metric.
    #[must_use]
    pub fn performance_summary(&self) -> PerformanceSummary {
        let r2_values: Vec<f32> = self
            .registry
            .models()
            .map(|(_, model)| model.performance.r2)
            .collect();

        let overall = if r2_values.is_empty() {
            None
        } else {
            let total = r2_values.len();
            let sum: f32 = r2_values.iter().sum();
            let best = r2_values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let worst = r2_values.iter().copied().fold(f32::INFINITY, f32::min);
            Some(OverallPerformance {
                average_r2: sum / total as f32,
                best_r2: best,
                worst_r2: worst,
                total_models: total,
            })
        };

        let mut grouped: BTreeMap<&str, Vec<f32>> = BTreeMap::new();
        for (_, model) in self.registry.models() {
            grouped
                .entry(model.best_model_name())
                .or_default()
                .push(model.performance.r2);
        }
        let by_model = grouped
            .into_iter()
            .map(|(name, values)| {
                let count = values.len();
                let mean = values.iter().sum::<f32>() / count as f32;
                let var =
                    values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / count as f32;
                (
                    name.to_string(),
                    ModelTypeSummary {
                        count,
                        average_r2: mean,
                        std_r2: var.sqrt(),
                    },
                )
            })
            .collect();

        PerformanceSummary {
            overall,
            by_model,
            importance: self.average_importance(),
        }
    }

    /// Averages importance weights element-wise over registered models.
    fn average_importance(&self) -> Option<ImportanceSummary> {
        let mut total = vec![0.0_f32; N_FEATURES];
        let mut count = 0_usize;
        for (_, model) in self.registry.models() {
            for (slot, weight) in total.iter_mut().zip(model.importance.weights()) {
                *slot += weight;
            }
            count += 1;
        }
        if count == 0 {
            return None;
        }

        let average: Vec<f32> = total.iter().map(|t| t / count as f32).collect();

        let mut order: Vec<usize> = (0..N_FEATURES).collect();
        order.sort_by(|&a, &b| average[b].total_cmp(&average[a]).then(a.cmp(&b)));
        let top_features = order
            .iter()
            .take(TOP_FEATURE_COUNT)
            .map(|&idx| FEATURE_NAMES[idx].to_string())
            .collect();

        Some(ImportanceSummary {
            average,
            top_features,
        })
    }
}

/// Rounds to one decimal place.
fn round1(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}

/// Rounds to three decimal places.
fn round3(value: f32) -> f32 {
    (value * 1000.0).round() / 1000.0
}
