//! Per-metric training pipeline.
//!
//! One call trains one survey metric end to end: filter valid
//! observations, split, standardize, select features, fit the candidate
//! panel, and elect a winner on held-out R². Failures stay contained:
//! a candidate that cannot fit is dropped with a warning, and a metric
//! without enough data is skipped rather than erroring.

use crate::engine::candidate::Candidate;
use crate::error::{PulsoError, Result};
use crate::metrics::{mae, mse, r_squared};
use crate::model_selection::{cross_validate, train_test_split, KFold};
use crate::preprocessing::{SelectKBest, StandardScaler};
use crate::primitives::{Matrix, Vector};
use crate::registry::{CandidateScore, ImportanceRecord, MetricModel};
use crate::traits::{Estimator, Transformer};
use std::collections::BTreeMap;
use std::fmt;

/// Minimum valid observations required before a metric trains.
pub const MIN_TRAINING_OBSERVATIONS: usize = 10;
/// Portion of valid observations held out for model election.
const HOLDOUT_FRACTION: f32 = 0.2;
/// Fixed seed for the train/held-out shuffle; keeps elections reproducible.
const SPLIT_SEED: u64 = 42;
/// Univariate selection keeps at most this many features.
const MAX_SELECTED_FEATURES: usize = 8;
/// Folds for the cross-validated R² estimate.
const CV_FOLDS: usize = 5;

/// Why a metric ended up without a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Fewer than [`MIN_TRAINING_OBSERVATIONS`] valid observations.
    InsufficientData {
        /// How many valid observations were found.
        valid: usize,
    },
    /// Every candidate in the panel failed to fit.
    NoCandidateFit,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::InsufficientData { valid } => write!(
                f,
                "insufficient data: {valid} valid observations, need {MIN_TRAINING_OBSERVATIONS}"
            ),
            SkipReason::NoCandidateFit => write!(f, "no candidate model could be fitted"),
        }
    }
}

/// Result of one metric's training run.
#[derive(Debug)]
pub enum TrainingOutcome {
    /// A winner was elected and is ready to register.
    Trained(Box<MetricModel>),
    /// No model was produced.
    Skipped(SkipReason),
}

/// Runs the full training pipeline for one metric.
///
/// Target values that are non-finite or not strictly positive are
/// treated as missing and dropped together with their feature rows.
/// The remaining pairs are split 80/20 with a fixed seed; the scaler
/// and the top-K univariate selector are fitted on the training subset
/// only. Every candidate in the panel is fitted, scored on the held-out
/// subset (R², MSE, MAE) and cross-validated on the training subset;
/// the candidate with the strictly highest held-out R² wins, ties going
/// to the earlier panel position.
///
/// # Errors
///
/// Returns an error only for malformed input (feature/target length
/// mismatch). Candidate failures and insufficient data are reported
/// through [`TrainingOutcome`], not as errors.
pub fn train_metric(
    metric: &str,
    features: &Matrix<f32>,
    targets: &Vector<f32>,
) -> Result<TrainingOutcome> {
    let (n_samples, n_features) = features.shape();
    if n_samples != targets.len() {
        return Err(PulsoError::dimension_mismatch(
            "samples",
            n_samples,
            targets.len(),
        ));
    }

    log::info!("Training models for {metric}");

    let valid: Vec<usize> = (0..n_samples)
        .filter(|&idx| {
            let target = targets[idx];
            target.is_finite() && target > 0.0
        })
        .collect();

    if valid.len() < MIN_TRAINING_OBSERVATIONS {
        log::warn!(
            "Insufficient data for {metric}: {} valid observations, need {MIN_TRAINING_OBSERVATIONS}",
            valid.len()
        );
        return Ok(TrainingOutcome::Skipped(SkipReason::InsufficientData {
            valid: valid.len(),
        }));
    }

    let (x_valid, y_valid) = take_rows(features, targets, &valid);
    let (x_train, x_test, y_train, y_test) =
        train_test_split(&x_valid, &y_valid, HOLDOUT_FRACTION, Some(SPLIT_SEED))?;

    let mut scaler = StandardScaler::new();
    let x_train_scaled = scaler.fit_transform(&x_train)?;
    let x_test_scaled = scaler.transform(&x_test)?;

    let mut selector = SelectKBest::new(MAX_SELECTED_FEATURES.min(n_features));
    let x_train_selected = selector.fit_transform(&x_train_scaled, &y_train)?;
    let x_test_selected = selector.transform(&x_test_scaled)?;

    let kfold = KFold::new(CV_FOLDS);
    let mut candidate_scores = BTreeMap::new();
    let mut best: Option<(Candidate, CandidateScore)> = None;

    for mut candidate in Candidate::panel() {
        let name = candidate.name();
        if let Err(e) = candidate.fit(&x_train_selected, &y_train) {
            log::warn!("Candidate {name} failed to fit for {metric}: {e}");
            continue;
        }

        let y_pred = candidate.predict(&x_test_selected);
        let cv = match cross_validate(&candidate, &x_train_selected, &y_train, &kfold) {
            Ok(cv) => cv,
            Err(e) => {
                log::warn!("Cross-validation failed for {name} on {metric}: {e}");
                continue;
            }
        };

        let score = CandidateScore {
            r2: r_squared(&y_pred, &y_test),
            mse: mse(&y_pred, &y_test),
            mae: mae(&y_pred, &y_test),
            cv_mean: cv.mean(),
            cv_std: cv.std(),
        };
        candidate_scores.insert(name.to_string(), score);

        // Strict comparison: a tie keeps the earlier panel candidate.
        let improves = best
            .as_ref()
            .map_or(true, |(_, incumbent)| score.r2 > incumbent.r2);
        if improves {
            best = Some((candidate, score));
        }
    }

    let Some((winner, performance)) = best else {
        log::warn!("No candidate model could be fitted for {metric}");
        return Ok(TrainingOutcome::Skipped(SkipReason::NoCandidateFit));
    };

    let importance = expand_importance(&winner.importance(), selector.support());
    log::info!(
        "Best model for {metric}: {} (R² = {:.3})",
        winner.name(),
        performance.r2
    );

    Ok(TrainingOutcome::Trained(Box::new(MetricModel {
        model: winner,
        scaler,
        selector,
        performance,
        candidate_scores,
        importance,
    })))
}

/// Gathers the rows and targets named by `indices` into new containers.
fn take_rows(x: &Matrix<f32>, y: &Vector<f32>, indices: &[usize]) -> (Matrix<f32>, Vector<f32>) {
    let n_features = x.shape().1;
    let mut data = Vec::with_capacity(indices.len() * n_features);
    let mut targets = Vec::with_capacity(indices.len());

    for &idx in indices {
        for col in 0..n_features {
            data.push(x.get(idx, col));
        }
        targets.push(y[idx]);
    }

    let x_subset = Matrix::from_vec(indices.len(), n_features, data)
        .expect("row subset dimensions are consistent by construction");
    (x_subset, Vector::from_vec(targets))
}

/// Zero-fills a reduced importance vector back into the full
/// feature-index space using the selector's support mask.
fn expand_importance(reduced: &[f32], support: &[bool]) -> ImportanceRecord {
    let mut weights = vec![0.0; support.len()];
    let mut cursor = 0;
    for (idx, &kept) in support.iter().enumerate() {
        if kept {
            weights[idx] = reduced[cursor];
            cursor += 1;
        }
    }
    ImportanceRecord::new(weights, support.to_vec())
}
