//! Persistent store for trained per-metric models.
//!
//! The registry owns everything inference needs: each metric's winning
//! candidate, its fitted scaler and selector, the per-candidate score
//! table, and the importance record. The whole structure round-trips
//! through one opaque bincode blob.

use crate::engine::Candidate;
use crate::error::{PulsoError, Result};
use crate::features::FEATURE_NAMES;
use crate::preprocessing::{SelectKBest, StandardScaler};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Held-out and cross-validated performance of one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// R² on the held-out subset.
    pub r2: f32,
    /// Mean squared error on the held-out subset.
    pub mse: f32,
    /// Mean absolute error on the held-out subset.
    pub mae: f32,
    /// Mean of the 5-fold cross-validated R² on the training subset.
    pub cv_mean: f32,
    /// Population standard deviation of the cross-validated R².
    pub cv_std: f32,
}

/// Feature importances of a winning model, mapped back into the full
/// feature-index space.
///
/// Indices dropped by feature selection carry zero weight; `selected`
/// records which indices survived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportanceRecord {
    weights: Vec<f32>,
    selected: Vec<bool>,
}

impl ImportanceRecord {
    /// Creates a record from aligned weight and selection vectors.
    ///
    /// # Panics
    ///
    /// Panics if the two vectors have different lengths.
    #[must_use]
    pub fn new(weights: Vec<f32>, selected: Vec<bool>) -> Self {
        assert_eq!(
            weights.len(),
            selected.len(),
            "importance weights and selection mask must align"
        );
        Self { weights, selected }
    }

    /// Importance weights, aligned to the full feature-index space.
    #[must_use]
    pub fn weights(&self) -> &[f32] {
        &self.weights
    }

    /// Selection mask: `true` at indices kept by feature selection.
    #[must_use]
    pub fn selected(&self) -> &[bool] {
        &self.selected
    }

    /// Indices of the strongest features, descending by weight. Keeps
    /// only weights strictly above `floor` and at most `limit` entries;
    /// ties rank the lower index first.
    #[must_use]
    pub fn top_ranked(&self, limit: usize, floor: f32) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.weights.len()).collect();
        order.sort_by(|&a, &b| self.weights[b].total_cmp(&self.weights[a]).then(a.cmp(&b)));
        order
            .into_iter()
            .filter(|&idx| self.weights[idx] > floor)
            .take(limit)
            .collect()
    }
}

/// Everything the engine stores for one trained metric.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricModel {
    /// Winning candidate, fully fitted.
    pub model: Candidate,
    /// Scaler fitted on the metric's training subset.
    pub scaler: StandardScaler,
    /// Univariate selector fitted on the metric's training subset.
    pub selector: SelectKBest,
    /// Performance of the winning candidate.
    pub performance: CandidateScore,
    /// Score table for every candidate that fitted successfully.
    pub candidate_scores: BTreeMap<String, CandidateScore>,
    /// Winner's importances in the full feature-index space.
    pub importance: ImportanceRecord,
}

impl MetricModel {
    /// Stable identifier of the winning candidate family.
    #[must_use]
    pub fn best_model_name(&self) -> &'static str {
        self.model.name()
    }
}

/// Registry of trained metric models, keyed by metric name.
///
/// Iteration is metric-name ascending, so summaries and persisted
/// artifacts are byte-stable across runs. `load` is all-or-nothing: on
/// any failure the registry keeps its prior state.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelRegistry {
    feature_names: Vec<String>,
    models: BTreeMap<String, MetricModel>,
}

impl ModelRegistry {
    /// Creates an empty registry bound to the canonical feature layout.
    #[must_use]
    pub fn new() -> Self {
        Self {
            feature_names: FEATURE_NAMES.iter().map(|name| (*name).to_string()).collect(),
            models: BTreeMap::new(),
        }
    }

    /// Stores (or replaces) the model for a metric.
    pub fn register(&mut self, metric: impl Into<String>, model: MetricModel) {
        self.models.insert(metric.into(), model);
    }

    /// Looks up the model for a metric.
    #[must_use]
    pub fn get(&self, metric: &str) -> Option<&MetricModel> {
        self.models.get(metric)
    }

    /// Trained metric names, ascending.
    pub fn metrics(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    /// All trained models, keyed by metric, ascending.
    pub fn models(&self) -> impl Iterator<Item = (&str, &MetricModel)> {
        self.models.iter().map(|(metric, model)| (metric.as_str(), model))
    }

    /// Number of trained metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Whether no metric has been trained yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Drops all trained models, keeping the feature layout.
    pub fn clear(&mut self) {
        self.models.clear();
    }

    /// Feature names this registry's models were trained against.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Serializes the full registry state to `path`.
    ///
    /// Writes to a sibling temporary file first and renames it into
    /// place, so a crash mid-write never leaves a torn artifact at the
    /// published path.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = bincode::serialize(self)
            .map_err(|e| PulsoError::Serialization(format!("Failed to serialize registry: {e}")))?;

        let tmp = sibling_temp_path(path);
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        log::info!(
            "Saved {} trained models to {}",
            self.models.len(),
            path.display()
        );
        Ok(())
    }

    /// Replaces the registry state with the artifact at `path`.
    ///
    /// The artifact's feature-name list must match the canonical layout
    /// in length and order. On any failure the registry keeps its prior
    /// state; a successful load never merges with it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the blob does not
    /// deserialize, or the feature layout disagrees with
    /// [`FEATURE_NAMES`].
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let loaded: ModelRegistry = bincode::deserialize(&bytes).map_err(|e| {
            PulsoError::Serialization(format!("Failed to deserialize registry: {e}"))
        })?;
        loaded.validate_layout()?;

        *self = loaded;
        log::info!(
            "Loaded {} trained models from {}",
            self.models.len(),
            path.display()
        );
        Ok(())
    }

    /// Checks the artifact's feature layout against the canonical one.
    fn validate_layout(&self) -> Result<()> {
        if self.feature_names.len() != FEATURE_NAMES.len() {
            return Err(PulsoError::registry_mismatch(format!(
                "artifact has {} features, expected {}",
                self.feature_names.len(),
                FEATURE_NAMES.len()
            )));
        }
        for (idx, (have, want)) in self.feature_names.iter().zip(FEATURE_NAMES).enumerate() {
            if have.as_str() != want {
                return Err(PulsoError::registry_mismatch(format!(
                    "artifact feature {idx} is {have:?}, expected {want:?}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// `models.bin` -> `models.bin.tmp`, in the same directory so the final
/// rename stays on one filesystem.
fn sibling_temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}
