//! Preprocessing transformers for standardization and feature selection.
//!
//! Every candidate model trains on standardized, top-k-selected features,
//! so both steps live here and are persisted alongside the fitted model.
//!
//! # Example
//!
//! ```
//! use pulso::prelude::*;
//! use pulso::preprocessing::StandardScaler;
//!
//! let data = Matrix::from_vec(4, 2, vec![
//!     1.0, 100.0,
//!     2.0, 200.0,
//!     3.0, 300.0,
//!     4.0, 400.0,
//! ]).unwrap();
//!
//! let mut scaler = StandardScaler::new();
//! let scaled = scaler.fit_transform(&data).unwrap();
//!
//! // Each column now has mean ~0
//! assert!(scaled.get(0, 0).abs() < 2.0);
//! ```

use crate::error::{PulsoError, Result};
use crate::primitives::{Matrix, Vector};
use crate::traits::Transformer;
use serde::{Deserialize, Serialize};

/// Standardizes features by removing mean and scaling to unit variance.
///
/// The standard score of a sample x is: z = (x - mean) / std
///
/// Statistics are computed on the training split only; the same mean and
/// std are then applied to held-out and live data.
///
/// # Example
///
/// ```
/// use pulso::prelude::*;
/// use pulso::preprocessing::StandardScaler;
///
/// let data = Matrix::from_vec(3, 2, vec![
///     0.0, 0.0,
///     1.0, 10.0,
///     2.0, 20.0,
/// ]).unwrap();
///
/// let mut scaler = StandardScaler::new();
/// let scaled = scaler.fit_transform(&data).unwrap();
///
/// let (n_rows, n_cols) = scaled.shape();
/// for j in 0..n_cols {
///     let mut sum = 0.0;
///     for i in 0..n_rows {
///         sum += scaled.get(i, j);
///     }
///     assert!((sum / n_rows as f32).abs() < 1e-5, "Mean should be ~0");
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Mean of each feature (computed during fit).
    mean: Option<Vec<f32>>,
    /// Standard deviation of each feature (computed during fit).
    std: Option<Vec<f32>>,
    /// Whether to center the data (subtract mean).
    with_mean: bool,
    /// Whether to scale the data (divide by std).
    with_std: bool,
}

impl Default for StandardScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl StandardScaler {
    /// Creates a new `StandardScaler` with both centering and scaling enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mean: None,
            std: None,
            with_mean: true,
            with_std: true,
        }
    }

    /// Sets whether to center the data by subtracting the mean.
    #[must_use]
    pub fn with_mean(mut self, with_mean: bool) -> Self {
        self.with_mean = with_mean;
        self
    }

    /// Sets whether to scale the data by dividing by standard deviation.
    #[must_use]
    pub fn with_std(mut self, with_std: bool) -> Self {
        self.with_std = with_std;
        self
    }

    /// Returns the mean of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn mean(&self) -> &[f32] {
        self.mean
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns the standard deviation of each feature.
    ///
    /// # Panics
    ///
    /// Panics if the scaler is not fitted.
    #[must_use]
    pub fn std(&self) -> &[f32] {
        self.std
            .as_ref()
            .expect("Scaler not fitted. Call fit() first.")
    }

    /// Returns true if the scaler has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.mean.is_some()
    }
}

impl Transformer for StandardScaler {
    /// Computes the mean and standard deviation of each feature.
    fn fit(&mut self, x: &Matrix<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        let mut mean = vec![0.0; n_features];
        for (j, mean_j) in mean.iter_mut().enumerate() {
            let mut sum = 0.0;
            for i in 0..n_samples {
                sum += x.get(i, j);
            }
            *mean_j = sum / n_samples as f32;
        }

        let mut std = vec![0.0; n_features];
        for (j, std_j) in std.iter_mut().enumerate() {
            let mut sum_sq = 0.0;
            for i in 0..n_samples {
                let diff = x.get(i, j) - mean[j];
                sum_sq += diff * diff;
            }
            // Population std (divide by n, not n-1) like sklearn
            *std_j = (sum_sq / n_samples as f32).sqrt();
        }

        self.mean = Some(mean);
        self.std = Some(std);

        Ok(())
    }

    /// Standardizes the data using fitted mean and std.
    ///
    /// Near-constant features (std below 1e-10) are centered but not
    /// divided, avoiding blowup on degenerate columns.
    fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let mean = self
            .mean
            .as_ref()
            .ok_or_else(|| PulsoError::from("Scaler not fitted"))?;
        let std = self
            .std
            .as_ref()
            .ok_or_else(|| PulsoError::from("Scaler not fitted"))?;

        let (n_samples, n_features) = x.shape();
        if n_features != mean.len() {
            return Err(PulsoError::dimension_mismatch(
                "features",
                mean.len(),
                n_features,
            ));
        }

        let mut result = vec![0.0; n_samples * n_features];

        for i in 0..n_samples {
            for j in 0..n_features {
                let mut val = x.get(i, j);

                if self.with_mean {
                    val -= mean[j];
                }

                if self.with_std && std[j] > 1e-10 {
                    val /= std[j];
                }

                result[i * n_features + j] = val;
            }
        }

        Matrix::from_vec(n_samples, n_features, result)
    }
}

/// Computes univariate F-statistics between each feature and the target.
///
/// For feature j with Pearson correlation r to the target:
/// F = r² / (1 - r²) * (n - 2)
///
/// Degenerate cases score deterministically:
/// - fewer than 3 samples: 0.0 for every feature
/// - zero-variance feature or target: 0.0
/// - perfect correlation (r² >= 1): infinity
#[must_use]
pub fn f_regression(x: &Matrix<f32>, y: &Vector<f32>) -> Vec<f32> {
    let (n_samples, n_features) = x.shape();

    if n_samples <= 2 {
        return vec![0.0; n_features];
    }

    let n = n_samples as f32;
    let y_mean = y.mean();
    let y_var: f32 = y.as_slice().iter().map(|v| (v - y_mean).powi(2)).sum();

    let mut scores = Vec::with_capacity(n_features);

    for j in 0..n_features {
        let mut x_sum = 0.0;
        for i in 0..n_samples {
            x_sum += x.get(i, j);
        }
        let x_mean = x_sum / n;

        let mut x_var = 0.0;
        let mut cov = 0.0;
        for i in 0..n_samples {
            let dx = x.get(i, j) - x_mean;
            x_var += dx * dx;
            cov += dx * (y.as_slice()[i] - y_mean);
        }

        if x_var <= 0.0 || y_var <= 0.0 {
            scores.push(0.0);
            continue;
        }

        let r2 = (cov * cov) / (x_var * y_var);
        if r2 >= 1.0 {
            scores.push(f32::INFINITY);
        } else {
            scores.push(r2 / (1.0 - r2) * (n - 2.0));
        }
    }

    scores
}

/// Selects the k features with the highest `f_regression` scores.
///
/// Selected columns keep their original left-to-right order, so downstream
/// coefficients line up with the support mask. Ties on score break toward
/// the lower feature index.
///
/// # Example
///
/// ```
/// use pulso::preprocessing::SelectKBest;
/// use pulso::primitives::{Matrix, Vector};
///
/// // Column 0 tracks the target, column 1 is constant
/// let x = Matrix::from_vec(4, 2, vec![
///     1.0, 7.0,
///     2.0, 7.0,
///     3.0, 7.0,
///     4.0, 7.0,
/// ]).unwrap();
/// let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);
///
/// let mut selector = SelectKBest::new(1);
/// let reduced = selector.fit_transform(&x, &y).unwrap();
/// assert_eq!(reduced.shape(), (4, 1));
/// assert_eq!(selector.support(), &[true, false]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectKBest {
    /// Number of features to keep.
    k: usize,
    /// F-score per feature (computed during fit).
    scores: Option<Vec<f32>>,
    /// Selection mask per feature (computed during fit).
    support: Option<Vec<bool>>,
}

impl SelectKBest {
    /// Creates a selector keeping the top `k` features.
    #[must_use]
    pub fn new(k: usize) -> Self {
        Self {
            k,
            scores: None,
            support: None,
        }
    }

    /// Returns the number of features this selector keeps.
    #[must_use]
    pub fn k(&self) -> usize {
        self.k
    }

    /// Returns the per-feature F-scores.
    ///
    /// # Panics
    ///
    /// Panics if the selector is not fitted.
    #[must_use]
    pub fn scores(&self) -> &[f32] {
        self.scores
            .as_ref()
            .expect("Selector not fitted. Call fit() first.")
    }

    /// Returns the boolean selection mask over the original features.
    ///
    /// # Panics
    ///
    /// Panics if the selector is not fitted.
    #[must_use]
    pub fn support(&self) -> &[bool] {
        self.support
            .as_ref()
            .expect("Selector not fitted. Call fit() first.")
    }

    /// Returns true if the selector has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.support.is_some()
    }

    /// Scores every feature against the target and records the top-k mask.
    ///
    /// # Errors
    ///
    /// Returns an error if k is zero or exceeds the feature count, or if
    /// x and y disagree on sample count.
    pub fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if self.k == 0 || self.k > n_features {
            return Err(PulsoError::InvalidHyperparameter {
                param: "k".to_string(),
                value: format!("{}", self.k),
                constraint: format!("1 <= k <= {n_features} (feature count)"),
            });
        }
        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }

        let scores = f_regression(x, y);

        // Rank by score descending, ties toward the lower index
        let mut order: Vec<usize> = (0..n_features).collect();
        order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

        let mut support = vec![false; n_features];
        for &idx in order.iter().take(self.k) {
            support[idx] = true;
        }

        self.scores = Some(scores);
        self.support = Some(support);

        Ok(())
    }

    /// Drops unselected columns, preserving original column order.
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is not fitted or the feature
    /// count differs from fit time.
    pub fn transform(&self, x: &Matrix<f32>) -> Result<Matrix<f32>> {
        let support = self
            .support
            .as_ref()
            .ok_or_else(|| PulsoError::from("Selector not fitted"))?;

        let (n_samples, n_features) = x.shape();
        if n_features != support.len() {
            return Err(PulsoError::dimension_mismatch(
                "features",
                support.len(),
                n_features,
            ));
        }

        let kept: Vec<usize> = (0..n_features).filter(|&j| support[j]).collect();
        let mut data = Vec::with_capacity(n_samples * kept.len());
        for i in 0..n_samples {
            for &j in &kept {
                data.push(x.get(i, j));
            }
        }

        Matrix::from_vec(n_samples, kept.len(), data)
    }

    /// Fits and transforms in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if fitting fails.
    pub fn fit_transform(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<Matrix<f32>> {
        self.fit(x, y)?;
        self.transform(x)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_matrix() -> Matrix<f32> {
        Matrix::from_vec(
            4,
            2,
            vec![1.0, 100.0, 2.0, 200.0, 3.0, 300.0, 4.0, 400.0],
        )
        .expect("test data has correct dimensions")
    }

    #[test]
    fn test_scaler_fit_computes_mean_and_std() {
        let x = sample_matrix();
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).expect("fit should succeed");

        let mean = scaler.mean();
        assert!((mean[0] - 2.5).abs() < 1e-6);
        assert!((mean[1] - 250.0).abs() < 1e-6);

        // Population std of [1,2,3,4] = sqrt(1.25)
        let std = scaler.std();
        assert!((std[0] - 1.25_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_scaler_transform_standardizes() {
        let x = sample_matrix();
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).expect("fit_transform should succeed");

        // Column means ~0 after centering
        for j in 0..2 {
            let sum: f32 = (0..4).map(|i| scaled.get(i, j)).sum();
            assert!((sum / 4.0).abs() < 1e-5);
        }

        // Column variance ~1 after scaling
        for j in 0..2 {
            let var: f32 = (0..4).map(|i| scaled.get(i, j).powi(2)).sum::<f32>() / 4.0;
            assert!((var - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_scaler_constant_column_not_divided() {
        let x = Matrix::from_vec(3, 1, vec![5.0, 5.0, 5.0])
            .expect("test data has correct dimensions");
        let mut scaler = StandardScaler::new();
        let scaled = scaler.fit_transform(&x).expect("fit_transform should succeed");

        // Centered to zero, no division by the zero std
        for i in 0..3 {
            assert!(scaled.get(i, 0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_scaler_without_mean() {
        let x = sample_matrix();
        let mut scaler = StandardScaler::new().with_mean(false);
        let scaled = scaler.fit_transform(&x).expect("fit_transform should succeed");

        // Values divided by std but not centered, so all positive
        for i in 0..4 {
            assert!(scaled.get(i, 0) > 0.0);
        }
    }

    #[test]
    fn test_scaler_transform_unfitted_errors() {
        let x = sample_matrix();
        let scaler = StandardScaler::new();
        assert!(scaler.transform(&x).is_err());
    }

    #[test]
    fn test_scaler_transform_dimension_mismatch() {
        let x = sample_matrix();
        let mut scaler = StandardScaler::new();
        scaler.fit(&x).expect("fit should succeed");

        let wrong = Matrix::from_vec(2, 3, vec![1.0; 6])
            .expect("test data has correct dimensions");
        assert!(scaler.transform(&wrong).is_err());
    }

    #[test]
    fn test_scaler_fit_empty_errors() {
        let x = Matrix::from_vec(0, 2, vec![]).expect("test data has correct dimensions");
        let mut scaler = StandardScaler::new();
        assert!(scaler.fit(&x).is_err());
    }

    #[test]
    fn test_scaler_is_fitted() {
        let mut scaler = StandardScaler::new();
        assert!(!scaler.is_fitted());
        scaler.fit(&sample_matrix()).expect("fit should succeed");
        assert!(scaler.is_fitted());
    }

    #[test]
    fn test_f_regression_perfect_correlation_is_infinite() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0])
            .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);

        let scores = f_regression(&x, &y);
        assert!(scores[0].is_infinite());
    }

    #[test]
    fn test_f_regression_known_value() {
        // corr([1,2,3,4], [1,3,2,4]) = 0.8, so F = 0.64/0.36 * 2
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0])
            .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 3.0, 2.0, 4.0]);

        let scores = f_regression(&x, &y);
        assert!((scores[0] - 0.64 / 0.36 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_f_regression_constant_feature_scores_zero() {
        let x = Matrix::from_vec(4, 1, vec![5.0, 5.0, 5.0, 5.0])
            .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let scores = f_regression(&x, &y);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_f_regression_constant_target_scores_zero() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0])
            .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[3.0, 3.0, 3.0, 3.0]);

        let scores = f_regression(&x, &y);
        assert_eq!(scores[0], 0.0);
    }

    #[test]
    fn test_f_regression_too_few_samples() {
        let x = Matrix::from_vec(2, 2, vec![1.0, 5.0, 2.0, 6.0])
            .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0]);

        assert_eq!(f_regression(&x, &y), vec![0.0, 0.0]);
    }

    #[test]
    fn test_select_k_best_picks_strongest_features() {
        // Column 0: perfect, column 1: constant, column 2: partial
        let x = Matrix::from_vec(
            4,
            3,
            vec![
                1.0, 7.0, 1.0, //
                2.0, 7.0, 3.0, //
                3.0, 7.0, 2.0, //
                4.0, 7.0, 4.0, //
            ],
        )
        .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(2);
        let reduced = selector.fit_transform(&x, &y).expect("fit should succeed");

        assert_eq!(reduced.shape(), (4, 2));
        assert_eq!(selector.support(), &[true, false, true]);

        // Original column order preserved: column 0 first, then column 2
        assert!((reduced.get(0, 0) - 1.0).abs() < 1e-6);
        assert!((reduced.get(0, 1) - 1.0).abs() < 1e-6);
        assert!((reduced.get(1, 1) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_select_k_best_tie_breaks_toward_lower_index() {
        // Two identical constant columns tie at 0.0; the lower index wins
        let x = Matrix::from_vec(
            4,
            3,
            vec![
                7.0, 7.0, 1.0, //
                7.0, 7.0, 2.0, //
                7.0, 7.0, 3.0, //
                7.0, 7.0, 4.0, //
            ],
        )
        .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(2);
        selector.fit(&x, &y).expect("fit should succeed");

        assert_eq!(selector.support(), &[true, false, true]);
    }

    #[test]
    fn test_select_k_best_k_too_large_errors() {
        let x = Matrix::from_vec(4, 2, vec![1.0; 8]).expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(3);
        let result = selector.fit(&x, &y);
        assert!(matches!(
            result,
            Err(PulsoError::InvalidHyperparameter { .. })
        ));
    }

    #[test]
    fn test_select_k_best_k_zero_errors() {
        let x = Matrix::from_vec(4, 2, vec![1.0; 8]).expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(0);
        assert!(selector.fit(&x, &y).is_err());
    }

    #[test]
    fn test_select_k_best_transform_unfitted_errors() {
        let x = Matrix::from_vec(4, 2, vec![1.0; 8]).expect("test data has correct dimensions");
        let selector = SelectKBest::new(1);
        assert!(selector.transform(&x).is_err());
    }

    #[test]
    fn test_select_k_best_transform_dimension_mismatch() {
        let x = Matrix::from_vec(
            4,
            2,
            vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0, 4.0, 8.0],
        )
        .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(1);
        selector.fit(&x, &y).expect("fit should succeed");

        let wrong = Matrix::from_vec(2, 3, vec![1.0; 6])
            .expect("test data has correct dimensions");
        assert!(selector.transform(&wrong).is_err());
    }

    #[test]
    fn test_select_k_best_keep_all_features() {
        let x = Matrix::from_vec(
            4,
            2,
            vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0, 4.0, 8.0],
        )
        .expect("test data has correct dimensions");
        let y = Vector::from_slice(&[1.0, 2.0, 3.0, 4.0]);

        let mut selector = SelectKBest::new(2);
        let reduced = selector.fit_transform(&x, &y).expect("fit should succeed");
        assert_eq!(reduced.shape(), (4, 2));
        assert_eq!(selector.support(), &[true, true]);
    }
}
