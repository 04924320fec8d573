//! Linear models for regression.
//!
//! Four of the six candidate families are linear: Ordinary Least Squares,
//! Ridge (L2), Lasso (L1), and Elastic Net (L1+L2). The regularized
//! variants share one coordinate descent routine.

use crate::error::{PulsoError, Result};
use crate::metrics::r_squared;
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use serde::{Deserialize, Serialize};

/// Ordinary Least Squares (OLS) linear regression.
///
/// Fits a linear model by minimizing the residual sum of squares between
/// observed targets and predicted targets. The model equation is:
///
/// ```text
/// y = X β + ε
/// ```
///
/// where `β` is the coefficient vector and `ε` is random error.
///
/// # Solver
///
/// Uses normal equations: `β = (X^T X)^-1 X^T y` via Cholesky decomposition.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
///
/// // Simple linear regression: y = 2x + 1
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
///
/// let mut model = LinearRegression::new();
/// model.fit(&x, &y).unwrap();
///
/// let r2 = model.score(&x, &y);
/// assert!(r2 > 0.99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term.
    intercept: f32,
    /// Whether to fit an intercept.
    fit_intercept: bool,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    /// Creates a new `LinearRegression` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    /// Sets whether to fit an intercept term.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Returns the coefficients (excluding intercept).
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn coefficients(&self) -> &Vector<f32> {
        self.coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }

    /// Adds an intercept column of ones to the design matrix.
    fn add_intercept_column(x: &Matrix<f32>) -> Matrix<f32> {
        let (n_rows, n_cols) = x.shape();
        let mut data = Vec::with_capacity(n_rows * (n_cols + 1));

        for i in 0..n_rows {
            data.push(1.0); // Intercept column
            for j in 0..n_cols {
                data.push(x.get(i, j));
            }
        }

        Matrix::from_vec(n_rows, n_cols + 1, data)
            .expect("design matrix dimensions are consistent by construction")
    }
}

impl Estimator for LinearRegression {
    /// Fits the linear regression model using normal equations.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Input dimensions don't match
    /// - Not enough samples for the number of features (underdetermined system)
    /// - Matrix is singular (not positive definite)
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }

        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        // Underdetermined check: fitting an intercept costs one extra parameter
        let required_samples = if self.fit_intercept {
            n_features + 1
        } else {
            n_features
        };

        if n_samples < required_samples {
            return Err(PulsoError::Other(format!(
                "Insufficient samples: LinearRegression needs at least {required_samples} \
                 samples for {n_features} features, got {n_samples}. Consider Ridge \
                 regression or more training data"
            )));
        }

        let x_design = if self.fit_intercept {
            Self::add_intercept_column(x)
        } else {
            x.clone()
        };

        // Normal equations: β = (X^T X)^-1 X^T y
        let xt = x_design.transpose();
        let xtx = xt.matmul(&x_design)?;
        let xty = xt.matvec(y)?;
        let beta = xtx.cholesky_solve(&xty)?;

        if self.fit_intercept {
            self.intercept = beta[0];
            self.coefficients = Some(beta.slice(1, n_features + 1));
        } else {
            self.intercept = 0.0;
            self.coefficients = Some(beta);
        }

        Ok(())
    }

    /// Predicts target values for input data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let coefficients = self
            .coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.");

        let result = x
            .matvec(coefficients)
            .expect("Matrix dimensions don't match coefficients");

        result.add_scalar(self.intercept)
    }

    /// Computes the R² score.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

/// Ridge regression with L2 regularization.
///
/// Shrinks coefficients toward zero without making them exactly zero.
/// The optimization objective is:
///
/// ```text
/// minimize ||y - Xβ||² + α||β||²
/// ```
///
/// # Solver
///
/// Regularized normal equations: `β = (X^T X + αI)^-1 X^T y`. The
/// intercept term is never penalized.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::linear_model::Ridge;
///
/// let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);
///
/// let mut model = Ridge::new(1.0);
/// model.fit(&x, &y).unwrap();
/// assert!(model.score(&x, &y) > 0.9);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ridge {
    /// Regularization strength.
    alpha: f32,
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term.
    intercept: f32,
    /// Whether to fit an intercept.
    fit_intercept: bool,
}

impl Ridge {
    /// Creates a new `Ridge` regression with the given regularization strength.
    ///
    /// # Arguments
    ///
    /// * `alpha` - Regularization strength. Larger values = more regularization.
    ///   Use 0.0 for no regularization (equivalent to OLS).
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
        }
    }

    /// Sets whether to fit an intercept term.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Returns the regularization strength (alpha).
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns the coefficients (excluding intercept).
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn coefficients(&self) -> &Vector<f32> {
        self.coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Estimator for Ridge {
    /// Fits the Ridge regression model using regularized normal equations.
    ///
    /// # Errors
    ///
    /// Returns an error if input dimensions don't match or the system is
    /// singular.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let (n_samples, n_features) = x.shape();

        if n_samples != y.len() {
            return Err(PulsoError::dimension_mismatch(
                "samples",
                n_samples,
                y.len(),
            ));
        }

        if n_samples == 0 {
            return Err("Cannot fit with zero samples".into());
        }

        let x_design = if self.fit_intercept {
            LinearRegression::add_intercept_column(x)
        } else {
            x.clone()
        };

        let n_params = if self.fit_intercept {
            n_features + 1
        } else {
            n_features
        };

        let xt = x_design.transpose();
        let mut xtx = xt.matmul(&x_design)?;

        // Add αI to the diagonal, never penalizing the intercept column
        for i in 0..n_params {
            if self.fit_intercept && i == 0 {
                continue;
            }
            let current = xtx.get(i, i);
            xtx.set(i, i, current + self.alpha);
        }

        let xty = xt.matvec(y)?;
        let beta = xtx.cholesky_solve(&xty)?;

        if self.fit_intercept {
            self.intercept = beta[0];
            self.coefficients = Some(beta.slice(1, n_features + 1));
        } else {
            self.intercept = 0.0;
            self.coefficients = Some(beta);
        }

        Ok(())
    }

    /// Predicts target values for input data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let coefficients = self
            .coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.");

        let result = x
            .matvec(coefficients)
            .expect("Matrix dimensions don't match coefficients");

        result.add_scalar(self.intercept)
    }

    /// Computes the R² score.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

/// Soft-thresholding operator used by the coordinate descent solvers.
///
/// Shrinks `x` toward zero by `lambda`, clamping to exactly zero inside
/// the threshold. This is what produces sparse Lasso solutions.
fn soft_threshold(x: f32, lambda: f32) -> f32 {
    if x > lambda {
        x - lambda
    } else if x < -lambda {
        x + lambda
    } else {
        0.0
    }
}

/// Result of a coordinate descent run.
struct CoordinateDescentFit {
    coefficients: Vec<f32>,
    intercept: f32,
}

/// Coordinate descent for L1/L2-penalized least squares.
///
/// Cycles through features updating one coefficient at a time via
/// soft-thresholding, on mean-centered data when an intercept is fitted.
/// Near-constant columns (squared norm below 1e-10) keep a zero
/// coefficient. Stops when the largest per-sweep coefficient change falls
/// below `tol` or after `max_iter` sweeps.
fn coordinate_descent(
    x: &Matrix<f32>,
    y: &Vector<f32>,
    l1_penalty: f32,
    l2_penalty: f32,
    fit_intercept: bool,
    max_iter: usize,
    tol: f32,
) -> Result<CoordinateDescentFit> {
    let (n_samples, n_features) = x.shape();

    if n_samples != y.len() {
        return Err(PulsoError::dimension_mismatch(
            "samples",
            n_samples,
            y.len(),
        ));
    }

    if n_samples == 0 {
        return Err("Cannot fit with zero samples".into());
    }

    // Center data when fitting an intercept
    let mut x_mean = vec![0.0; n_features];
    let mut y_mean = 0.0;
    if fit_intercept {
        for i in 0..n_samples {
            for (j, mean_j) in x_mean.iter_mut().enumerate() {
                *mean_j += x.get(i, j);
            }
            y_mean += y[i];
        }
        for mean in &mut x_mean {
            *mean /= n_samples as f32;
        }
        y_mean /= n_samples as f32;
    }

    let mut x_centered = vec![0.0; n_samples * n_features];
    let mut y_centered = vec![0.0; n_samples];
    for i in 0..n_samples {
        for j in 0..n_features {
            x_centered[i * n_features + j] = x.get(i, j) - x_mean[j];
        }
        y_centered[i] = y[i] - y_mean;
    }

    // Precompute column norms squared
    let mut col_norms_sq = vec![0.0; n_features];
    for (j, norm_sq) in col_norms_sq.iter_mut().enumerate() {
        for i in 0..n_samples {
            let val = x_centered[i * n_features + j];
            *norm_sq += val * val;
        }
    }

    let mut beta = vec![0.0; n_features];

    for _ in 0..max_iter {
        let mut max_change = 0.0f32;

        for j in 0..n_features {
            if col_norms_sq[j] < 1e-10 {
                continue;
            }

            // Correlation of feature j with the residual excluding j
            let mut rho = 0.0;
            for i in 0..n_samples {
                let mut pred = 0.0;
                for (k, &beta_k) in beta.iter().enumerate() {
                    if k != j {
                        pred += x_centered[i * n_features + k] * beta_k;
                    }
                }
                let residual = y_centered[i] - pred;
                rho += x_centered[i * n_features + j] * residual;
            }

            let old_beta = beta[j];
            let denom = col_norms_sq[j] + l2_penalty;
            beta[j] = soft_threshold(rho, l1_penalty) / denom;

            let change = (beta[j] - old_beta).abs();
            if change > max_change {
                max_change = change;
            }
        }

        if max_change < tol {
            break;
        }
    }

    let intercept = if fit_intercept {
        let mut intercept = y_mean;
        for j in 0..n_features {
            intercept -= beta[j] * x_mean[j];
        }
        intercept
    } else {
        0.0
    };

    Ok(CoordinateDescentFit {
        coefficients: beta,
        intercept,
    })
}

/// Lasso regression with L1 regularization.
///
/// Fits a linear model with an L1 penalty on coefficient magnitudes.
/// The optimization objective is:
///
/// ```text
/// minimize ||y - Xβ||² + α||β||₁
/// ```
///
/// L1 regularization drives irrelevant coefficients to exactly zero,
/// giving automatic feature selection.
///
/// # Solver
///
/// Coordinate descent with soft-thresholding.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::linear_model::Lasso;
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);
///
/// let mut model = Lasso::new(0.1);
/// model.fit(&x, &y).unwrap();
/// assert!(model.score(&x, &y) > 0.99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lasso {
    /// Regularization strength.
    alpha: f32,
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term.
    intercept: f32,
    /// Whether to fit an intercept.
    fit_intercept: bool,
    /// Maximum number of coordinate descent sweeps.
    max_iter: usize,
    /// Convergence tolerance on the largest coefficient change.
    tol: f32,
}

impl Lasso {
    /// Creates a new `Lasso` regression with the given regularization strength.
    #[must_use]
    pub fn new(alpha: f32) -> Self {
        Self {
            alpha,
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Sets whether to fit an intercept term.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Sets the maximum number of coordinate descent sweeps.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Returns the regularization strength (alpha).
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns the coefficients (excluding intercept).
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn coefficients(&self) -> &Vector<f32> {
        self.coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Estimator for Lasso {
    /// Fits the Lasso model using coordinate descent.
    ///
    /// # Errors
    ///
    /// Returns an error if input dimensions don't match.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let fit = coordinate_descent(
            x,
            y,
            self.alpha,
            0.0,
            self.fit_intercept,
            self.max_iter,
            self.tol,
        )?;

        self.coefficients = Some(Vector::from_vec(fit.coefficients));
        self.intercept = fit.intercept;
        Ok(())
    }

    /// Predicts target values for input data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let coefficients = self
            .coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.");

        let result = x
            .matvec(coefficients)
            .expect("Matrix dimensions don't match coefficients");

        result.add_scalar(self.intercept)
    }

    /// Computes the R² score.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

/// Elastic Net regression combining L1 and L2 regularization.
///
/// The optimization objective is:
///
/// ```text
/// minimize ||y - Xβ||² + α·l1_ratio·||β||₁ + α·(1-l1_ratio)·||β||²
/// ```
///
/// `l1_ratio` = 1.0 recovers Lasso, `l1_ratio` = 0.0 approaches Ridge.
///
/// # Solver
///
/// Coordinate descent with soft-thresholding and L2 shrinkage.
///
/// # Examples
///
/// ```
/// use pulso::prelude::*;
/// use pulso::linear_model::ElasticNet;
///
/// let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);
///
/// let mut model = ElasticNet::new(0.1, 0.5);
/// model.fit(&x, &y).unwrap();
/// assert!(model.score(&x, &y) > 0.99);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElasticNet {
    /// Overall regularization strength.
    alpha: f32,
    /// Mix between L1 (1.0) and L2 (0.0) penalties.
    l1_ratio: f32,
    /// Coefficients for features (excluding intercept).
    coefficients: Option<Vector<f32>>,
    /// Intercept (bias) term.
    intercept: f32,
    /// Whether to fit an intercept.
    fit_intercept: bool,
    /// Maximum number of coordinate descent sweeps.
    max_iter: usize,
    /// Convergence tolerance on the largest coefficient change.
    tol: f32,
}

impl ElasticNet {
    /// Creates a new `ElasticNet` with the given strength and L1/L2 mix.
    ///
    /// `l1_ratio` is clamped to [0, 1].
    #[must_use]
    pub fn new(alpha: f32, l1_ratio: f32) -> Self {
        Self {
            alpha,
            l1_ratio: l1_ratio.clamp(0.0, 1.0),
            coefficients: None,
            intercept: 0.0,
            fit_intercept: true,
            max_iter: 1000,
            tol: 1e-4,
        }
    }

    /// Sets whether to fit an intercept term.
    #[must_use]
    pub fn with_intercept(mut self, fit_intercept: bool) -> Self {
        self.fit_intercept = fit_intercept;
        self
    }

    /// Sets the maximum number of coordinate descent sweeps.
    #[must_use]
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Sets the convergence tolerance.
    #[must_use]
    pub fn with_tol(mut self, tol: f32) -> Self {
        self.tol = tol;
        self
    }

    /// Returns the regularization strength (alpha).
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Returns the L1 mixing parameter.
    #[must_use]
    pub fn l1_ratio(&self) -> f32 {
        self.l1_ratio
    }

    /// Returns the coefficients (excluding intercept).
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    #[must_use]
    pub fn coefficients(&self) -> &Vector<f32> {
        self.coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.")
    }

    /// Returns the intercept term.
    #[must_use]
    pub fn intercept(&self) -> f32 {
        self.intercept
    }

    /// Returns true if the model has been fitted.
    #[must_use]
    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}

impl Estimator for ElasticNet {
    /// Fits the Elastic Net model using coordinate descent.
    ///
    /// # Errors
    ///
    /// Returns an error if input dimensions don't match.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        let l1_penalty = self.alpha * self.l1_ratio;
        let l2_penalty = self.alpha * (1.0 - self.l1_ratio);

        let fit = coordinate_descent(
            x,
            y,
            l1_penalty,
            l2_penalty,
            self.fit_intercept,
            self.max_iter,
            self.tol,
        )?;

        self.coefficients = Some(Vector::from_vec(fit.coefficients));
        self.intercept = fit.intercept;
        Ok(())
    }

    /// Predicts target values for input data.
    ///
    /// # Panics
    ///
    /// Panics if model is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        let coefficients = self
            .coefficients
            .as_ref()
            .expect("Model not fitted. Call fit() first.");

        let result = x
            .matvec(coefficients)
            .expect("Matrix dimensions don't match coefficients");

        result.add_scalar(self.intercept)
    }

    /// Computes the R² score.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        let y_pred = self.predict(x);
        r_squared(&y_pred, y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_regression_new() {
        let model = LinearRegression::new();
        assert!(!model.is_fitted());
        assert!(model.fit_intercept);
    }

    #[test]
    fn test_linear_regression_simple() {
        // y = 2x + 1
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        assert!(model.is_fitted());

        let coef = model.coefficients();
        assert!((coef[0] - 2.0).abs() < 1e-4);
        assert!((model.intercept() - 1.0).abs() < 1e-4);

        let predictions = model.predict(&x);
        for i in 0..4 {
            assert!((predictions[i] - y[i]).abs() < 1e-4);
        }

        let r2 = model.score(&x, &y);
        assert!((r2 - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_regression_multivariate() {
        // y = 1 + 2*x1 + 3*x2
        let x = Matrix::from_vec(4, 2, vec![1.0, 1.0, 2.0, 1.0, 1.0, 2.0, 2.0, 2.0]).unwrap();
        let y = Vector::from_slice(&[6.0, 8.0, 9.0, 11.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients();
        assert!((coef[0] - 2.0).abs() < 1e-4);
        assert!((coef[1] - 3.0).abs() < 1e-4);
        assert!((model.intercept() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_regression_no_intercept() {
        // y = 2x (no intercept)
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);

        let mut model = LinearRegression::new().with_intercept(false);
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients();
        assert!((coef[0] - 2.0).abs() < 1e-4);
        assert!((model.intercept() - 0.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_regression_predict_new_data() {
        // y = x + 1
        let x_train = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y_train = Vector::from_slice(&[2.0, 3.0, 4.0]);

        let mut model = LinearRegression::new();
        model.fit(&x_train, &y_train).unwrap();

        let x_test = Matrix::from_vec(2, 1, vec![4.0, 5.0]).unwrap();
        let predictions = model.predict(&x_test);

        assert!((predictions[0] - 5.0).abs() < 1e-4);
        assert!((predictions[1] - 6.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_regression_dimension_mismatch() {
        let x = Matrix::from_vec(3, 2, vec![1.0; 6]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0]); // Wrong length

        let mut model = LinearRegression::new();
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_linear_regression_underdetermined() {
        // 3 samples, 5 features: needs 6 parameters with intercept
        let x = Matrix::from_vec(
            3,
            5,
            vec![
                1.0, 2.0, 3.0, 4.0, 5.0, 2.0, 3.0, 4.0, 5.0, 6.0, 3.0, 4.0, 5.0, 6.0, 7.0,
            ],
        )
        .unwrap();
        let y = Vector::from_vec(vec![10.0, 20.0, 30.0]);

        let mut model = LinearRegression::new();
        let result = model.fit(&x, &y);

        assert!(result.is_err());
        let error_msg = result.unwrap_err().to_string();
        assert!(
            error_msg.contains("samples"),
            "Error message should mention samples: {error_msg}"
        );
    }

    #[test]
    fn test_linear_regression_exactly_determined() {
        // 4 samples, 3 features: exactly 4 parameters with intercept
        let x = Matrix::from_vec(
            4,
            3,
            vec![1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0],
        )
        .unwrap();
        let y = Vector::from_vec(vec![1.0, 2.0, 3.0, 6.0]);

        let mut model = LinearRegression::new();
        assert!(model.fit(&x, &y).is_ok());
    }

    #[test]
    fn test_linear_regression_constant_target() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[5.0, 5.0, 5.0]);

        let mut model = LinearRegression::new();
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients();
        assert!(coef[0].abs() < 1e-4);
        assert!((model.intercept() - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_ridge_zero_alpha_matches_ols() {
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut ols = LinearRegression::new();
        ols.fit(&x, &y).unwrap();

        let mut ridge = Ridge::new(0.0);
        ridge.fit(&x, &y).unwrap();

        assert!((ols.coefficients()[0] - ridge.coefficients()[0]).abs() < 1e-4);
        assert!((ols.intercept() - ridge.intercept()).abs() < 1e-4);
    }

    #[test]
    fn test_ridge_shrinks_coefficients() {
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut weak = Ridge::new(0.1);
        weak.fit(&x, &y).unwrap();

        let mut strong = Ridge::new(10.0);
        strong.fit(&x, &y).unwrap();

        assert!(strong.coefficients()[0].abs() < weak.coefficients()[0].abs());
        assert!((weak.coefficients()[0] - 2.0).abs() < 0.1);
    }

    #[test]
    fn test_ridge_accessors() {
        let model = Ridge::new(1.5);
        assert!((model.alpha() - 1.5).abs() < 1e-6);
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_ridge_serde_roundtrip() {
        let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0]);

        let mut model = Ridge::new(1.0);
        model.fit(&x, &y).unwrap();

        let bytes = bincode::serialize(&model).expect("serialize should succeed");
        let restored: Ridge = bincode::deserialize(&bytes).expect("deserialize should succeed");

        let original = model.predict(&x);
        let roundtripped = restored.predict(&x);
        for i in 0..4 {
            assert!((original[i] - roundtripped[i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_soft_threshold_values() {
        assert!((soft_threshold(5.0, 2.0) - 3.0).abs() < 1e-6);
        assert!((soft_threshold(-5.0, 2.0) - (-3.0)).abs() < 1e-6);
        assert_eq!(soft_threshold(1.0, 2.0), 0.0);
        assert_eq!(soft_threshold(-1.5, 2.0), 0.0);
        assert_eq!(soft_threshold(2.0, 2.0), 0.0);
    }

    #[test]
    fn test_lasso_fits_linear_data() {
        // y = 2x + 1
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut model = Lasso::new(0.1);
        model.fit(&x, &y).unwrap();

        // Small penalty barely biases the slope
        let coef = model.coefficients();
        assert!((coef[0] - 2.0).abs() < 0.05);
        assert!((model.intercept() - 1.0).abs() < 0.1);
        assert!(model.score(&x, &y) > 0.99);
    }

    #[test]
    fn test_lasso_zeroes_irrelevant_feature() {
        // Feature 0 drives y, feature 1 is uncorrelated noise
        let x = Matrix::from_vec(
            5,
            2,
            vec![
                1.0, 0.1, //
                2.0, -0.2, //
                3.0, 0.15, //
                4.0, -0.05, //
                5.0, 0.0, //
            ],
        )
        .unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut model = Lasso::new(1.0);
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients();
        assert_eq!(coef[1], 0.0, "noise feature should be exactly zero");
        assert!(coef[0] > 1.5);
    }

    #[test]
    fn test_lasso_builders() {
        let model = Lasso::new(0.5).with_max_iter(500).with_tol(1e-6);
        assert!((model.alpha() - 0.5).abs() < 1e-6);
        assert_eq!(model.max_iter, 500);
        assert!((model.tol - 1e-6).abs() < 1e-9);
    }

    #[test]
    fn test_lasso_dimension_mismatch() {
        let x = Matrix::from_vec(3, 1, vec![1.0, 2.0, 3.0]).unwrap();
        let y = Vector::from_slice(&[1.0, 2.0]);

        let mut model = Lasso::new(0.1);
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_elastic_net_fits_linear_data() {
        // y = 2x + 1
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut model = ElasticNet::new(0.1, 0.5);
        model.fit(&x, &y).unwrap();

        let coef = model.coefficients();
        assert!((coef[0] - 2.0).abs() < 0.05);
        assert!(model.score(&x, &y) > 0.99);
    }

    #[test]
    fn test_elastic_net_l1_ratio_clamped() {
        let over = ElasticNet::new(0.1, 1.5);
        assert!((over.l1_ratio() - 1.0).abs() < 1e-6);

        let under = ElasticNet::new(0.1, -0.5);
        assert!(under.l1_ratio().abs() < 1e-6);
    }

    #[test]
    fn test_elastic_net_full_l1_matches_lasso() {
        let x = Matrix::from_vec(5, 1, vec![1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let y = Vector::from_slice(&[3.0, 5.0, 7.0, 9.0, 11.0]);

        let mut lasso = Lasso::new(0.3);
        lasso.fit(&x, &y).unwrap();

        let mut enet = ElasticNet::new(0.3, 1.0);
        enet.fit(&x, &y).unwrap();

        assert!((lasso.coefficients()[0] - enet.coefficients()[0]).abs() < 1e-5);
        assert!((lasso.intercept() - enet.intercept()).abs() < 1e-5);
    }

    #[test]
    fn test_elastic_net_zero_samples_errors() {
        let x = Matrix::from_vec(0, 1, vec![]).unwrap();
        let y = Vector::from_vec(vec![]);

        let mut model = ElasticNet::new(0.1, 0.5);
        assert!(model.fit(&x, &y).is_err());
    }

    #[test]
    fn test_coordinate_descent_skips_constant_column() {
        // Column 1 is constant; its coefficient must stay zero
        let x = Matrix::from_vec(
            4,
            2,
            vec![1.0, 7.0, 2.0, 7.0, 3.0, 7.0, 4.0, 7.0],
        )
        .unwrap();
        let y = Vector::from_slice(&[2.0, 4.0, 6.0, 8.0]);

        let mut model = Lasso::new(0.01);
        model.fit(&x, &y).unwrap();

        assert_eq!(model.coefficients()[1], 0.0);
        assert!((model.coefficients()[0] - 2.0).abs() < 0.05);
    }
}
