//! The fixed panel of candidate model families.
//!
//! A closed tagged union rather than trait objects: the panel never
//! grows at runtime, and the winning model has to serialize alongside
//! the rest of the registry state.

use crate::error::Result;
use crate::linear_model::{ElasticNet, Lasso, LinearRegression, Ridge};
use crate::primitives::{Matrix, Vector};
use crate::traits::Estimator;
use crate::tree::{GradientBoostingRegressor, RandomForestRegressor};
use serde::{Deserialize, Serialize};

/// One member of the candidate panel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Candidate {
    /// Ordinary least squares.
    Linear(LinearRegression),
    /// L2-regularized linear model.
    Ridge(Ridge),
    /// L1-regularized linear model.
    Lasso(Lasso),
    /// Combined L1+L2 linear model.
    ElasticNet(ElasticNet),
    /// Bootstrap-aggregated CART trees.
    RandomForest(RandomForestRegressor),
    /// Stage-wise boosted shallow trees.
    GradientBoosting(GradientBoostingRegressor),
}

impl Candidate {
    /// The candidate panel in authoritative order, with the fixed
    /// hyperparameters used for every metric.
    ///
    /// The order matters: when two candidates tie on held-out R², the
    /// one earlier in the panel wins.
    #[must_use]
    pub fn panel() -> Vec<Candidate> {
        vec![
            Candidate::Linear(LinearRegression::new()),
            Candidate::Ridge(Ridge::new(1.0)),
            Candidate::Lasso(Lasso::new(0.1)),
            Candidate::ElasticNet(ElasticNet::new(0.1, 0.5)),
            Candidate::RandomForest(RandomForestRegressor::new(100).with_random_state(42)),
            Candidate::GradientBoosting(
                GradientBoostingRegressor::new()
                    .with_n_estimators(100)
                    .with_learning_rate(0.1)
                    .with_max_depth(3),
            ),
        ]
    }

    /// Stable identifier used in score tables and summaries.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Candidate::Linear(_) => "linear_regression",
            Candidate::Ridge(_) => "ridge_regression",
            Candidate::Lasso(_) => "lasso_regression",
            Candidate::ElasticNet(_) => "elastic_net",
            Candidate::RandomForest(_) => "random_forest",
            Candidate::GradientBoosting(_) => "gradient_boosting",
        }
    }

    /// Feature importances of a fitted candidate.
    ///
    /// Tree ensembles report native split importance; linear models
    /// report absolute coefficient magnitude. The length matches the
    /// feature count the candidate was fitted on.
    ///
    /// # Panics
    ///
    /// Panics if the candidate is not fitted.
    #[must_use]
    pub fn importance(&self) -> Vec<f32> {
        match self {
            Candidate::Linear(model) => absolute_coefficients(model.coefficients()),
            Candidate::Ridge(model) => absolute_coefficients(model.coefficients()),
            Candidate::Lasso(model) => absolute_coefficients(model.coefficients()),
            Candidate::ElasticNet(model) => absolute_coefficients(model.coefficients()),
            Candidate::RandomForest(model) => model
                .feature_importances()
                .expect("Model not fitted. Call fit() first."),
            Candidate::GradientBoosting(model) => model
                .feature_importances()
                .expect("Model not fitted. Call fit() first."),
        }
    }
}

impl Estimator for Candidate {
    /// Fits the wrapped model.
    ///
    /// # Errors
    ///
    /// Propagates the wrapped model's fitting error.
    fn fit(&mut self, x: &Matrix<f32>, y: &Vector<f32>) -> Result<()> {
        match self {
            Candidate::Linear(model) => model.fit(x, y),
            Candidate::Ridge(model) => model.fit(x, y),
            Candidate::Lasso(model) => model.fit(x, y),
            Candidate::ElasticNet(model) => model.fit(x, y),
            Candidate::RandomForest(model) => model.fit(x, y),
            Candidate::GradientBoosting(model) => model.fit(x, y),
        }
    }

    /// Predicts with the wrapped model.
    ///
    /// # Panics
    ///
    /// Panics if the candidate is not fitted.
    fn predict(&self, x: &Matrix<f32>) -> Vector<f32> {
        match self {
            Candidate::Linear(model) => model.predict(x),
            Candidate::Ridge(model) => model.predict(x),
            Candidate::Lasso(model) => model.predict(x),
            Candidate::ElasticNet(model) => model.predict(x),
            Candidate::RandomForest(model) => model.predict(x),
            Candidate::GradientBoosting(model) => model.predict(x),
        }
    }

    /// Computes the R² score of the wrapped model.
    fn score(&self, x: &Matrix<f32>, y: &Vector<f32>) -> f32 {
        match self {
            Candidate::Linear(model) => model.score(x, y),
            Candidate::Ridge(model) => model.score(x, y),
            Candidate::Lasso(model) => model.score(x, y),
            Candidate::ElasticNet(model) => model.score(x, y),
            Candidate::RandomForest(model) => model.score(x, y),
            Candidate::GradientBoosting(model) => model.score(x, y),
        }
    }
}

fn absolute_coefficients(coefficients: &Vector<f32>) -> Vec<f32> {
    coefficients.iter().map(|c| c.abs()).collect()
}
