//! Pulso: hospital patient-experience score prediction in pure Rust.
//!
//! Pulso trains one regression model per patient-survey metric from
//! historical hospital observations, elects the best of a fixed
//! candidate panel on held-out R², and serves bounded score predictions
//! with confidence values, key-factor explanations, and
//! opportunity/risk insights.
//!
//! # Quick Start
//!
//! ```
//! use pulso::prelude::*;
//! use std::collections::BTreeMap;
//!
//! // One feature row per historical hospital observation.
//! let mut rows = Vec::new();
//! for i in 0..12 {
//!     let profile = HospitalProfile {
//!         beds: 120.0 + 15.0 * (i % 5) as f32,
//!         rating: 2.5 + 0.3 * (i % 4) as f32,
//!         teaching: i % 2 == 0,
//!         urban: i % 3 != 0,
//!         region: Region::from_name("West"),
//!     };
//!     let stats = PeriodStats {
//!         patient_volume: 900.0 + 300.0 * i as f32,
//!         response_rate: 22.0 + (i % 6) as f32,
//!     };
//!     rows.extend_from_slice(&build_features(&profile, &stats));
//! }
//! let x = Matrix::from_vec(12, N_FEATURES, rows).unwrap();
//!
//! // Scores for one survey metric, aligned with the feature rows.
//! let mut targets = BTreeMap::new();
//! targets.insert(
//!     "recommend_hospital".to_string(),
//!     (0..12).map(|i| 60.0 + 2.0 * i as f32).collect::<Vec<f32>>(),
//! );
//!
//! let mut engine = ScoreEngine::new();
//! let report = engine.train_all(&x, &targets);
//! assert!(report["recommend_hospital"].best_model.is_some());
//!
//! // Predict for a hospital the engine has never seen.
//! let query = build_features(
//!     &HospitalProfile {
//!         beds: 150.0,
//!         rating: 3.4,
//!         teaching: true,
//!         urban: true,
//!         region: Region::from_name("West"),
//!     },
//!     &PeriodStats {
//!         patient_volume: 2000.0,
//!         response_rate: 24.0,
//!     },
//! );
//! let (score, confidence) = engine.predict_metric("recommend_hospital", &query);
//! assert!((0.0..=100.0).contains(&score));
//! assert!(confidence > 0.5);
//!
//! // Metrics without a trained model return the sentinel.
//! assert_eq!(engine.predict_metric("quietness", &query), (0.0, 0.0));
//! ```
//!
//! # Modules
//!
//! - [`engine`]: Training, prediction, persistence, and insight facade
//! - [`error`]: Error type shared across the crate
//! - [`features`]: Hospital feature engineering and factor descriptions
//! - [`insights`]: Opportunity and risk insights from score gaps
//! - [`linear_model`]: Linear regression family (OLS, Ridge, Lasso, `ElasticNet`)
//! - [`metrics`]: Evaluation metrics (R², MSE, MAE)
//! - [`model_selection`]: Cross-validation and train/test splitting
//! - [`preprocessing`]: Standardization and univariate feature selection
//! - [`primitives`]: Core Vector and Matrix types
//! - [`registry`]: Persistent store for trained per-metric models
//! - [`traits`]: Estimator and Transformer traits
//! - [`tree`]: Decision tree, random forest, and gradient boosting regressors

pub mod engine;
pub mod error;
pub mod features;
pub mod insights;
pub mod linear_model;
pub mod metrics;
pub mod model_selection;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod registry;
pub mod traits;
pub mod tree;

pub use engine::ScoreEngine;
pub use error::{PulsoError, Result};
pub use primitives::{Matrix, Vector};
pub use traits::{Estimator, Transformer};
