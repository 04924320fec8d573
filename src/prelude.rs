//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use pulso::prelude::*;
//! ```

pub use crate::engine::{ScoreEngine, SURVEY_METRICS};
pub use crate::error::{PulsoError, Result};
pub use crate::features::{
    build_features, describe_factor, HospitalProfile, PeriodStats, Region, FEATURE_NAMES,
    N_FEATURES,
};
pub use crate::insights::{generate_insights, Insight, InsightKind, Priority};
pub use crate::linear_model::LinearRegression;
pub use crate::metrics::{mae, mse, r_squared};
pub use crate::primitives::{Matrix, Vector};
pub use crate::traits::{Estimator, Transformer};
