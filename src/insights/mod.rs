//! Gap analysis between observed and predicted survey scores.
//!
//! Insights are ephemeral: computed on demand from two score mappings,
//! never persisted. A metric only yields an insight when the predicted
//! score moves more than 5 points away from the current one.

use serde::Serialize;
use std::collections::BTreeMap;

/// Gap beyond which a metric yields an insight (strict comparison).
const INSIGHT_GAP: f32 = 5.0;
/// Absolute gap beyond which an insight is high priority.
const HIGH_PRIORITY_GAP: f32 = 10.0;

/// Direction of a score gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    /// Predicted score is more than 5 points above the current score.
    Opportunity,
    /// Predicted score is more than 5 points below the current score.
    Risk,
}

/// How urgently an insight should be acted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Absolute gap above 10 points.
    High,
    /// Absolute gap between 5 and 10 points.
    Medium,
}

/// One actionable finding for a single metric.
#[derive(Debug, Clone, Serialize)]
pub struct Insight {
    /// Metric the insight refers to.
    pub metric: String,
    /// Opportunity or risk.
    pub kind: InsightKind,
    /// Short headline, e.g. `Potential for improvement in Quietness`.
    pub title: String,
    /// One-sentence explanation with the gap size.
    pub description: String,
    /// Observed score for the metric.
    pub current_score: f32,
    /// Model-predicted score for the metric.
    pub predicted_score: f32,
    /// Signed gap: predicted minus current.
    pub gap: f32,
    /// High when the absolute gap exceeds 10 points, else medium.
    pub priority: Priority,
}

impl Insight {
    /// Magnitude reported to callers: improvement potential for
    /// opportunities (the gap itself), risk level for risks (its
    /// absolute value).
    #[must_use]
    pub fn magnitude(&self) -> f32 {
        match self.kind {
            InsightKind::Opportunity => self.gap,
            InsightKind::Risk => self.gap.abs(),
        }
    }
}

/// Compares actual and predicted scores metric by metric.
///
/// A metric yields an insight only when it appears in both mappings and
/// the gap strictly exceeds 5 points in either direction; a gap of
/// exactly 5.0 yields nothing. Output order is metric-name ascending.
///
/// # Examples
///
/// ```
/// use pulso::insights::{generate_insights, InsightKind, Priority};
/// use std::collections::BTreeMap;
///
/// let mut actuals = BTreeMap::new();
/// actuals.insert("quietness".to_string(), 70.0);
/// let mut predictions = BTreeMap::new();
/// predictions.insert("quietness".to_string(), 82.0);
///
/// let insights = generate_insights(&actuals, &predictions);
/// assert_eq!(insights.len(), 1);
/// assert_eq!(insights[0].kind, InsightKind::Opportunity);
/// assert_eq!(insights[0].priority, Priority::High);
/// ```
#[must_use]
pub fn generate_insights(
    actuals: &BTreeMap<String, f32>,
    predictions: &BTreeMap<String, f32>,
) -> Vec<Insight> {
    let mut insights = Vec::new();

    for (metric, &predicted) in predictions {
        let Some(&actual) = actuals.get(metric) else {
            continue;
        };
        let gap = predicted - actual;

        let kind = if gap > INSIGHT_GAP {
            InsightKind::Opportunity
        } else if gap < -INSIGHT_GAP {
            InsightKind::Risk
        } else {
            continue;
        };

        let priority = if gap.abs() > HIGH_PRIORITY_GAP {
            Priority::High
        } else {
            Priority::Medium
        };

        let display_name = title_case(metric);
        let (title, description) = match kind {
            InsightKind::Opportunity => (
                format!("Potential for improvement in {display_name}"),
                format!("Predicted performance is {gap:.1} points higher than current"),
            ),
            InsightKind::Risk => (
                format!("Performance decline risk in {display_name}"),
                format!(
                    "Predicted performance is {:.1} points lower than current",
                    gap.abs()
                ),
            ),
        };

        insights.push(Insight {
            metric: metric.clone(),
            kind,
            title,
            description,
            current_score: actual,
            predicted_score: predicted,
            gap,
            priority,
        });
    }

    insights
}

/// `communication_nurses` -> `Communication Nurses`.
fn title_case(metric: &str) -> String {
    metric
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
