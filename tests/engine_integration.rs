//! Integration tests for the survey score prediction engine.
//!
//! These tests verify end-to-end workflows: feature building, per-metric
//! training, bounded prediction, persistence, and insight generation.

use pulso::engine::{ScoreEngine, TrainingStatus};
use pulso::prelude::*;
use std::collections::BTreeMap;

const REGIONS: [&str; 5] = ["West", "Midwest", "South", "Northeast", "Mountain"];

const CANDIDATE_NAMES: [&str; 6] = [
    "linear_regression",
    "ridge_regression",
    "lasso_regression",
    "elastic_net",
    "random_forest",
    "gradient_boosting",
];

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fleet_profile(i: usize) -> HospitalProfile {
    HospitalProfile {
        beds: 80.0 + 25.0 * (i % 8) as f32,
        rating: 2.0 + 0.5 * (i % 6) as f32,
        teaching: i % 2 == 0,
        urban: i % 4 != 1,
        region: Region::from_name(REGIONS[i % REGIONS.len()]),
    }
}

fn fleet_stats(i: usize) -> PeriodStats {
    PeriodStats {
        patient_volume: 800.0 + 180.0 * i as f32,
        response_rate: 18.0 + 1.5 * (i % 10) as f32,
    }
}

fn fleet_features(n: usize) -> Matrix<f32> {
    let mut rows = Vec::with_capacity(n * N_FEATURES);
    for i in 0..n {
        rows.extend_from_slice(&build_features(&fleet_profile(i), &fleet_stats(i)));
    }
    Matrix::from_vec(n, N_FEATURES, rows).expect("fleet dimensions are consistent")
}

/// Deterministic survey scores driven by the hospital attributes.
fn fleet_targets(n: usize) -> BTreeMap<String, Vec<f32>> {
    let mut targets = BTreeMap::new();

    targets.insert(
        "overall_rating".to_string(),
        (0..n)
            .map(|i| {
                let p = fleet_profile(i);
                let s = fleet_stats(i);
                (35.0 + 9.0 * p.rating + 0.002 * s.patient_volume).min(98.0)
            })
            .collect(),
    );
    targets.insert(
        "cleanliness".to_string(),
        (0..n)
            .map(|i| {
                let s = fleet_stats(i);
                (92.0 - 0.004 * s.patient_volume).max(45.0)
            })
            .collect(),
    );
    targets.insert(
        "quietness".to_string(),
        (0..n)
            .map(|i| 50.0 + 5.0 * fleet_profile(i).rating + (i % 7) as f32)
            .collect(),
    );

    targets
}

#[test]
fn test_full_training_workflow() {
    init_logging();
    let n = 30;
    let x = fleet_features(n);
    let mut targets = fleet_targets(n);

    // One metric with only 6 valid observations never trains.
    let mut sparse = vec![0.0; n];
    for (i, slot) in sparse.iter_mut().enumerate().take(6) {
        *slot = 65.0 + i as f32;
    }
    targets.insert("pain_management".to_string(), sparse);

    let mut engine = ScoreEngine::new();
    let report = engine.train_all(&x, &targets);

    assert_eq!(report.len(), 4);
    for metric in ["overall_rating", "cleanliness", "quietness"] {
        let entry = &report[metric];
        assert_eq!(entry.status, TrainingStatus::Trained, "{metric} should train");
        let best = entry.best_model.as_deref().expect("trained metric names a winner");
        assert!(
            CANDIDATE_NAMES.contains(&best),
            "{metric} elected unknown model {best}"
        );
        let performance = entry.performance.expect("trained metric has scores");
        assert!(performance.r2 <= 1.0 + 1e-6);
        assert!(performance.mse >= 0.0);
        assert!(performance.mae >= 0.0);
    }

    let skipped = &report["pain_management"];
    assert_eq!(skipped.status, TrainingStatus::Skipped);
    assert!(skipped.best_model.is_none());
    assert!(skipped
        .note
        .as_deref()
        .expect("skip carries a note")
        .contains("insufficient data"));

    // Only trained metrics enter the registry, in ascending order.
    assert_eq!(engine.registry().len(), 3);
    let registered: Vec<&str> = engine.registry().metrics().collect();
    assert_eq!(registered, vec!["cleanliness", "overall_rating", "quietness"]);

    // The summary reflects every registered model.
    let summary = engine.performance_summary();
    assert_eq!(summary.overall.expect("models exist").total_models, 3);
    assert_eq!(summary.by_model.values().map(|m| m.count).sum::<usize>(), 3);
    let importance = summary.importance.expect("models exist");
    assert_eq!(importance.average.len(), N_FEATURES);
    assert!(importance.average.iter().all(|w| *w >= 0.0));
}

#[test]
fn test_predictions_stay_bounded_with_one_decimal() {
    init_logging();
    let n = 30;
    let x = fleet_features(n);
    let mut targets = BTreeMap::new();
    targets.insert(
        "recommend_hospital".to_string(),
        (0..n)
            .map(|i| 45.0 + 0.006 * fleet_stats(i).patient_volume)
            .collect::<Vec<f32>>(),
    );

    let mut engine = ScoreEngine::new();
    engine.train_all(&x, &targets);

    for i in 0..n {
        let features = build_features(&fleet_profile(i), &fleet_stats(i));
        let (score, confidence) = engine.predict_metric("recommend_hospital", &features);

        assert!((0.0..=100.0).contains(&score), "score out of bounds: {score}");
        let tenths = score * 10.0;
        assert!(
            (tenths - tenths.round()).abs() < 1e-3,
            "score not rounded to one decimal: {score}"
        );
        assert!(confidence <= 1.0 + 1e-6);
    }
}

#[test]
fn test_untrained_metrics_return_sentinels() {
    let engine = ScoreEngine::new();
    let features = build_features(&fleet_profile(3), &fleet_stats(3));

    let set = engine.predict(&features, &SURVEY_METRICS);
    assert_eq!(set.predictions.len(), SURVEY_METRICS.len());

    for metric in SURVEY_METRICS {
        assert_eq!(set.predictions[metric], 0.0);
        assert_eq!(set.confidences[metric], 0.0);
        assert!(set.factors[metric].is_empty());
    }
}

#[test]
fn test_save_load_roundtrip_preserves_predictions() {
    init_logging();
    let n = 26;
    let x = fleet_features(n);
    let mut targets = fleet_targets(n);
    targets.remove("quietness");

    let mut engine = ScoreEngine::new();
    engine.train_all(&x, &targets);

    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("models.bin");
    engine.save(&path).expect("save should succeed");

    let mut restored = ScoreEngine::new();
    restored.load(&path).expect("load should succeed");

    assert_eq!(restored.registry().len(), engine.registry().len());

    for i in [0, 7, 19] {
        let features = build_features(&fleet_profile(i), &fleet_stats(i));
        for metric in ["overall_rating", "cleanliness"] {
            assert_eq!(
                restored.predict_metric(metric, &features),
                engine.predict_metric(metric, &features),
                "{metric} prediction changed across save/load"
            );
            assert_eq!(
                restored.key_factors(metric, &features),
                engine.key_factors(metric, &features)
            );
        }
    }
}

#[test]
fn test_load_failure_keeps_existing_models() {
    init_logging();
    let n = 22;
    let x = fleet_features(n);
    let mut targets = fleet_targets(n);
    targets.remove("quietness");
    targets.remove("cleanliness");

    let mut engine = ScoreEngine::new();
    engine.train_all(&x, &targets);
    let features = build_features(&fleet_profile(5), &fleet_stats(5));
    let before = engine.predict_metric("overall_rating", &features);

    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.bin");
    assert!(engine.load(&missing).is_err());

    // The failed load left the registry untouched.
    assert_eq!(engine.registry().len(), 1);
    assert_eq!(engine.predict_metric("overall_rating", &features), before);
}

#[test]
fn test_insights_from_score_gaps() {
    let engine = ScoreEngine::new();

    let mut actuals = BTreeMap::new();
    actuals.insert("overall_rating".to_string(), 70.0);
    actuals.insert("cleanliness".to_string(), 80.0);
    actuals.insert("quietness".to_string(), 80.0);

    let mut predictions = BTreeMap::new();
    predictions.insert("overall_rating".to_string(), 82.0);
    predictions.insert("cleanliness".to_string(), 74.0);
    predictions.insert("quietness".to_string(), 83.0);

    let insights = engine.insights(&actuals, &predictions);
    assert_eq!(insights.len(), 2);

    // Ascending metric order: cleanliness first, then overall_rating.
    let risk = &insights[0];
    assert_eq!(risk.metric, "cleanliness");
    assert_eq!(risk.kind, InsightKind::Risk);
    assert_eq!(risk.priority, Priority::Medium);
    assert_eq!(risk.title, "Performance decline risk in Cleanliness");
    assert_eq!(
        risk.description,
        "Predicted performance is 6.0 points lower than current"
    );

    let opportunity = &insights[1];
    assert_eq!(opportunity.metric, "overall_rating");
    assert_eq!(opportunity.kind, InsightKind::Opportunity);
    assert_eq!(opportunity.priority, Priority::High);
    assert_eq!(
        opportunity.title,
        "Potential for improvement in Overall Rating"
    );
    assert_eq!(
        opportunity.description,
        "Predicted performance is 12.0 points higher than current"
    );
}

#[test]
fn test_report_and_predictions_serialize_to_json() {
    init_logging();
    let n = 24;
    let x = fleet_features(n);
    let mut targets = BTreeMap::new();
    targets.insert(
        "discharge_information".to_string(),
        (0..n)
            .map(|i| 55.0 + 0.004 * fleet_stats(i).patient_volume)
            .collect::<Vec<f32>>(),
    );
    targets.insert("responsiveness_staff".to_string(), vec![0.0; n]);

    let mut engine = ScoreEngine::new();
    let report = engine.train_all(&x, &targets);

    let json = serde_json::to_value(&report).expect("report serializes");
    assert_eq!(json["discharge_information"]["status"], "trained");
    assert!(json["discharge_information"]["best_model"].is_string());
    assert!(json["discharge_information"]["performance"]["r2"].is_number());
    assert_eq!(json["responsiveness_staff"]["status"], "skipped");
    assert!(json["responsiveness_staff"]["note"].is_string());

    let features = build_features(&fleet_profile(2), &fleet_stats(2));
    let set = engine.predict(&features, &["discharge_information"]);
    let json = serde_json::to_value(&set).expect("prediction set serializes");
    assert!(json["predictions"]["discharge_information"].is_number());
    assert!(json["confidences"]["discharge_information"].is_number());
    assert!(json["factors"]["discharge_information"].is_array());
}

#[test]
fn test_training_is_reproducible_across_engines() {
    init_logging();
    let n = 24;
    let x = fleet_features(n);
    let mut targets = fleet_targets(n);
    targets.remove("cleanliness");
    targets.remove("quietness");

    let mut first = ScoreEngine::new();
    let report_a = first.train_all(&x, &targets);
    let mut second = ScoreEngine::new();
    let report_b = second.train_all(&x, &targets);

    let a = &report_a["overall_rating"];
    let b = &report_b["overall_rating"];
    assert_eq!(a.best_model, b.best_model);
    assert_eq!(
        a.performance.expect("trained").r2,
        b.performance.expect("trained").r2
    );

    for i in [1, 11, 21] {
        let features = build_features(&fleet_profile(i), &fleet_stats(i));
        assert_eq!(
            first.predict_metric("overall_rating", &features),
            second.predict_metric("overall_rating", &features)
        );
    }
}
