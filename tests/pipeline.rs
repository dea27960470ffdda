mod common;

use common::{pipeline, pipeline_with, pipeline_with_store, scenario_form, StubModels};
use risk_explainer::config::ArtifactLayout;
use risk_explainer::explanation::{HIGH_RISK_RECOMMENDATION, LOW_RISK_RECOMMENDATION};
use risk_explainer::report::ArtifactStore;
use risk_explainer::types::FEATURE_NAMES;
use risk_explainer::{PipelineError, RiskLabel};
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::thread;
use tempfile::TempDir;

#[test]
fn test_reference_applicant() {
    let dir = TempDir::new().unwrap();
    let (pipeline, calls) = pipeline(dir.path());

    let outcome = pipeline.run(&scenario_form()).unwrap();

    assert_eq!(outcome.prediction.risk_label, RiskLabel::High);
    assert_eq!(outcome.prediction.confidence_percent, 82.0);
    assert_eq!(outcome.attribution.dominant_feature, "smoker");
    assert_eq!(outcome.attribution.base_value, Some(-1.2));
    assert_eq!(
        outcome.explanation.rationale,
        "Your risk is primarily affected by your 'smoker' value."
    );
    assert_eq!(outcome.explanation.recommendation, HIGH_RISK_RECOMMENDATION);
    assert_eq!(outcome.display.risk, "High Risk");
    assert_eq!(outcome.display.cost, "Rs. 12,345.68");
    assert_eq!(outcome.display.confidence, "82.0%");

    // One call per model
    assert_eq!(calls.classifier.load(Ordering::SeqCst), 1);
    assert_eq!(calls.regressor.load(Ordering::SeqCst), 1);
    assert_eq!(calls.attributor.load(Ordering::SeqCst), 1);

    assert!(outcome.artifacts.bar_chart.is_file());
    assert!(outcome.artifacts.force_chart.is_file());
    assert!(std::fs::read(&outcome.artifacts.report).unwrap().starts_with(b"%PDF"));

    let store = pipeline.renderer().store();
    assert_eq!(store.latest(), Some(outcome.report_id));
    assert_eq!(store.latest_report_path(), Some(outcome.artifacts.report.clone()));
    assert_eq!(pipeline.metrics().predictions_served.load(Ordering::Relaxed), 1);
}

#[test]
fn test_missing_field_invokes_no_model() {
    for field in FEATURE_NAMES {
        let dir = TempDir::new().unwrap();
        let (pipeline, calls) = pipeline(dir.path());
        let mut form = scenario_form();
        form.remove(field);

        let err = pipeline.run(&form).unwrap_err();

        match err {
            PipelineError::InvalidInput { field: bad, .. } => assert_eq!(bad, field),
            other => panic!("unexpected error for {field}: {other}"),
        }
        assert_eq!(calls.total(), 0, "models invoked without {field}");
        assert!(pipeline.renderer().store().latest().is_none());
        assert_eq!(pipeline.metrics().get_failures()["invalid_input"], 1);
    }
}

#[test]
fn test_malformed_value_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (pipeline, calls) = pipeline(dir.path());
    let mut form = scenario_form();
    form.insert("bmi".to_string(), "heavy".to_string());

    let err = pipeline.run(&form).unwrap_err();

    assert!(err.is_client_error());
    assert!(err.to_string().contains("bmi"));
    assert_eq!(calls.total(), 0);
}

#[test]
fn test_same_input_same_explanation() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline(dir.path());

    let first = pipeline.run(&scenario_form()).unwrap();
    let second = pipeline.run(&scenario_form()).unwrap();

    assert_eq!(first.prediction, second.prediction);
    assert_eq!(first.attribution, second.attribution);
    assert_eq!(first.explanation, second.explanation);
    assert_ne!(first.report_id, second.report_id);
    assert_ne!(first.artifacts.report, second.artifacts.report);
    assert_eq!(pipeline.renderer().store().latest(), Some(second.report_id));
}

#[test]
fn test_half_probability_is_low_risk() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline_with(
        dir.path(),
        ArtifactLayout::PerRequest,
        StubModels {
            probability: Ok(0.5),
            ..StubModels::default()
        },
    );

    let outcome = pipeline.run(&scenario_form()).unwrap();

    assert_eq!(outcome.prediction.risk_label, RiskLabel::Low);
    assert_eq!(outcome.prediction.confidence_percent, 50.0);
    assert_eq!(outcome.explanation.recommendation, LOW_RISK_RECOMMENDATION);
    // The rationale still names the dominant feature
    assert!(outcome.explanation.rationale.contains("'smoker'"));
}

#[test]
fn test_confidence_rounding() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline_with(
        dir.path(),
        ArtifactLayout::PerRequest,
        StubModels {
            probability: Ok(0.7321),
            ..StubModels::default()
        },
    );

    let outcome = pipeline.run(&scenario_form()).unwrap();
    assert_eq!(outcome.prediction.confidence_percent, 73.21);
    assert_eq!(outcome.display.confidence, "73.21%");
}

#[test]
fn test_classifier_failure_is_inference_error() {
    let dir = TempDir::new().unwrap();
    let (pipeline, calls) = pipeline_with(
        dir.path(),
        ArtifactLayout::PerRequest,
        StubModels {
            probability: Err(anyhow::anyhow!("session crashed")),
            ..StubModels::default()
        },
    );

    let err = pipeline.run(&scenario_form()).unwrap_err();

    assert!(matches!(err, PipelineError::Inference(_)));
    assert_eq!(calls.attributor.load(Ordering::SeqCst), 0);
    assert!(pipeline.renderer().store().latest().is_none());
    assert_eq!(pipeline.metrics().get_failures()["inference"], 1);
}

#[test]
fn test_probability_out_of_range_is_inference_error() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline_with(
        dir.path(),
        ArtifactLayout::PerRequest,
        StubModels {
            probability: Ok(1.7),
            ..StubModels::default()
        },
    );

    assert!(matches!(
        pipeline.run(&scenario_form()).unwrap_err(),
        PipelineError::Inference(_)
    ));
}

#[test]
fn test_misaligned_attribution_is_rejected() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline_with(
        dir.path(),
        ArtifactLayout::PerRequest,
        StubModels {
            attribution: vec![0.1; 8],
            ..StubModels::default()
        },
    );

    let err = pipeline.run(&scenario_form()).unwrap_err();

    assert!(matches!(err, PipelineError::Attribution(_)));
    assert!(pipeline.renderer().store().latest().is_none());
    // Nothing rendered
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_shared_slot_keeps_latest_report() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline_with(dir.path(), ArtifactLayout::SharedSlot, StubModels::default());

    let first = pipeline.run(&scenario_form()).unwrap();
    let second = pipeline.run(&scenario_form()).unwrap();

    let store = pipeline.renderer().store();
    assert_eq!(first.artifacts.report, second.artifacts.report);
    assert!(store.report_path(first.report_id).is_none());
    assert_eq!(store.report_path(second.report_id), Some(second.artifacts.report));
}

#[test]
fn test_concurrent_requests_get_separate_reports() {
    let dir = TempDir::new().unwrap();
    let (pipeline, calls) = pipeline(dir.path());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let pipeline = pipeline.clone();
            thread::spawn(move || pipeline.run(&scenario_form()).unwrap())
        })
        .collect();
    let outcomes: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let reports: HashSet<_> = outcomes.iter().map(|o| o.artifacts.report.clone()).collect();
    assert_eq!(reports.len(), 4);
    for outcome in &outcomes {
        assert!(std::fs::read(&outcome.artifacts.report).unwrap().starts_with(b"%PDF"));
    }
    assert_eq!(calls.classifier.load(Ordering::SeqCst), 4);
}

#[test]
fn test_old_reports_are_pruned() {
    let dir = TempDir::new().unwrap();
    let keep = 3;
    let (pipeline, _) = pipeline_with_store(
        ArtifactStore::new(dir.path(), ArtifactLayout::PerRequest).with_retention(keep),
        StubModels::default(),
    );

    let outcomes: Vec<_> = (0..=keep)
        .map(|_| pipeline.run(&scenario_form()).unwrap())
        .collect();

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), keep);
    let store = pipeline.renderer().store();
    assert!(store.report_path(outcomes[0].report_id).is_none());
    for outcome in &outcomes[1..] {
        assert!(store.report_path(outcome.report_id).is_some());
    }
    assert_eq!(store.latest(), Some(outcomes[keep].report_id));
}

#[test]
fn test_unwritable_artifact_dir_is_render_error() {
    let dir = TempDir::new().unwrap();
    // A regular file where the artifact directory should be
    let blocked = dir.path().join("static");
    std::fs::write(&blocked, b"").unwrap();
    let (pipeline, calls) = pipeline(&blocked);

    let err = pipeline.run(&scenario_form()).unwrap_err();

    assert!(matches!(err, PipelineError::Render(_)));
    assert!(!err.is_client_error());
    assert_eq!(calls.attributor.load(Ordering::SeqCst), 1);
    assert!(pipeline.renderer().store().latest().is_none());
    assert_eq!(pipeline.metrics().get_failures()["render"], 1);
    assert_eq!(pipeline.metrics().predictions_served.load(Ordering::Relaxed), 0);
}
