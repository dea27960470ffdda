mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{pipeline, scenario_body};
use http_body_util::BodyExt;
use risk_explainer::server::{self, AppState};
use std::path::PathBuf;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    calls: std::sync::Arc<common::Calls>,
    pipeline: std::sync::Arc<risk_explainer::Pipeline>,
    feedback_path: PathBuf,
    _dir: TempDir,
}

fn app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let artifacts = dir.path().join("static");
    let (pipeline, calls) = pipeline(&artifacts);
    let feedback_path = dir.path().join("feedback.txt");
    let router = server::router(AppState::new(pipeline.clone(), &feedback_path));
    TestApp {
        router,
        calls,
        pipeline,
        feedback_path,
        _dir: dir,
    }
}

fn form_post(uri: &str, body: String) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

async fn body_text(response: axum::response::Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

#[tokio::test]
async fn test_index_serves_form() {
    let app = app();
    let response = app.router.oneshot(get("/")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("action=\"/predict\""));
    assert!(page.contains("name=\"MI-ALL\""));
}

#[tokio::test]
async fn test_download_before_predict_is_not_found() {
    let app = app();
    let response = app.router.oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_predict_then_download() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(form_post("/predict", scenario_body(None)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Predicted Risk: High Risk, Estimated Charges: Rs. 12,345.68"));
    assert!(page.contains("Confidence Score: 82.0%"));
    assert!(page.contains("Your risk is primarily affected by your &#39;smoker&#39; value."));
    assert!(page.contains("We recommend reviewing your health coverage"));

    let report_id = app.pipeline.renderer().store().latest().unwrap();
    assert!(page.contains(&format!("/artifacts/{report_id}/shap_plot.png")));
    assert!(page.contains(&format!("/download?report={report_id}")));

    let response = app.router.clone().oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"report.pdf\""
    );
    assert!(body_bytes(response).await.starts_with(b"%PDF"));

    let response = app
        .router
        .oneshot(get(&format!("/download?report={report_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_chart_images_are_served() {
    let app = app();
    app.router
        .clone()
        .oneshot(form_post("/predict", scenario_body(None)))
        .await
        .unwrap();
    let report_id = app.pipeline.renderer().store().latest().unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/artifacts/{report_id}/force_plot.png")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert!(body_bytes(response).await.starts_with(b"\x89PNG"));
}

#[tokio::test]
async fn test_missing_field_is_bad_request() {
    let app = app();
    let response = app
        .router
        .oneshot(form_post("/predict", scenario_body(Some("bmi"))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_text(response).await.contains("bmi"));
    assert_eq!(app.calls.total(), 0);
}

#[tokio::test]
async fn test_download_with_unknown_or_bad_id() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(get("/download?report=not-a-uuid"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .router
        .oneshot(get("/download?report=6f1c2a34-9a4e-4d7b-8a55-0c8f0e0f6a11"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_feedback_is_appended() {
    let app = app();

    let response = app
        .router
        .clone()
        .oneshot(form_post("/feedback", "feedback=Very+helpful".to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Thank you"));

    // Missing field appends an empty entry
    let response = app
        .router
        .oneshot(form_post("/feedback", String::new()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let log = std::fs::read_to_string(&app.feedback_path).unwrap();
    assert_eq!(log, "Very helpful\n---\n\n---\n");
}

#[tokio::test]
async fn test_feedback_write_failure_still_thanks() {
    let dir = TempDir::new().unwrap();
    let (pipeline, _) = pipeline(&dir.path().join("static"));
    let unwritable = dir.path().join("missing-dir").join("feedback.txt");
    let router = server::router(AppState::new(pipeline, &unwritable));

    let response = router
        .oneshot(form_post("/feedback", "feedback=lost".to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!unwritable.exists());
}

#[tokio::test]
async fn test_render_failure_is_server_error() {
    let dir = TempDir::new().unwrap();
    let blocked = dir.path().join("static");
    std::fs::write(&blocked, b"").unwrap();
    let (pipeline, _) = pipeline(&blocked);
    let router = server::router(AppState::new(pipeline.clone(), dir.path().join("feedback.txt")));

    let response = router
        .clone()
        .oneshot(form_post("/predict", scenario_body(None)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let page = body_text(response).await;
    assert!(page.contains("Something went wrong"));
    assert!(!page.contains("artifact directory"));
    assert!(pipeline.renderer().store().latest().is_none());

    let response = router.oneshot(get("/download")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
