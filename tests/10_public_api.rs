mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;
use rekord_cms::settings::RecruitmentFlag;

#[tokio::test]
async fn root_describes_the_service() {
    let app = TestApp::new();
    let (status, body) = app.get("/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert!(body["data"]["endpoints"]["content"].is_string());
}

#[tokio::test]
async fn health_pings_the_store() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], json!("ok"));
}

#[tokio::test]
async fn content_comes_back_in_display_order() {
    let app = TestApp::new();
    app.store.seed(
        "company_values",
        vec![
            json!({"title": "Second", "description": "D", "display_order": 2}),
            json!({"title": "First", "description": "D", "display_order": 1}),
        ],
    );

    let (status, body) = app.get("/api/content/company_values", None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body["data"].as_array().unwrap().iter().map(|r| r["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["First", "Second"]);
}

#[tokio::test]
async fn content_filters_by_category() {
    let app = TestApp::new();
    app.store.seed(
        "faqs",
        vec![
            json!({"question": "Q1", "answer": "A", "category": "career"}),
            json!({"question": "Q2", "answer": "A", "category": "internship"}),
            json!({"question": "Q3", "answer": "A", "category": "career"}),
        ],
    );

    let (_, body) = app.get("/api/content/faqs?category=career", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/content/faqs?category=all", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn content_rejects_unknown_collections_and_filters() {
    let app = TestApp::new();

    let (status, body) = app.get("/api/content/admins", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("NOT_FOUND"));

    let (status, _) = app.get("/api/content/job_offers?category=career", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn recruitment_flag_defaults_to_closed() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/settings/recruitment", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"isOpen": false}));

    app.settings.set(RecruitmentFlag::open()).await.unwrap();
    let (_, body) = app.get("/api/settings/recruitment", None).await;
    assert_eq!(body["data"], json!({"isOpen": true}));
}
