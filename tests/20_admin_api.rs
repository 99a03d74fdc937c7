mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{token, token_for, TestApp};
use rekord_cms::editor::UploadPolicy;
use rekord_cms::testing::StoreCall;
use rekord_cms::types::Role;

fn inserts(app: &TestApp, collection: &str) -> usize {
    app.store
        .calls()
        .iter()
        .filter(|c| matches!(c, StoreCall::Insert { .. }) && c.collection() == Some(collection))
        .count()
}

#[tokio::test]
async fn admin_routes_require_a_bearer_token() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/admin/tabs", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["code"], json!("UNAUTHORIZED"));

    let (status, _) = app.get("/api/admin/tabs", Some("not-a-jwt")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn sessions_without_a_role_are_forbidden() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/admin/tabs", Some(&token(None))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], json!("FORBIDDEN"));
}

#[tokio::test]
async fn team_tab_is_listed_for_admins_only() {
    let app = TestApp::new();

    let (_, body) = app.get("/api/admin/tabs", Some(&token(Some(Role::Editor)))).await;
    let ids: Vec<&str> = body["data"]["tabs"].as_array().unwrap().iter().map(|t| t["id"].as_str().unwrap()).collect();
    assert!(!ids.contains(&"team"));
    assert_eq!(ids[0], "jobs");

    let (_, body) = app.get("/api/admin/tabs", Some(&token(Some(Role::Admin)))).await;
    let tabs = body["data"]["tabs"].as_array().unwrap();
    assert_eq!(tabs.last().unwrap()["id"], json!("team"));
    assert_eq!(tabs.last().unwrap()["kind"], json!("team"));
}

#[tokio::test]
async fn section_view_lists_rows_and_filters() {
    let app = TestApp::new();
    app.store.seed(
        "faqs",
        vec![
            json!({"question": "Q1", "answer": "A", "category": "career"}),
            json!({"question": "Q2", "answer": "A", "category": "internship"}),
        ],
    );
    let editor = token(Some(Role::Editor));

    let (status, body) = app.get("/api/admin/sections/faqs", Some(&editor)).await;
    assert_eq!(status, StatusCode::OK);
    let view = &body["data"];
    assert_eq!(view["state"], json!("listing"));
    assert_eq!(view["filters"].as_array().unwrap().len(), 3);
    assert_eq!(view["table"]["body"]["rows"].as_array().unwrap().len(), 2);

    let (_, body) = app.get("/api/admin/sections/faqs?filter=career", Some(&editor)).await;
    assert_eq!(body["data"]["table"]["body"]["rows"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/api/admin/sections/faqs?filter=practices", Some(&editor)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/api/admin/sections/nope", Some(&editor)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn empty_section_shows_placeholder() {
    let app = TestApp::new();
    let (_, body) = app.get("/api/admin/sections/memories", Some(&token(Some(Role::Editor)))).await;
    assert_eq!(body["data"]["table"]["body"]["state"], json!("empty"));
    assert_eq!(body["data"]["table"]["body"]["placeholder"], json!("Brak wpisów w tej sekcji."));
}

#[tokio::test]
async fn saving_without_id_inserts() {
    let app = TestApp::new();
    let editor = token(Some(Role::Editor));
    let draft = json!({
        "title": "Rust Developer",
        "salary": "20 000 PLN",
        "location": "Kraków",
        "contract": "B2B",
        "description": "Systems work",
        "tags": "Rust; Tokio ;  ;Axum"
    });

    let (status, body) = app.send(Method::POST, "/api/admin/sections/job_offers", Some(&editor), Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["state"], json!("listing"));

    let rows = app.store.rows("job_offers");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("tags"), Some(&json!(["Rust", "Tokio", "Axum"])));
    assert_eq!(inserts(&app, "job_offers"), 1);
}

#[tokio::test]
async fn saving_with_id_updates_in_place() {
    let app = TestApp::new();
    let rows = app.store.seed("testimonials", vec![json!({"name": "Ola", "role": "Intern", "quote": "Great"})]);
    let id = rows[0].id().unwrap();

    let draft = json!({"id": id, "name": "Ola", "role": "Junior Dev", "quote": "Great", "created_at": "ignored"});
    let (status, _) =
        app.send(Method::POST, "/api/admin/sections/testimonials", Some(&token(Some(Role::Editor))), Some(draft)).await;
    assert_eq!(status, StatusCode::OK);

    let rows = app.store.rows("testimonials");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].text("role"), "Junior Dev");
    assert!(app.store.calls().iter().any(|c| matches!(c, StoreCall::Update { id: updated, .. } if *updated == id)));
    assert_eq!(inserts(&app, "testimonials"), 0);
}

#[tokio::test]
async fn numeric_id_is_treated_as_an_update() {
    let app = TestApp::new();
    app.store.seed("testimonials", vec![json!({"name": "Ola", "role": "Intern", "quote": "Great"})]);

    let draft = json!({"id": 7, "name": "Ola", "role": "Junior Dev", "quote": "Great"});
    let (status, _) =
        app.send(Method::POST, "/api/admin/sections/testimonials", Some(&token(Some(Role::Editor))), Some(draft)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(inserts(&app, "testimonials"), 0);
    assert_eq!(app.store.rows("testimonials").len(), 1);
}

#[tokio::test]
async fn invalid_drafts_are_rejected_without_writing() {
    let app = TestApp::new();
    let editor = token(Some(Role::Editor));

    let (status, body) = app
        .send(Method::POST, "/api/admin/sections/faqs", Some(&editor), Some(json!({"question": "Q", "answer": "A"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!("VALIDATION_ERROR"));
    assert!(body["field_errors"]["category"].is_string());

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/sections/faqs",
            Some(&editor),
            Some(json!({"question": "Q", "answer": "A", "category": "career", "author": "x"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send(
            Method::POST,
            "/api/admin/sections/faqs",
            Some(&editor),
            Some(json!({"question": "Q", "answer": "A", "category": "sales"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(app.store.rows("faqs").is_empty());
    assert_eq!(inserts(&app, "faqs"), 0);
}

#[tokio::test]
async fn delete_removes_the_row() {
    let app = TestApp::new();
    let rows = app.store.seed("video_gallery", vec![json!({"title": "V", "url": "https://youtu.be/x"})]);
    let id = rows[0].id().unwrap();
    let editor = token(Some(Role::Editor));

    let uri = format!("/api/admin/sections/video_gallery/{}", id);
    let (status, body) = app.send(Method::DELETE, &uri, Some(&editor), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["table"]["body"]["state"], json!("empty"));
    assert!(app.store.rows("video_gallery").is_empty());

    let (status, _) = app.send(Method::DELETE, &uri, Some(&editor), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn uploads_return_public_urls() {
    let app = TestApp::with_upload_policy(UploadPolicy { bucket: "images".into(), max_bytes: 16 });
    let editor = token(Some(Role::Editor));

    let (status, body) = app.send_bytes("/api/admin/uploads/photo.png", &editor, vec![0x89, b'P', b'N', b'G']).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = body["data"]["url"].as_str().unwrap();
    assert!(url.starts_with("memory://images/"));
    assert!(url.ends_with(".png"));

    let (status, _) = app.send_bytes("/api/admin/uploads/notes.txt", &editor, b"hello".to_vec()).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let (status, body) = app.send_bytes("/api/admin/uploads/big.jpg", &editor, vec![0; 20]).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["code"], json!("PAYLOAD_TOO_LARGE"));
}

#[tokio::test]
async fn recruitment_toggle_is_visible_publicly() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            Method::PUT,
            "/api/admin/settings/recruitment",
            Some(&token(Some(Role::Editor))),
            Some(json!({"isOpen": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({"isOpen": true}));

    let (_, body) = app.get("/api/settings/recruitment", None).await;
    assert_eq!(body["data"]["isOpen"], json!(true));
}

#[tokio::test]
async fn team_routes_are_admin_only() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/admin/team", Some(&token(Some(Role::Editor)))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_manages_the_roster() {
    let app = TestApp::new();
    let admin_id = app.store.add_user("admin@rekordit.pl");
    app.store.seed("admins", vec![json!({"id": admin_id, "role": "admin"})]);
    let admin = token_for(&admin_id, Some(Role::Admin));
    let ola = app.store.add_user("ola@rekordit.pl");

    let (status, body) = app
        .send(Method::POST, "/api/admin/team", Some(&admin), Some(json!({"email": "ola@rekordit.pl"})))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["id"], json!(ola));
    assert_eq!(body["data"]["team"]["members"].as_array().unwrap().len(), 2);

    let (status, body) = app
        .send(Method::POST, "/api/admin/team", Some(&admin), Some(json!({"email": "ola@rekordit.pl"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("This user is already a team member."));

    let (status, _) = app
        .send(Method::POST, "/api/admin/team", Some(&admin), Some(json!({"email": "ghost@rekordit.pl"})))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/admin/team/{}", ola);
    let (status, body) = app.send(Method::PATCH, &uri, Some(&admin), Some(json!({"role": "admin"}))).await;
    assert_eq!(status, StatusCode::OK);
    let member = body["data"]["members"]
        .as_array()
        .unwrap()
        .iter()
        .find(|m| m["id"] == json!(ola))
        .cloned()
        .unwrap_or(Value::Null);
    assert_eq!(member["role"], json!("admin"));

    let (status, body) = app.send(Method::DELETE, &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);
    assert!(app.store.user_id("ola@rekordit.pl").is_none());
}
