mod common;

use serde_json::Value;

#[tokio::test]
async fn health_reports_missing_database() {
    let app = common::spawn_app_without_db().await;

    let resp = app.client.get(&app.addr).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["status"], "not_configured");
    assert_eq!(body["database"], "not_configured");
}

#[tokio::test]
async fn validation_runs_before_the_store() {
    let app = common::spawn_app_without_db().await;

    let resp = app
        .client
        .post(app.url("/complaints"))
        .json(&serde_json::json!({
            "category": "Water",
            "title": "No water",
            "details": "Block C has had no water since Monday",
            "is_anonymous": false
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "validation_failed");
    let fields = body["fields"].as_object().unwrap();
    assert_eq!(fields.len(), 3);
    assert!(fields.contains_key("student_name"));
    assert!(fields.contains_key("student_id"));
    assert!(fields.contains_key("student_email"));
}

#[tokio::test]
async fn valid_submission_reports_not_configured() {
    let app = common::spawn_app_without_db().await;

    let resp = app
        .client
        .post(app.url("/complaints"))
        .json(&serde_json::json!({
            "category": "Noise",
            "title": "Generator at night",
            "details": "Runs past midnight",
            "is_anonymous": true
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 503);

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "database_not_configured");
    assert_eq!(body["retryable"], false);
}

#[tokio::test]
async fn session_predicate_is_false_without_token() {
    let app = common::spawn_app_without_db().await;

    let resp = app
        .client
        .get(app.url("/auth/session"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-store");

    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["authenticated"], false);
    assert_eq!(body["data"]["login_path"], "/admin/login");
    assert!(body["data"].get("admin").is_none());
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = common::spawn_app_without_db().await;

    for path in [
        "/admin/complaints",
        "/admin/stats",
        "/admin/dashboard",
        "/admin/export/complaints",
        "/admin/export/summary",
        "/auth/me",
    ] {
        let resp = app.client.get(app.url(path)).send().await.unwrap();
        assert_eq!(resp.status(), 401, "GET {path} should be gated");
    }

    let resp = app
        .client
        .post(app.url("/auth/logout"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn login_requires_both_fields() {
    let app = common::spawn_app_without_db().await;

    let resp = app
        .client
        .post(app.url("/auth/login"))
        .json(&serde_json::json!({ "email": "", "password": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Email and password required");
}

#[tokio::test]
async fn options_list_categories_and_priorities() {
    let app = common::spawn_app_without_db().await;

    let resp = app
        .client
        .get(app.url("/complaints/options"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["x-content-type-options"], "nosniff");

    let body: Value = resp.json().await.unwrap();
    let categories = body["data"]["categories"].as_array().unwrap();
    assert!(categories.iter().any(|c| c == "Electricity"));
    assert_eq!(
        body["data"]["priorities"],
        serde_json::json!(["Low", "Medium", "High", "Critical"])
    );
}
