mod common;

use campus_complaints::models::Complaint;
use sea_orm::EntityTrait;
use serde_json::Value;

#[tokio::test]
async fn anonymous_submission_stores_no_identity() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app
        .client
        .post(app.url("/complaints"))
        .json(&serde_json::json!({
            "category": "Security",
            "title": "  Broken gate lock  ",
            "details": "The east gate has not locked for a week",
            "is_anonymous": true,
            "student_name": "Should Be Dropped",
            "student_id": "S-999",
            "student_email": "dropped@uni.test",
            "priority": "High"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id: uuid::Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    let stored = Complaint::find_by_id(id)
        .one(app.conn())
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_anonymous);
    assert_eq!(stored.title, "Broken gate lock");
    assert_eq!(stored.priority.as_deref(), Some("High"));
    assert_eq!(stored.student_name, None);
    assert_eq!(stored.student_id, None);
    assert_eq!(stored.student_email, None);
}

#[tokio::test]
async fn named_submission_keeps_identity() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app
        .client
        .post(app.url("/complaints"))
        .json(&serde_json::json!({
            "category": "Academics",
            "title": "Missing grades",
            "details": "CSC 301 grades are not on the portal",
            "is_anonymous": false,
            "student_name": "Ada Obi",
            "student_id": "S-100",
            "student_email": "ada@uni.test"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: Value = resp.json().await.unwrap();
    let id: uuid::Uuid = body["data"]["id"].as_str().unwrap().parse().unwrap();

    let stored = Complaint::find_by_id(id)
        .one(app.conn())
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_anonymous);
    assert_eq!(stored.student_email.as_deref(), Some("ada@uni.test"));
    assert_eq!(stored.priority, None);
}

#[tokio::test]
async fn invalid_submission_inserts_nothing() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let resp = app
        .client
        .post(app.url("/complaints"))
        .json(&serde_json::json!({
            "category": "Water",
            "title": "No water",
            "details": "Block C",
            "is_anonymous": false,
            "student_email": "not-an-email"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(
        body["fields"]["student_email"],
        "Please enter a valid email address"
    );
    assert_eq!(common::complaint_count(&app).await, 0);
}

#[tokio::test]
async fn pagination_reports_totals_and_empty_tail() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    common::seed_complaints(&app, "Water", 120, 0).await;
    let token = common::admin_token(&app).await;

    let fetch = |page: u64| {
        let client = app.client.clone();
        let url = app.url(&format!("/admin/complaints?page={page}&per_page=50"));
        let token = token.clone();
        async move {
            let resp = client.get(url).bearer_auth(token).send().await.unwrap();
            assert_eq!(resp.status(), 200);
            resp.json::<Value>().await.unwrap()
        }
    };

    let first = fetch(1).await;
    assert_eq!(first["data"]["total_count"], 120);
    assert_eq!(first["data"]["total_pages"], 3);
    assert_eq!(first["data"]["complaints"].as_array().unwrap().len(), 50);
    // Newest first
    assert_eq!(first["data"]["complaints"][0]["title"], "Water complaint 119");

    let third = fetch(3).await;
    assert_eq!(third["data"]["complaints"].as_array().unwrap().len(), 20);
    assert_eq!(third["data"]["complaints"][19]["title"], "Water complaint 0");

    let fourth = fetch(4).await;
    assert_eq!(fourth["data"]["complaints"].as_array().unwrap().len(), 0);
    assert_eq!(fourth["data"]["total_count"], 120);
    assert_eq!(fourth["data"]["page"], 4);
}

#[tokio::test]
async fn pages_near_u64_max_come_back_empty() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    common::seed_complaints(&app, "Water", 3, 0).await;
    let token = common::admin_token(&app).await;

    // The last two overflow (page - 1) * per_page; the first does not.
    for page in [u64::MAX / 50, u64::MAX / 50 + 2, u64::MAX] {
        let resp = app
            .client
            .get(app.url(&format!("/admin/complaints?page={page}&per_page=50")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200, "page {page}");
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["data"]["complaints"].as_array().unwrap().len(), 0);
        assert_eq!(body["data"]["total_count"], 3);
        assert_eq!(body["data"]["total_pages"], 1);
        assert_eq!(body["data"]["page"], page);
    }
}

#[tokio::test]
async fn category_filter_is_exact() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    common::seed_complaints(&app, "Electricity", 3, 0).await;
    common::seed_complaints(&app, "Water", 2, 10).await;
    let token = common::admin_token(&app).await;

    for (category, expected) in [
        ("Electricity", 3),
        ("electricity", 0),
        ("%20Electricity", 0),
        ("Electricity%20", 0),
        ("ALL", 5),
        ("%20", 5),
    ] {
        let resp = app
            .client
            .get(app.url(&format!("/admin/complaints?category={category}")))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        let body: Value = resp.json().await.unwrap();
        assert_eq!(
            body["data"]["total_count"], expected,
            "category filter {category}"
        );
    }
}

#[tokio::test]
async fn single_complaint_and_missing_one() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    common::seed_complaints(&app, "Noise", 1, 0).await;
    let token = common::admin_token(&app).await;

    let stored = Complaint::find().one(app.conn()).await.unwrap().unwrap();

    let resp = app
        .client
        .get(app.url(&format!("/admin/complaints/{}", stored.id)))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["category"], "Noise");

    let resp = app
        .client
        .get(app.url(&format!("/admin/complaints/{}", uuid::Uuid::new_v4())))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stats_are_sorted_with_percentages() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    common::seed_complaints(&app, "Noise", 1, 0).await;
    common::seed_complaints(&app, "Water", 2, 10).await;
    common::seed_complaints(&app, "Security", 1, 20).await;
    let token = common::admin_token(&app).await;

    let resp = app
        .client
        .get(app.url("/admin/stats"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let stats = body["data"]["stats"].as_array().unwrap();
    assert_eq!(body["data"]["total"], 4);
    assert_eq!(stats[0]["label"], "Water");
    assert_eq!(stats[0]["count"], 2);
    assert_eq!(stats[0]["percentage"], 50);
    let total: u64 = stats.iter().map(|s| s["count"].as_u64().unwrap()).sum();
    assert_eq!(total, 4);

    let resp = app
        .client
        .get(app.url("/admin/stats?by=priority"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["by"], "priority");
    assert_eq!(body["data"]["stats"][0]["label"], "Unspecified");
    assert_eq!(body["data"]["stats"][0]["percentage"], 100);
}
