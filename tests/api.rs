mod common;

use axum::http::{StatusCode, header};
use common::{PNG_BYTES, TestApp, test_app};
use serde_json::{Value, json};

async fn verify(app: &TestApp, id: &str, cookie: &str) -> Value {
    let reply = app
        .send_json(
            "PUT",
            &format!("/api/profiles/{id}"),
            json!({ "status": "Verified" }),
            Some(cookie),
        )
        .await;
    assert_eq!(reply.status, StatusCode::OK, "{}", reply.text());
    reply.json()
}

fn id(profile: &Value) -> &str {
    profile["id"].as_str().unwrap()
}

#[tokio::test]
async fn submission_is_hidden_until_verified() {
    let app = test_app().await;
    let profile = app.submit("Alice Johnson", "alice@example.com").await;
    assert_eq!(profile["status"], "Pending");
    assert_eq!(profile["slug"], "alice-johnson");
    assert!(profile["createdAt"].is_string());

    assert_eq!(app.get("/api/profiles/alice-johnson", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/profile/alice-johnson", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.get("/api/profiles", None).await.json()["total"], 0);

    let cookie = app.admin_cookie().await;
    let admin_view = app.get("/profile/alice-johnson", Some(&cookie)).await;
    assert_eq!(admin_view.status, StatusCode::OK);
    assert!(admin_view.text().contains("This profile is Pending"));

    let verified = verify(&app, id(&profile), &cookie).await;
    assert_eq!(verified["status"], "Verified");

    let public = app.get("/api/profiles/alice-johnson", None).await;
    assert_eq!(public.status, StatusCode::OK);
    assert_eq!(public.json()["name"], "Alice Johnson");

    let listing = app.get("/api/profiles", None).await.json();
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["profiles"][0]["slug"], "alice-johnson");
}

#[tokio::test]
async fn profile_page_carries_seo_tags() {
    let app = test_app().await;
    let profile = app.submit("Alice Johnson", "alice@example.com").await;
    let cookie = app.admin_cookie().await;
    verify(&app, id(&profile), &cookie).await;

    let page = app.get("/profile/alice-johnson", None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(
        page.headers[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/html")
    );

    let html = page.text();
    assert!(html.contains("<title>Alice Johnson"));
    assert!(html.contains("property=\"og:title\""));
    assert!(html.contains("name=\"twitter:card\""));
    assert!(html.contains("https://profiles.example/profile/alice-johnson"));
    assert!(html.contains("application/ld+json"));
    assert!(!html.contains("This profile is"));

    let index = app.get("/", None).await;
    assert_eq!(index.status, StatusCode::OK);
    assert!(index.text().contains("Alice Johnson"));
    assert!(index.text().contains("/profile/alice-johnson"));
}

#[tokio::test]
async fn unknown_profile_page_is_not_found() {
    let app = test_app().await;
    let reply = app.get("/profile/nobody", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(reply.text().contains("profile"));

    let reply = app.get("/api/profiles/nobody", None).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert_eq!(reply.json()["message"], "Profile not found");
}

#[tokio::test]
async fn admin_routes_require_login() {
    let app = test_app().await;
    let profile = app.submit("Bob Smith", "bob@example.com").await;
    let uri = format!("/api/profiles/{}", id(&profile));

    let put = app
        .send_json("PUT", &uri, json!({ "status": "Verified" }), None)
        .await;
    assert_eq!(put.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.delete(&uri, None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/admin/activity", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(app.get("/api/admin/analytics", None).await.status, StatusCode::UNAUTHORIZED);

    let cookie = app.admin_cookie().await;
    let still_pending = app
        .get("/api/profiles/bob-smith", Some(&cookie))
        .await
        .json();
    assert_eq!(still_pending["status"], "Pending");
}

#[tokio::test]
async fn bad_login_is_refused() {
    let app = test_app().await;
    let reply = app
        .send_json(
            "POST",
            "/api/admin/login",
            json!({ "username": "admin", "password": "guess" }),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

    let session = app.get("/api/admin/session", None).await;
    assert_eq!(session.json()["isAdmin"], false);
}

#[tokio::test]
async fn logout_ends_the_admin_session() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;
    assert_eq!(
        app.get("/api/admin/session", Some(&cookie)).await.json()["isAdmin"],
        true
    );

    let reply = app
        .send_json("POST", "/api/admin/logout", json!({}), Some(&cookie))
        .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(
        app.get("/api/admin/session", Some(&cookie)).await.json()["isAdmin"],
        false
    );
}

#[tokio::test]
async fn invalid_fields_are_reported() {
    let app = test_app().await;
    let reply = app
        .send_multipart(
            "POST",
            "/api/profiles",
            &[
                ("name", "Young Person"),
                ("email", "not-an-email"),
                ("profession", "Student"),
                ("age", "17"),
            ],
            None,
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let body = reply.json();
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"age"), "{fields:?}");
    assert!(fields.contains(&"email"), "{fields:?}");

    let missing = app
        .send_multipart("POST", "/api/profiles", &[("name", "Nobody")], None, None)
        .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_email_is_a_bad_request() {
    let app = test_app().await;
    app.submit("Alice Johnson", "alice@example.com").await;

    let reply = app
        .send_multipart(
            "POST",
            "/api/profiles",
            &[
                ("name", "Alice Two"),
                ("email", "Alice@Example.com"),
                ("profession", "Engineer"),
            ],
            None,
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["message"], "Profile with this email already exists");
}

#[tokio::test]
async fn json_submission_is_accepted() {
    let app = test_app().await;
    let reply = app
        .send_json(
            "POST",
            "/api/profiles",
            json!({
                "name": "Carol White",
                "email": "carol@example.com",
                "profession": "Designer",
                "age": 34,
                "skills": "Figma, Typography",
                "status": "Verified",
            }),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());

    let profile = reply.json();
    assert_eq!(profile["age"], 34);
    assert_eq!(profile["skills"], "Figma, Typography");
    assert_eq!(profile["status"], "Pending");
}

#[tokio::test]
async fn non_image_upload_is_rejected_and_not_stored() {
    let app = test_app().await;
    let reply = app
        .send_multipart(
            "POST",
            "/api/profiles",
            &[
                ("name", "Eve Mallory"),
                ("email", "eve@example.com"),
                ("profession", "Tester"),
            ],
            Some(("avatar.png", "image/png", b"<?php system($_GET['c']); ?>")),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.json()["errors"][0]["field"], "profilePhoto");

    let stored = std::fs::read_dir(app.upload_dir.path()).unwrap().count();
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn photo_is_stored_and_served() {
    let app = test_app().await;
    let reply = app
        .send_multipart(
            "POST",
            "/api/profiles",
            &[
                ("name", "Dana Scully"),
                ("email", "dana@example.com"),
                ("profession", "Doctor"),
            ],
            Some(("me.png", "image/png", PNG_BYTES)),
            None,
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.text());

    let profile = reply.json();
    let photo = profile["profilePhoto"].as_str().unwrap().to_owned();
    assert!(photo.starts_with("/uploads/profilePhoto-"), "{photo}");
    assert!(photo.ends_with(".png"));

    let served = app.get(&photo, None).await;
    assert_eq!(served.status, StatusCode::OK);
    assert_eq!(served.body, PNG_BYTES);

    let cookie = app.admin_cookie().await;
    let deleted = app
        .delete(&format!("/api/profiles/{}", id(&profile)), Some(&cookie))
        .await;
    assert_eq!(deleted.status, StatusCode::OK);
    assert_eq!(app.get(&photo, None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn delete_then_gone() {
    let app = test_app().await;
    let profile = app.submit("Bob Smith", "bob@example.com").await;
    let cookie = app.admin_cookie().await;
    verify(&app, id(&profile), &cookie).await;
    let uri = format!("/api/profiles/{}", id(&profile));

    let reply = app.delete(&uri, Some(&cookie)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.json()["message"], "Profile deleted successfully");

    assert_eq!(app.get("/api/profiles/bob-smith", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(app.delete(&uri, Some(&cookie)).await.status, StatusCode::NOT_FOUND);

    let activity = app.get("/api/admin/activity", Some(&cookie)).await.json();
    let actions: Vec<&str> = activity
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, ["Deleted", "Verified", "Created"]);
    assert_eq!(activity[0]["profileName"], "Bob Smith");
}

#[tokio::test]
async fn admin_filters_by_status_and_sees_counts() {
    let app = test_app().await;
    let alice = app.submit("Alice Johnson", "alice@example.com").await;
    app.submit("Bob Smith", "bob@example.com").await;
    let cookie = app.admin_cookie().await;
    verify(&app, id(&alice), &cookie).await;

    let pending = app
        .get("/api/profiles?status=Pending", Some(&cookie))
        .await
        .json();
    assert_eq!(pending["total"], 1);
    assert_eq!(pending["profiles"][0]["name"], "Bob Smith");

    let all = app.get("/api/profiles", Some(&cookie)).await.json();
    assert_eq!(all["total"], 2);

    // the filter is ignored for the public
    let public = app.get("/api/profiles?status=Pending", None).await.json();
    assert_eq!(public["total"], 1);
    assert_eq!(public["profiles"][0]["name"], "Alice Johnson");

    let analytics = app.get("/api/admin/analytics", Some(&cookie)).await.json();
    assert_eq!(analytics["pending"], 1);
    assert_eq!(analytics["verified"], 1);
    assert_eq!(analytics["rejected"], 0);
    assert_eq!(analytics["today"], 2);
    assert_eq!(analytics["month"], 2);
}

#[tokio::test]
async fn reviewed_profile_cannot_be_reopened() {
    let app = test_app().await;
    let profile = app.submit("Bob Smith", "bob@example.com").await;
    let cookie = app.admin_cookie().await;
    let uri = format!("/api/profiles/{}", id(&profile));

    let rejected = app
        .send_json("PUT", &uri, json!({ "status": "Rejected" }), Some(&cookie))
        .await;
    assert_eq!(rejected.status, StatusCode::OK);

    let reopen = app
        .send_json("PUT", &uri, json!({ "status": "Pending" }), Some(&cookie))
        .await;
    assert_eq!(reopen.status, StatusCode::BAD_REQUEST);
    assert_eq!(reopen.json()["errors"][0]["field"], "status");

    let unknown = app
        .send_json("PUT", "/api/profiles/missing", json!({ "status": "Verified" }), Some(&cookie))
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_and_paging_over_http() {
    let app = test_app().await;
    let cookie = app.admin_cookie().await;
    for n in 1..=13 {
        let profile = app
            .submit(&format!("Person {n}"), &format!("person{n}@example.com"))
            .await;
        verify(&app, id(&profile), &cookie).await;
    }

    let second = app.get("/api/profiles?page=2&limit=12", None).await.json();
    assert_eq!(second["total"], 13);
    assert_eq!(second["profiles"].as_array().unwrap().len(), 1);

    let lenient = app.get("/api/profiles?page=zero&limit=-1", None).await.json();
    assert_eq!(lenient["profiles"].as_array().unwrap().len(), 12);

    let found = app.get("/api/profiles?search=person%2012", None).await.json();
    assert_eq!(found["total"], 1);

    let index = app.get("/?page=2", None).await.text();
    assert!(index.contains("Page 2 of 2"));
    assert!(index.contains("Person 1<"));
}
