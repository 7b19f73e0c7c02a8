mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{id_of, TestApp};

#[tokio::test]
async fn create_show_update_delete_donor() -> Result<()> {
    let app = TestApp::new().await?;

    let res = app
        .post(
            "/api/donors",
            json!({ "first_name": "Leah", "last_name": "Stern", "phone": "(212) 555-0134", "email": "Leah@Example.org" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
    let donor = res.data();
    assert_eq!(donor["phone"], "2125550134");
    assert_eq!(donor["email"], "leah@example.org");
    let id = id_of(&donor)?;

    let res = app.get(&format!("/api/donors/{}", id)).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["success"], true);
    assert_eq!(res.data()["last_name"], "Stern");

    let res = app.put(&format!("/api/donors/{}", id), json!({ "city": "Teaneck" })).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    assert_eq!(res.data()["city"], "Teaneck");
    assert_eq!(res.data()["first_name"], "Leah");

    let res = app.delete(&format!("/api/donors/{}", id)).await?;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let res = app.get(&format!("/api/donors/{}", id)).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.json()["code"], "NOT_FOUND");
    Ok(())
}

#[tokio::test]
async fn donor_without_a_name_is_a_validation_error() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.post("/api/donors", json!({ "phone": "2125550134" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
    Ok(())
}

#[tokio::test]
async fn organization_header_is_required_and_checked() -> Result<()> {
    let app = TestApp::new().await?;

    let res = app.send(Method::GET, "/api/donors", None, None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app.send(Method::GET, "/api/donors", Some("not-a-uuid"), None).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let unknown = uuid::Uuid::new_v4().to_string();
    let res = app.send(Method::GET, "/api/donors", Some(&unknown), None).await?;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    Ok(())
}

#[tokio::test]
async fn donors_are_isolated_per_organization() -> Result<()> {
    let app = TestApp::new().await?;
    let other = app.add_organization("Adath Israel").await?.to_string();

    let mine = app.donor("Leah", "Stern", "2125550134").await?;
    let res = app
        .send(Method::POST, "/api/donors", Some(&other), Some(json!({ "first_name": "Dov", "last_name": "Frank" })))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);

    let res = app.get("/api/donors").await?;
    assert_eq!(res.data()["total"], 1);

    let res = app.send(Method::GET, &format!("/api/donors/{}", mine), Some(&other), None).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app.send(Method::GET, "/api/donors", Some("all"), None).await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["total"], 2);

    // writes need one concrete organization
    let res = app
        .send(Method::POST, "/api/donors", Some("all"), Some(json!({ "first_name": "Dov", "last_name": "Frank" })))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn lookup_prefers_phone_over_email() -> Result<()> {
    let app = TestApp::new().await?;
    let by_phone = app.donor("Leah", "Stern", "212-555-0134").await?;
    let res = app
        .post("/api/donors", json!({ "first_name": "Dov", "last_name": "Frank", "email": "dov@example.org" }))
        .await?;
    let by_email = id_of(&res.data())?;

    let res = app.get("/api/donors/lookup?phone=2125550134&email=dov%40example.org").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(id_of(&res.data())?, by_phone);

    let res = app.get("/api/donors/lookup?phone=9999999&email=DOV%40example.org").await?;
    assert_eq!(id_of(&res.data())?, by_email);

    let res = app.get("/api/donors/lookup?phone=9999999").await?;
    assert!(res.data().is_null());

    let res = app.get("/api/donors/lookup").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn donor_with_pledges_cannot_be_deleted() -> Result<()> {
    let app = TestApp::new().await?;
    let donor = app.donor("Leah", "Stern", "2125550134").await?;
    let res = app.post("/api/pledges", json!({ "donor_id": donor, "total_amount": 500 })).await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());

    let res = app.delete(&format!("/api/donors/{}", donor)).await?;
    assert_eq!(res.status, StatusCode::CONFLICT);
    Ok(())
}

#[tokio::test]
async fn health_reports_store_status() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.send(Method::GET, "/health", None, None).await?;
    assert_eq!(res.status, StatusCode::OK);
    Ok(())
}
