mod common;

use anyhow::Result;
use axum::http::StatusCode;
use serde_json::{json, Value};

use common::{id_of, TestApp};

async fn seed(app: &TestApp) -> Result<()> {
    for body in [
        json!({ "deceased_name": "Miriam Stern", "date_of_death": "2023-04-06" }),
        json!({ "deceased_name": "Jacob Levi", "date_of_death": "2023-04-02", "observance": "secular" }),
        json!({ "deceased_name": "Esther Katz", "date_of_death": "2023-04-03", "reminder_enabled": false }),
    ] {
        let res = app.post("/api/yahrzeits", body).await?;
        assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
    }
    Ok(())
}

fn deceased(items: &Value) -> Vec<String> {
    items
        .as_array()
        .map(|a| a.iter().filter_map(|o| o["yahrzeit"]["deceased_name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn upcoming_lists_next_dates_soonest_first() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = app.get("/api/yahrzeits/upcoming?today=2024-04-01&days=30").await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let items = res.data();
    assert_eq!(deceased(&items), vec!["Jacob Levi", "Esther Katz", "Miriam Stern"]);

    // 15 Nisan: the second day of Passover 5784
    let miriam = &items[2];
    assert_eq!(miriam["date"], "2024-04-23");
    assert_eq!(miriam["days_until"], 22);
    assert_eq!(miriam["hebrew_date"], json!({ "year": 5784, "month": 1, "day": 15 }));
    assert_eq!(miriam["bucket"], "This month");

    // secular observance keeps the civil date
    assert_eq!(items[0]["date"], "2024-04-02");
    assert_eq!(items[0]["bucket"], "This week");

    let res = app.get("/api/yahrzeits/upcoming?today=2024-04-01&days=10").await?;
    assert_eq!(deceased(&res.data()), vec!["Jacob Levi"]);
    Ok(())
}

#[tokio::test]
async fn upcoming_can_be_grouped() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = app.get("/api/yahrzeits/upcoming?today=2024-04-01&days=30&group=bucket").await?;
    let groups = res.data();
    assert_eq!(groups[0]["label"], "This week");
    assert_eq!(deceased(&groups[0]["items"]), vec!["Jacob Levi"]);
    assert_eq!(groups[1]["label"], "This month");
    assert_eq!(deceased(&groups[1]["items"]), vec!["Esther Katz", "Miriam Stern"]);

    let res = app.get("/api/yahrzeits/upcoming?today=2024-04-01&days=30&group=month").await?;
    let months = res.data();
    assert_eq!(months.as_array().map(Vec::len), Some(1));
    assert_eq!(months[0]["label"], "April 2024");
    Ok(())
}

#[tokio::test]
async fn reminders_skip_disabled_records() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = app.get("/api/yahrzeits/reminders?today=2024-04-15&days=10").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(deceased(&res.data()), vec!["Miriam Stern"]);

    let res = app.get("/api/yahrzeits/reminders?days=5000").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn hebrew_date_without_civil_date() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app
        .post("/api/yahrzeits", json!({ "deceased_name": "Rachel Cohen", "hebrew_month": 1, "hebrew_day": 15 }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text());
    let id = id_of(&res.data())?;
    assert!(res.data()["next_date"].is_string());

    let res = app.get("/api/yahrzeits/upcoming?today=2024-04-01&days=30").await?;
    assert_eq!(res.data()[0]["date"], "2024-04-23");

    let res = app.get(&format!("/api/yahrzeits/{}", id)).await?;
    assert_eq!(res.data()["deceased_name"], "Rachel Cohen");
    Ok(())
}

#[tokio::test]
async fn yahrzeit_needs_a_date() -> Result<()> {
    let app = TestApp::new().await?;
    let res = app.post("/api/yahrzeits", json!({ "deceased_name": "Unknown" })).await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.json()["code"], "VALIDATION_ERROR");
    Ok(())
}
