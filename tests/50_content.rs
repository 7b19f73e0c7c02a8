mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

use common::TestApp;

fn template(row: Uuid, column: Uuid, block: Uuid) -> Value {
    json!({
        "rows": [{
            "id": row,
            "columns": [{
                "id": column,
                "width": 12,
                "blocks": [{ "id": block, "type": "text", "body": { "en": "Welcome", "he": "ברוכים הבאים" } }]
            }]
        }]
    })
}

fn row_count(page: &Value) -> usize {
    page["document"]["rows"].as_array().map(Vec::len).unwrap_or(0)
}

#[tokio::test]
async fn organization_page_is_cloned_from_the_global_template() -> Result<()> {
    let app = TestApp::new().await?;
    let (row, column, block) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    let res = app.get("/api/content/home").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["source"], "empty");

    let res = app
        .send(Method::PUT, "/api/content/home", Some("all"), Some(template(row, column, block)))
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());

    let page = app.get("/api/content/home").await?.data();
    assert_eq!(page["source"], "global");
    assert_eq!(page["document"]["rows"][0]["columns"][0]["blocks"][0]["body"]["en"], "Welcome");

    // the first edit copies the template into the organization
    let res = app
        .post(
            "/api/content/home/edit",
            json!([
                { "op": "add_row" },
                { "op": "set_block_text", "block_id": block, "locale": "en", "text": "Shalom" }
            ]),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    assert_eq!(res.data()["rows"].as_array().map(Vec::len), Some(2));

    let page = app.get("/api/content/home").await?.data();
    assert_eq!(page["source"], "organization");
    assert_eq!(page["document"]["rows"][0]["columns"][0]["blocks"][0]["body"]["en"], "Shalom");

    let global = app.send(Method::GET, "/api/content/home", Some("all"), None).await?.data();
    assert_eq!(row_count(&global), 1);
    assert_eq!(global["document"]["rows"][0]["columns"][0]["blocks"][0]["body"]["en"], "Welcome");
    Ok(())
}

#[tokio::test]
async fn a_failing_edit_leaves_the_page_unchanged() -> Result<()> {
    let app = TestApp::new().await?;
    let (row, column, block) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    let res = app.put("/api/content/home", template(row, column, block)).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());

    let res = app
        .post(
            "/api/content/home/edit",
            json!([{ "op": "add_row" }, { "op": "remove_row", "row_id": Uuid::new_v4() }]),
        )
        .await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    let res = app
        .post("/api/content/home/edit", json!([{ "op": "add_column", "row_id": row, "width": 4 }]))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST, "a full row cannot take another column");

    let res = app
        .post("/api/content/home/edit", json!([{ "op": "set_column_width", "column_id": column, "width": 13 }]))
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let page = app.get("/api/content/home").await?.data();
    assert_eq!(page["source"], "organization");
    assert_eq!(row_count(&page), 1);
    Ok(())
}

#[tokio::test]
async fn media_blocks_need_web_urls() -> Result<()> {
    let app = TestApp::new().await?;
    let (row, column, block) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    app.put("/api/content/home", template(row, column, block)).await?;

    let res = app
        .post(
            "/api/content/home/edit",
            json!([{ "op": "add_block", "column_id": column, "kind": { "type": "image", "url": "javascript:alert(1)" } }]),
        )
        .await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/content/home/edit",
            json!([{ "op": "add_block", "column_id": column, "kind": { "type": "video", "url": "https://videos.example.org/purim.mp4" } }]),
        )
        .await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    assert_eq!(res.data()["rows"][0]["columns"][0]["blocks"].as_array().map(Vec::len), Some(2));
    Ok(())
}

#[tokio::test]
async fn reset_falls_back_to_the_template() -> Result<()> {
    let app = TestApp::new().await?;
    let (row, column, block) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
    app.send(Method::PUT, "/api/content/home", Some("all"), Some(template(row, column, block))).await?;
    app.post("/api/content/home/edit", json!([{ "op": "add_row", "index": 0 }])).await?;

    let res = app.delete("/api/content/home").await?;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.data()["removed"], true);

    let page = app.get("/api/content/home").await?.data();
    assert_eq!(page["source"], "global");
    assert_eq!(row_count(&page), 1);

    let res = app.delete("/api/content/home").await?;
    assert_eq!(res.data()["removed"], false);
    Ok(())
}
