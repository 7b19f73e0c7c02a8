mod common;

use anyhow::Result;
use axum::http::{Method, StatusCode};
use serde_json::{json, Value};

use common::{decimal, TestApp};
use kehilla_api::database::Store;
use kehilla_api::import::{self, ImportFormat, ImportKind, ImportOptions, RowStatus};
use kehilla_api::types::OrgScope;

async fn upload(app: &TestApp, kind: &str, stage: &str, csv: &str) -> Result<common::TestResponse> {
    let org = app.org.to_string();
    app.send_raw(
        Method::POST,
        &format!("/api/import/{}/{}", kind, stage),
        Some(&org),
        Some("text/csv"),
        csv.as_bytes().to_vec(),
    )
    .await
}

fn rows(report: &Value, bucket: &str) -> Vec<u64> {
    report[bucket].as_array().map(|a| a.iter().filter_map(|r| r["row"].as_u64()).collect()).unwrap_or_default()
}

const MEMBERS: &str = "First Name,Last Name,Phone,Email\n\
Leah,Stern,212-555-0134,\n\
Dov,Frank,,dov@example.org\n\
Sara,Levi,917 555 0100,sara@example.org\n\
Rivka,Katz,646-555-0199,leah@example.org\n\
Sara L,Levi,9175550100,\n\
Moshe,Cohen,2125550134,avi@example.org\n";

async fn seed(app: &TestApp) -> Result<()> {
    let res = app
        .post(
            "/api/donors",
            json!({ "first_name": "Leah", "last_name": "Stern", "phone": "2125550134", "email": "leah@example.org" }),
        )
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    let res = app
        .post("/api/donors", json!({ "first_name": "Avi", "last_name": "Katz", "email": "avi@example.org" }))
        .await?;
    assert_eq!(res.status, StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn donor_rows_are_classified() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = upload(&app, "donors", "validate", MEMBERS).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let report = &res.data()["report"];

    assert_eq!(report["total_rows"], 6);
    assert_eq!(rows(report, "valid"), vec![4]);
    assert_eq!(rows(report, "to_merge"), vec![2, 5, 6, 7]);
    assert_eq!(rows(report, "errors"), vec![3]);
    assert!(rows(report, "link_failed").is_empty());

    // row 6 folds into the donor created by row 4 of the same file
    let merges = report["to_merge"].as_array().cloned().unwrap_or_default();
    let in_file = merges.iter().find(|m| m["row"] == 6).cloned().unwrap_or(Value::Null);
    assert_eq!(in_file["record"]["target_row"], 4);

    // phone wins over email: row 7 matches Leah by phone, not Avi by email
    let leah_row = merges.iter().find(|m| m["row"] == 2).cloned().unwrap_or(Value::Null);
    let moshe_row = merges.iter().find(|m| m["row"] == 7).cloned().unwrap_or(Value::Null);
    assert_eq!(moshe_row["record"]["target"], leah_row["record"]["target"]);

    // row 5 has an unknown phone and falls back to email
    let rivka_row = merges.iter().find(|m| m["row"] == 5).cloned().unwrap_or(Value::Null);
    assert_eq!(rivka_row["record"]["target"], leah_row["record"]["target"]);

    // validation never writes
    assert_eq!(app.store.list_donors(&OrgScope::Organization(app.org)).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn simulate_previews_every_row() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = upload(&app, "donors", "simulate", MEMBERS).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let simulation = &res.data()["simulation"];
    assert_eq!(simulation["add"], 1);
    assert_eq!(simulation["merge"], 4);
    assert_eq!(simulation["skip"], 1);

    let preview = simulation["preview_csv"].as_str().unwrap_or_default();
    let lines: Vec<&str> = preview.lines().collect();
    assert_eq!(lines[0], "row,action,detail");
    assert_eq!(lines.len(), 7);
    assert!(lines[2].starts_with("3,SKIP,"));
    assert!(lines[3].starts_with("4,ADD,"));
    Ok(())
}

#[tokio::test]
async fn commit_writes_and_merges() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let res = upload(&app, "donors", "commit", MEMBERS).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let outcome = &res.data()["outcome"];
    assert_eq!(outcome["added"], 1);
    assert_eq!(outcome["merged"], 4);
    assert_eq!(outcome["skipped"], 1);
    assert_eq!(outcome["failed"], 0);

    let donors = app.store.list_donors(&OrgScope::Organization(app.org)).await?;
    assert_eq!(donors.len(), 3);
    let sara = donors.iter().find(|d| d.phone.as_deref() == Some("9175550100")).cloned();
    assert_eq!(sara.and_then(|d| d.email), Some("sara@example.org".to_string()));
    Ok(())
}

#[tokio::test]
async fn donation_rows_link_to_existing_donors() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;

    let csv = "phone,amount,date,method\n\
               212-555-0134,$180.00,2024-03-01,check\n\
               7185550000,36,2024-03-02,cash\n\
               212-555-0134,,2024-03-03,\n\
               212-555-0134,-5,2024-03-04,\n";
    let res = upload(&app, "donations", "validate", csv).await?;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text());
    let report = &res.data()["report"];
    assert_eq!(rows(report, "valid"), vec![2]);
    assert_eq!(rows(report, "link_failed"), vec![3, 5]);
    assert_eq!(rows(report, "errors"), vec![4]);

    let res = upload(&app, "donations", "commit", csv).await?;
    assert_eq!(res.data()["outcome"]["added"], 1);

    let res = app.get("/api/donations").await?;
    let listing = res.data();
    assert_eq!(listing["total"], 1);
    assert_eq!(decimal(&listing["items"][0]["amount"]), rust_decimal::Decimal::from(180));
    assert_eq!(listing["items"][0]["currency"], "USD");
    Ok(())
}

#[tokio::test]
async fn unknown_kind_and_stage_are_not_found() -> Result<()> {
    let app = TestApp::new().await?;
    let res = upload(&app, "members", "validate", MEMBERS).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = upload(&app, "donors", "publish", MEMBERS).await?;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = upload(&app, "donors", "validate", "").await?;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn commit_keeps_going_after_a_failed_row() -> Result<()> {
    let app = TestApp::new().await?;
    seed(&app).await?;
    let options = ImportOptions::new(app.org);
    let parsed = import::parse(MEMBERS.as_bytes(), ImportFormat::Csv)?;
    let report = import::validate(app.store.as_ref(), ImportKind::Donors, &parsed.rows, &options).await?;

    // the merge target of rows 2, 5 and 7 disappears between validation and commit
    let scope = OrgScope::Organization(app.org);
    let leah = app
        .store
        .find_donor_by_phone(app.org, "2125550134")
        .await?
        .ok_or_else(|| anyhow::anyhow!("seeded donor missing"))?;
    app.store.delete_donor(&scope, leah.id).await?;

    let mut calls = 0;
    let outcome = import::commit(app.store.as_ref(), report, |_, _| calls += 1).await?;
    assert_eq!(outcome.failed, 3);
    assert_eq!(outcome.added, 1);
    assert_eq!(outcome.merged, 1);
    assert_eq!(calls, 5);

    let statuses: Vec<(usize, RowStatus)> = outcome.lines.iter().map(|l| (l.row, l.status)).collect();
    assert_eq!(
        statuses,
        vec![
            (2, RowStatus::Failed),
            (3, RowStatus::Skipped),
            (4, RowStatus::Added),
            (5, RowStatus::Failed),
            (6, RowStatus::Merged),
            (7, RowStatus::Failed),
        ]
    );
    assert!(outcome.result_csv.starts_with("row,action,status,message"));
    Ok(())
}
