mod common;

use anyhow::Result;
use reqwest::{header, StatusCode};

async fn file_request(
    client: &reqwest::Client,
    base_url: &str,
    tenant_cookie: &str,
    property: &serde_json::Value,
) -> Result<reqwest::Response> {
    Ok(client
        .post(format!("{base_url}/requests"))
        .header(header::COOKIE, tenant_cookie)
        .json(&serde_json::json!({
            "propertyId": property["id"],
            "ownerId": property["ownerId"],
            "message": "I would like to rent this place",
            "moveInDate": "2026-09-01",
        }))
        .send()
        .await?)
}

#[tokio::test]
async fn duplicate_active_request_rejected_until_first_is_rejected() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (owner_cookie, _) = common::register_account(&client, &server.base_url, "owner").await?;
    let (tenant_cookie, _) = common::register_account(&client, &server.base_url, "tenant").await?;
    let location = common::unique_marker("Dupliville");
    let property =
        common::create_property(&client, &server.base_url, &owner_cookie, &location, 11000, 2)
            .await?;

    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await?;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    assert_eq!(body["request"]["status"], "pending");

    // Second application for the same (tenant, property) pair
    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // After rejection the tenant may apply again
    let res = client
        .put(format!("{}/requests/{request_id}", server.base_url))
        .header(header::COOKIE, owner_cookie.as_str())
        .json(&serde_json::json!({ "status": "rejected" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["request"]["status"], "rejected");
    assert!(body["request"]["respondedAt"].is_string());

    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    Ok(())
}

#[tokio::test]
async fn approval_marks_property_unavailable() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (owner_cookie, _) = common::register_account(&client, &server.base_url, "owner").await?;
    let (tenant_cookie, _) = common::register_account(&client, &server.base_url, "tenant").await?;
    let location = common::unique_marker("Approvia");
    let property =
        common::create_property(&client, &server.base_url, &owner_cookie, &location, 15000, 3)
            .await?;
    let property_id = property["id"].as_str().unwrap();

    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body: serde_json::Value = res.json().await?;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/requests/{request_id}", server.base_url))
        .header(header::COOKIE, owner_cookie.as_str())
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["request"]["status"], "approved");

    // The detail view shows the flipped availability flag
    let res = client
        .get(format!("{}/properties/{property_id}", server.base_url))
        .send()
        .await?;
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["property"]["availability"], false);

    // And the property is gone from the public listing
    let res = client
        .get(format!("{}/properties?location={location}", server.base_url))
        .send()
        .await?;
    let body: serde_json::Value = res.json().await?;
    assert_eq!(body["properties"].as_array().map_or(0, Vec::len), 0);
    Ok(())
}

#[tokio::test]
async fn foreign_request_update_reports_404() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (owner_cookie, _) = common::register_account(&client, &server.base_url, "owner").await?;
    let (other_owner, _) = common::register_account(&client, &server.base_url, "owner").await?;
    let (tenant_cookie, _) = common::register_account(&client, &server.base_url, "tenant").await?;
    let location = common::unique_marker("Elsewhere");
    let property =
        common::create_property(&client, &server.base_url, &owner_cookie, &location, 8000, 1)
            .await?;

    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    let body: serde_json::Value = res.json().await?;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();

    let res = client
        .put(format!("{}/requests/{request_id}", server.base_url))
        .header(header::COOKIE, other_owner.as_str())
        .json(&serde_json::json!({ "status": "approved" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Still pending for the real owner
    let res = client
        .get(format!("{}/requests?status=pending", server.base_url))
        .header(header::COOKIE, owner_cookie.as_str())
        .send()
        .await?;
    let body: serde_json::Value = res.json().await?;
    assert!(body["requests"]
        .as_array()
        .unwrap()
        .iter()
        .any(|r| r["id"] == request_id.as_str()));
    Ok(())
}

#[tokio::test]
async fn request_lists_are_scoped_to_each_party() -> Result<()> {
    if !common::database_configured() {
        eprintln!("skipping: DATABASE_URL not set");
        return Ok(());
    }
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let (owner_cookie, _) = common::register_account(&client, &server.base_url, "owner").await?;
    let (tenant_cookie, tenant) =
        common::register_account(&client, &server.base_url, "tenant").await?;
    let (bystander_cookie, _) =
        common::register_account(&client, &server.base_url, "tenant").await?;
    let location = common::unique_marker("Scopeville");
    let property =
        common::create_property(&client, &server.base_url, &owner_cookie, &location, 9000, 2)
            .await?;

    let res = file_request(&client, &server.base_url, &tenant_cookie, &property).await?;
    let body: serde_json::Value = res.json().await?;
    let request_id = body["request"]["id"].as_str().unwrap().to_string();
    // Joined projections carry both parties and the property subset
    assert_eq!(body["request"]["tenant"]["email"], tenant["email"]);
    assert_eq!(body["request"]["property"]["location"], location.as_str());

    let list_ids = |cookie: String| {
        let client = client.clone();
        let base = server.base_url.clone();
        async move {
            let res = client
                .get(format!("{base}/requests"))
                .header(header::COOKIE, cookie)
                .send()
                .await?;
            anyhow::ensure!(res.status() == StatusCode::OK, "status {}", res.status());
            let body: serde_json::Value = res.json().await?;
            Ok::<Vec<String>, anyhow::Error>(
                body["requests"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .filter_map(|r| r["id"].as_str().map(String::from))
                    .collect(),
            )
        }
    };

    assert!(list_ids(owner_cookie.clone()).await?.contains(&request_id));
    assert!(list_ids(tenant_cookie.clone()).await?.contains(&request_id));
    assert!(!list_ids(bystander_cookie.clone()).await?.contains(&request_id));

    // Unauthenticated listing is refused
    let res = client
        .get(format!("{}/requests", server.base_url))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}
