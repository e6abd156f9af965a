#![allow(dead_code)] // each test binary uses a subset of these helpers

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use reqwest::{header, StatusCode};

/// Webhook secret the spawned server is configured with.
pub const WEBHOOK_SECRET: &str = "whsec_homelet_test";

static SERVER: OnceLock<TestServer> = OnceLock::new();

/// The whole suite needs a live database; individual tests skip themselves
/// when none is configured.
pub fn database_configured() -> bool {
    std::env::var("DATABASE_URL").is_ok()
}

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // Spawn the already-built binary to keep start fast during tests
        // Assumes debug profile; adjust if you run tests with --release
        let mut cmd = Command::new("target/debug/homelet-api");
        cmd.env("HOMELET_API_PORT", port.to_string())
            .env("STRIPE_WEBHOOK_SECRET", WEBHOOK_SECRET)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        // Inherit environment so the server can see DATABASE_URL from .env (loaded by the server)
        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK
                    || resp.status() == StatusCode::SERVICE_UNAVAILABLE
                {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!(
            "server did not become ready on {} within {:?}",
            self.base_url,
            timeout
        )
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Extract the `token=...` pair from a response's Set-Cookie headers, ready
/// to be sent back in a Cookie header.
pub fn session_cookie(resp: &reqwest::Response) -> Option<String> {
    for value in resp.headers().get_all(header::SET_COOKIE) {
        let value = value.to_str().ok()?;
        if value.starts_with("token=") {
            return Some(value.split(';').next().unwrap_or(value).to_string());
        }
    }
    None
}

pub fn unique_marker(prefix: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch")
        .as_nanos();
    format!("{prefix}-{nanos}")
}

/// Register a fresh account and return its session cookie pair and the
/// user object from the response.
pub async fn register_account(
    client: &reqwest::Client,
    base_url: &str,
    role: &str,
) -> Result<(String, serde_json::Value)> {
    let email = format!("{}@example.com", unique_marker(role));
    let res = client
        .post(format!("{base_url}/auth/register"))
        .json(&serde_json::json!({
            "name": format!("Test {role}"),
            "email": email,
            "password": "password123",
            "role": role,
            "phone": "+1 555 0100",
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "register failed with {}",
        res.status()
    );
    let cookie = session_cookie(&res).context("register response set no session cookie")?;
    let body: serde_json::Value = res.json().await?;
    Ok((cookie, body["user"].clone()))
}

/// Create a property as the given owner and return the property object.
pub async fn create_property(
    client: &reqwest::Client,
    base_url: &str,
    owner_cookie: &str,
    location: &str,
    rent: i64,
    rooms: i64,
) -> Result<serde_json::Value> {
    let res = client
        .post(format!("{base_url}/properties"))
        .header(header::COOKIE, owner_cookie)
        .json(&serde_json::json!({
            "title": "Test listing",
            "description": "A listing created by the integration suite",
            "location": location,
            "rent": rent,
            "rooms": rooms,
            "bathrooms": 1,
            "images": ["https://example.com/photo.jpg"],
            "amenities": ["Parking"],
        }))
        .send()
        .await?;
    anyhow::ensure!(
        res.status() == StatusCode::CREATED,
        "property create failed with {}",
        res.status()
    );
    let body: serde_json::Value = res.json().await?;
    Ok(body["property"].clone())
}
