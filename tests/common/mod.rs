#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use globetrek_api::auth::{generate_jwt, Claims, JwtKeys};
use jsonwebtoken::Algorithm;
use reqwest::StatusCode;
use serde_json::Value;

pub const TEST_JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        // The in-memory store keeps the suite independent of a running database
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_globetrek-api"));
        cmd.env("GLOBETREK_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("STORE_BACKEND", "memory")
            .env("JWT_SECRET", TEST_JWT_SECRET)
            .env("JWT_ALGORITHM", "HS256")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { port, base_url, child })
    }

    /// Spawn a server owned by the caller; it is killed when dropped.
    pub async fn start() -> Result<Self> {
        let server = Self::spawn()?;
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
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
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Bearer token for `sub`, signed with the secret the test server runs with
pub fn token_for(sub: &str) -> Result<String> {
    let keys = JwtKeys::new(TEST_JWT_SECRET, Algorithm::HS256)?;
    Ok(generate_jwt(&Claims::new(sub, 1), &keys)?)
}

/// Unique user id per test so tests sharing one server never see each other's data
pub fn unique_user(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

/// Create an itinerary for `user` with the given days and return its `data` object
pub async fn create_itinerary(server: &TestServer, user: &str, days: Value) -> Result<Value> {
    let client = reqwest::Client::new();
    let res = client
        .post(server.url("/itineraries/create"))
        .bearer_auth(token_for(user)?)
        .json(&serde_json::json!({
            "destination": "Kyoto",
            "country": "Japan",
            "city": "Kyoto",
            "startDate": "2026-04-01",
            "endDate": "2026-04-03",
            "itinerary": days,
        }))
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());

    let body: Value = res.json().await?;
    Ok(body["data"].clone())
}

pub fn three_days() -> Value {
    serde_json::json!([
        { "day": "Day 1", "description": [
            { "place": "Fushimi Inari", "description": "Torii gates", "checked": false },
            { "place": "Tofuku-ji", "description": "Garden", "checked": false }
        ]},
        { "day": "Day 2", "description": [
            { "place": "Arashiyama", "description": "Bamboo grove", "checked": false }
        ]},
        { "day": "Day 3", "description": [
            { "place": "Nishiki Market", "description": "Lunch", "checked": false }
        ]}
    ])
}
