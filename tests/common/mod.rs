use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub const TEST_CRON_SECRET: &str = "test-cron-secret";
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

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
        let mut cmd = Command::new("target/debug/summitcare-api");
        cmd.env("SUMMIT_API_PORT", port.to_string())
            .env("CRON_SECRET", TEST_CRON_SECRET)
            .env("ADMIN_TOKEN", TEST_ADMIN_TOKEN)
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
            if Instant::now() > deadline { break; }
            let url = format!("{}/health", self.base_url);
            match client.get(&url).send().await {
                Ok(resp) => {
                    // Consider server ready on any non-404 response
                    if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                        return Ok(());
                    }
                }
                Err(_) => {}
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// True when the server can reach its database. Tests that need durable
/// storage skip themselves when this is false so the validation-only tests
/// still run without a local Postgres.
pub async fn db_available(server: &TestServer) -> bool {
    let client = reqwest::Client::new();
    match client.get(format!("{}/health", server.base_url)).send().await {
        Ok(resp) => resp.status() == StatusCode::OK,
        Err(_) => false,
    }
}

/// Run the idempotent migration through the admin endpoint.
#[allow(dead_code)]
pub async fn migrate(server: &TestServer) -> Result<()> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/api/admin/migrate", server.base_url))
        .header("x-admin-token", TEST_ADMIN_TOKEN)
        .send()
        .await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "migrate failed: {}", res.status());
    Ok(())
}
