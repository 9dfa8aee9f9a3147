use reqwest::Client;
use serde_json::{json, Value};
use std::process::{Command, Stdio};
use std::{net::TcpListener, time::Duration};
use tokio::time::sleep;

pub const SECRET: &str = "test-secret";
pub const METRICS_TOKEN: &str = "test-token";

/// Get an available ephemeral port on localhost.
pub fn find_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind ephemeral");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Poll /healthz until the server responds OK or timeout.
pub async fn wait_ready(base: &str, timeout_ms: u64) -> anyhow::Result<()> {
    let client = Client::new();
    let mut waited = 0u64;
    loop {
        if waited >= timeout_ms {
            anyhow::bail!("server not ready after {}ms", timeout_ms);
        }
        if let Ok(resp) = client.get(format!("{}/healthz", base)).send().await {
            if resp.status().is_success() {
                return Ok(());
            }
        }
        sleep(Duration::from_millis(50)).await;
        waited += 50;
    }
}

// Kills the child process on drop
pub struct ChildGuard(std::process::Child);
impl Drop for ChildGuard {
    fn drop(&mut self) {
        let _ = self.0.kill();
    }
}

/// Start the service binary against `verify_url` with an in-memory database.
pub async fn setup_server(verify_url: &str) -> anyhow::Result<(String, ChildGuard)> {
    let port = find_free_port();
    let base_url = format!("http://127.0.0.1:{}", port);

    let child = Command::new(env!("CARGO_BIN_EXE_hike-service"))
        .env("DB_PATH", ":memory:")
        .env("PORT", port.to_string())
        .env("RECAPTCHA_VERIFY_URL", verify_url)
        .env("RECAPTCHA_SECRET_KEY", SECRET)
        .env("METRICS_AUTH_TOKEN", METRICS_TOKEN)
        .env("RATE_LIMIT_BURST", "100")
        .env("RUST_LOG", "info")
        .env_remove("SECRETS_DIR")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;

    let guard = ChildGuard(child);

    wait_ready(&base_url, 10_000).await?;

    Ok((base_url, guard))
}

pub fn valid_payload() -> Value {
    json!({
        "companyName": "  Acme Corp  ",
        "designation": "Senior Engineer",
        "annualSalary": 2400000,
        "hikeYear": 2025,
        "hikePercentage": 12.5,
        "recaptchaToken": "token-123"
    })
}
