//! End-to-end tests that exercise the real binary over the wire.

use std::io::Write;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::StatusCode;
use tempfile::NamedTempFile;
use tokio::{process::Command, time::sleep};

const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

fn write_instances_file(entries: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new().context("failed to create instances file")?;
    let body = serde_json::json!({ "instances": entries });
    file.write_all(body.to_string().as_bytes())?;
    file.flush()?;
    Ok(file)
}

/// Polls a node's snapshot endpoint until it answers, or fails after
/// the startup timeout.
async fn wait_until_ready(http: &reqwest::Client, port: u16) -> Result<()> {
    let url = format!("http://127.0.0.1:{port}/sync_data");
    let deadline = tokio::time::Instant::now() + STARTUP_TIMEOUT;
    loop {
        if let Ok(response) = http.get(&url).send().await {
            if response.status() == StatusCode::OK {
                return Ok(());
            }
        }
        if tokio::time::Instant::now() > deadline {
            return Err(anyhow!("node on port {port} did not become ready"));
        }
        sleep(Duration::from_millis(50)).await;
    }
}

#[tokio::test]
async fn two_processes_replicate_over_the_wire() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("queue_mesh");
    let ports = [17901u16, 17902];
    let instances = write_instances_file(&["127.0.0.1:17901", "127.0.0.1:17902"])?;

    let mut children = Vec::new();
    for port in ports {
        let child = Command::new(&binary)
            .arg("--port")
            .arg(port.to_string())
            .arg("--instances")
            .arg(instances.path())
            .env("RUST_LOG", "warn")
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn node on port {port}"))?;
        children.push(child);
    }

    let http = reqwest::Client::new();
    for port in ports {
        wait_until_ready(&http, port).await?;
    }

    // Enqueue on the first node; the echo lands on the second.
    let response = http
        .post("http://127.0.0.1:17901/orders")
        .body("item1")
        .send()
        .await?;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let from_peer = http.get("http://127.0.0.1:17902/orders").send().await?;
    assert_eq!(from_peer.status(), StatusCode::OK);
    assert_eq!(from_peer.text().await?, "item1");

    // The consumption replicated back: the first node drained too.
    let drained = http.get("http://127.0.0.1:17901/orders").send().await?;
    assert_eq!(drained.status(), StatusCode::NOT_FOUND);

    for mut child in children {
        let _ = child.kill().await;
        let _ = child.wait().await;
    }

    Ok(())
}

#[test]
fn malformed_peer_entry_is_fatal() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("queue_mesh");
    let instances = write_instances_file(&["127.0.0.1:18001", "not-an-address"])?;

    let output = std::process::Command::new(binary)
        .arg("--port")
        .arg("18001")
        .arg("--instances")
        .arg(instances.path())
        .output()
        .context("failed to run node")?;

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not-an-address"), "stderr was: {stderr}");

    Ok(())
}

#[test]
fn unreadable_instances_file_is_fatal() -> Result<()> {
    let binary = assert_cmd::cargo::cargo_bin!("queue_mesh");

    let output = std::process::Command::new(binary)
        .arg("--port")
        .arg("18002")
        .arg("--instances")
        .arg("/nonexistent/instances.json")
        .output()
        .context("failed to run node")?;

    assert!(!output.status.success());

    Ok(())
}
