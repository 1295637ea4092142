use std::time::Duration;

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

pub async fn handle(url: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let health_url = format!("{}/api/v1/health", url.trim_end_matches('/'));
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    let response = client
        .get(&health_url)
        .send()
        .await
        .with_context(|| format!("could not reach {}", health_url))?;
    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);

    if status.is_success() {
        output_success(
            output_format,
            &format!("{} is healthy", url),
            Some(json!({ "status": status.as_u16(), "health": body })),
        )
    } else {
        output_error(output_format, &format!("{} answered {}: {}", url, status, body))?;
        anyhow::bail!("health check failed")
    }
}
