//! Test helper utilities for driving the HTTP API in e2e tests.

use std::time::Duration;

use tokio::time::sleep;

use firasah::models::interpretation::{InterpretAccepted, InterpretStatusResponse};

/// Start an interpretation job through the async endpoint.
pub async fn start_interpretation(
    client: &reqwest::Client,
    base_url: &str,
    analysis: &str,
    language: &str,
) -> Result<InterpretAccepted, Box<dyn std::error::Error>> {
    let response = client
        .post(format!("{}/api/v1/interpret", base_url))
        .json(&serde_json::json!({ "analysis": analysis, "language": language }))
        .send()
        .await?;

    let status = response.status();
    if status != reqwest::StatusCode::ACCEPTED {
        let error_text = response.text().await?;
        return Err(format!("Interpret start failed with status {}: {}", status, error_text).into());
    }

    Ok(response.json::<InterpretAccepted>().await?)
}

/// Poll interpretation job status until terminal (with timeout).
pub async fn poll_interpretation_status(
    client: &reqwest::Client,
    base_url: &str,
    job_id: &str,
    timeout_secs: u64,
) -> Result<InterpretStatusResponse, Box<dyn std::error::Error>> {
    let max_attempts = timeout_secs * 2; // Poll every 500ms

    for attempt in 0..max_attempts {
        let response = client
            .get(format!("{}/api/v1/interpret/{}", base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            let error_text = response.text().await?;
            return Err(format!("Status check failed: {}", error_text).into());
        }

        let status_response = response.json::<InterpretStatusResponse>().await?;

        if status_response.status.is_terminal() {
            return Ok(status_response);
        }

        if attempt % 10 == 0 && attempt > 0 {
            println!("  ... still waiting (attempt {}/{})", attempt, max_attempts);
        }
        sleep(Duration::from_millis(500)).await;
    }

    Err(format!("Job did not complete within {} seconds", timeout_secs).into())
}
