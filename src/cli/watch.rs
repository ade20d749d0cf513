//! The watch loop: client-side orchestration of the pipeline.
//!
//! Polls the meeting view at a fixed interval and triggers the next stage
//! when its prerequisite status is observed. Duplicate triggers are safe —
//! the service short-circuits on existing results — so the loop only guards
//! against re-triggering within its own run. Stops on `completed` or
//! `failed`.

use anyhow::{bail, Context, Result};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::time::sleep;

use crate::cli::args::WatchCliArgs;
use crate::config::Config;
use crate::meeting::MeetingStatus;

/// How long to wait before re-triggering summarization when the service
/// reports the transcript not yet visible.
const TRANSCRIPT_RETRY_DELAY: Duration = Duration::from_secs(3);
const TRANSCRIPT_RETRY_ATTEMPTS: usize = 20;

pub async fn handle_watch_command(args: WatchCliArgs) -> Result<()> {
    let base_url = super::resolve_base_url(args.server.clone())?;
    let config = Config::load()?;
    let interval = Duration::from_secs(config.watch.interval_seconds);

    run_watch(&base_url, args.id, interval).await
}

pub async fn run_watch(base_url: &str, meeting_id: i64, interval: Duration) -> Result<()> {
    let client = reqwest::Client::new();

    let mut last_status: Option<MeetingStatus> = None;
    let mut transcribe_triggered = false;
    let mut summarize_triggered = false;

    loop {
        let details = fetch_details(&client, base_url, meeting_id).await?;

        let status_str = details
            .pointer("/meeting/status")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let status = MeetingStatus::parse(status_str)
            .with_context(|| format!("Service reported an unknown status: {}", status_str))?;

        if last_status != Some(status) {
            println!("Meeting {} is {}", meeting_id, describe(status));
            last_status = Some(status);
        }

        match status {
            MeetingStatus::Uploaded if !transcribe_triggered => {
                transcribe_triggered = true;
                trigger_transcription(&client, base_url, meeting_id).await?;
            }
            MeetingStatus::Transcribed if !summarize_triggered => {
                summarize_triggered = true;
                trigger_summarization(&client, base_url, meeting_id).await?;
            }
            MeetingStatus::Completed => {
                println!();
                super::meetings::print_details(&details);
                return Ok(());
            }
            MeetingStatus::Failed => {
                let error = details
                    .pointer("/meeting/error")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Unknown error");
                print_failure(error);
                bail!("Meeting {} failed", meeting_id);
            }
            _ => {}
        }

        sleep(interval).await;
    }
}

async fn fetch_details(
    client: &reqwest::Client,
    base_url: &str,
    meeting_id: i64,
) -> Result<Value> {
    let response = client
        .get(format!("{}/meetings/{}", base_url, meeting_id))
        .send()
        .await
        .context("Failed to connect to recap service. Is it running?")?;

    let status = response.status();
    let json: Value = response.json().await?;

    if status == reqwest::StatusCode::NOT_FOUND {
        bail!("Meeting {} not found", meeting_id);
    }
    if !status.is_success() {
        bail!(
            "Failed to fetch meeting status: {}",
            json.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
        );
    }

    Ok(json)
}

/// Kick off transcription. A rate-limit response stops the watch with
/// guidance; any other trigger failure is reported and left for the next
/// poll to observe as `failed`.
async fn trigger_transcription(
    client: &reqwest::Client,
    base_url: &str,
    meeting_id: i64,
) -> Result<()> {
    println!("Starting transcription...");

    let response = client
        .post(format!("{}/transcribe", base_url))
        .json(&json!({ "meeting_id": meeting_id }))
        .send()
        .await
        .context("Failed to trigger transcription")?;

    let status = response.status();
    let body: Value = response.json().await?;

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        print_rate_limit(&body);
        bail!("Transcription rate limited");
    }

    if !status.is_success() {
        eprintln!(
            "Transcription trigger failed: {}",
            body.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
        );
    }

    Ok(())
}

/// Kick off summarization, retrying briefly while the service still reports
/// the transcript as unavailable.
async fn trigger_summarization(
    client: &reqwest::Client,
    base_url: &str,
    meeting_id: i64,
) -> Result<()> {
    println!("Starting summarization...");

    for attempt in 0..TRANSCRIPT_RETRY_ATTEMPTS {
        let response = client
            .post(format!("{}/summarize", base_url))
            .json(&json!({ "meeting_id": meeting_id }))
            .send()
            .await
            .context("Failed to trigger summarization")?;

        let status = response.status();
        let body: Value = response.json().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            if attempt + 1 == TRANSCRIPT_RETRY_ATTEMPTS {
                bail!("Transcript never became available for summarization");
            }
            sleep(TRANSCRIPT_RETRY_DELAY).await;
            continue;
        }

        if !status.is_success() {
            eprintln!(
                "Summarization trigger failed: {}",
                body.get("message")
                    .and_then(|m| m.as_str())
                    .unwrap_or("Unknown error")
            );
        }

        return Ok(());
    }

    Ok(())
}

fn describe(status: MeetingStatus) -> &'static str {
    match status {
        MeetingStatus::Uploaded => "uploaded, waiting for transcription",
        MeetingStatus::Transcribing => "transcribing audio",
        MeetingStatus::Transcribed => "transcribed, waiting for summarization",
        MeetingStatus::Summarizing => "generating summary",
        MeetingStatus::Completed => "completed",
        MeetingStatus::Failed => "failed",
    }
}

fn print_rate_limit(body: &Value) {
    let message = body
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Rate limit exceeded");
    let retry_after = body
        .get("retry_after")
        .and_then(|m| m.as_str())
        .unwrap_or("a few minutes");

    eprintln!("Rate limit reached: {}", message);
    eprintln!("What you can do:");
    eprintln!("  1. Wait {} and run `recap watch` again", retry_after);
    eprintln!("  2. Upgrade your API account for higher limits");
    eprintln!("  3. Use shorter audio files to stay within limits");
}

fn print_failure(error: &str) {
    eprintln!("Processing failed: {}", error);
    if error.contains("Rate limit") {
        eprintln!("The failure was a rate limit; wait the suggested time and re-trigger the stage.");
    } else {
        eprintln!("Re-run `recap watch` to retry, or check the service logs.");
    }
}
