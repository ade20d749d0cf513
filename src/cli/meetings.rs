//! CLI handlers for listing and showing meetings.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::cli::args::{ListCliArgs, ShowCliArgs};

pub async fn handle_list_command(args: ListCliArgs) -> Result<()> {
    let base_url = super::resolve_base_url(args.server.clone())?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/meetings?limit={}", base_url, args.limit))
        .send()
        .await
        .context("Failed to connect to recap service. Is it running?")?;

    let json: Value = response.json().await?;

    let Some(meetings) = json.get("meetings").and_then(|v| v.as_array()) else {
        bail!("Unexpected response from service");
    };

    if meetings.is_empty() {
        println!("No meetings yet.");
        return Ok(());
    }

    for meeting in meetings {
        let id = meeting.get("id").and_then(|v| v.as_i64()).unwrap_or(0);
        let title = meeting
            .get("title")
            .and_then(|v| v.as_str())
            .unwrap_or("Untitled");
        let status = meeting
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        let duration = meeting
            .get("duration_seconds")
            .and_then(|v| v.as_i64())
            .unwrap_or(0);
        let created = meeting
            .get("created_at")
            .and_then(|v| v.as_str())
            .unwrap_or("");

        println!(
            "#{} {} [{}] {:02}:{:02} - {}",
            id,
            title,
            status,
            duration / 60,
            duration % 60,
            created
        );
    }

    Ok(())
}

pub async fn handle_show_command(args: ShowCliArgs) -> Result<()> {
    let base_url = super::resolve_base_url(args.server.clone())?;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/meetings/{}", base_url, args.id))
        .send()
        .await
        .context("Failed to connect to recap service. Is it running?")?;

    let status = response.status();
    let json: Value = response.json().await?;

    if !status.is_success() {
        bail!(
            "Meeting not found: {}",
            json.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
        );
    }

    print_details(&json);
    Ok(())
}

/// Print the assembled meeting view (used by both `show` and `watch`).
pub(crate) fn print_details(details: &Value) {
    let id = details.pointer("/meeting/id").and_then(|v| v.as_i64()).unwrap_or(0);
    let title = details
        .pointer("/meeting/title")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled");
    let status = details
        .pointer("/meeting/status")
        .and_then(|v| v.as_str())
        .unwrap_or("unknown");
    let duration = details
        .pointer("/meeting/duration_seconds")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);

    println!("Meeting #{}: {}", id, title);
    println!("Status: {}", status);
    println!("Duration: {:02}:{:02}", duration / 60, duration % 60);

    if let Some(error) = details
        .pointer("/meeting/error")
        .and_then(|v| v.as_str())
    {
        println!("Error: {}", error);
    }

    if let Some(summary) = details
        .pointer("/summary/summary_text")
        .and_then(|v| v.as_str())
    {
        println!("\n--- Summary ---\n{}", summary);
    }

    if let Some(decisions) = details
        .pointer("/summary/key_decisions")
        .and_then(|v| v.as_array())
        .filter(|d| !d.is_empty())
    {
        println!("\n--- Key decisions ---");
        for decision in decisions {
            if let Some(text) = decision.as_str() {
                println!("- {}", text);
            }
        }
    }

    if let Some(participants) = details
        .pointer("/summary/participants")
        .and_then(|v| v.as_array())
        .filter(|p| !p.is_empty())
    {
        let names: Vec<&str> = participants.iter().filter_map(|p| p.as_str()).collect();
        println!("\nParticipants: {}", names.join(", "));
    }

    if let Some(items) = details
        .get("action_items")
        .and_then(|v| v.as_array())
        .filter(|i| !i.is_empty())
    {
        println!("\n--- Action items ---");
        for item in items {
            let task = item
                .get("task_description")
                .and_then(|v| v.as_str())
                .unwrap_or("");
            let priority = item
                .get("priority")
                .and_then(|v| v.as_str())
                .unwrap_or("medium");

            let mut line = format!("- [{}] {}", priority, task);
            if let Some(assignee) = item.get("assignee").and_then(|v| v.as_str()) {
                line.push_str(&format!(" ({})", assignee));
            }
            if let Some(due) = item.get("due_date").and_then(|v| v.as_str()) {
                line.push_str(&format!(" due {}", due));
            }
            println!("{}", line);
        }
    }

    if let Some(transcript) = details
        .pointer("/transcript/full_text")
        .and_then(|v| v.as_str())
    {
        println!("\n--- Transcript ---\n{}", transcript);
    }
}
