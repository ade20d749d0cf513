//! CLI handler for uploading a recording.

use anyhow::{bail, Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::cli::args::UploadCliArgs;
use crate::config::Config;

pub async fn handle_upload_command(args: UploadCliArgs) -> Result<()> {
    let base_url = super::resolve_base_url(args.server.clone())?;
    let config = Config::load()?;

    if !args.file.exists() {
        bail!("File not found: {}", args.file.display());
    }

    let mime_type = media_type_for(&args.file)?;

    let filename = args
        .file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("audio")
        .to_string();

    let file_data = fs::read(&args.file).await.context("Failed to read file")?;

    println!(
        "Uploading {} ({:.1} MB)...",
        filename,
        file_data.len() as f64 / (1024.0 * 1024.0)
    );

    let mut form = Form::new().part(
        "audio",
        Part::bytes(file_data)
            .file_name(filename)
            .mime_str(mime_type)?,
    );

    if let Some(title) = &args.title {
        form = form.text("title", title.clone());
    }

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.upload.timeout_seconds))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .post(format!("{}/upload", base_url))
        .multipart(form)
        .send()
        .await
        .context("Failed to connect to recap service. Is it running?")?;

    let status = response.status();
    let json: Value = response.json().await?;

    if !status.is_success() {
        bail!(
            "Upload failed: {}",
            json.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
        );
    }

    let meeting_id = json
        .pointer("/meeting/id")
        .and_then(|v| v.as_i64())
        .unwrap_or(0);
    let title = json
        .pointer("/meeting/title")
        .and_then(|v| v.as_str())
        .unwrap_or("Untitled");

    println!("Meeting created (id: {}): {}", meeting_id, title);

    if args.watch {
        let interval = Duration::from_secs(config.watch.interval_seconds);
        super::watch::run_watch(&base_url, meeting_id, interval).await?;
    } else {
        println!("Run `recap watch {}` to process it.", meeting_id);
    }

    Ok(())
}

/// Media type for an upload, from the file extension. Only audio formats
/// the service accepts are worth sending.
fn media_type_for(path: &Path) -> Result<&'static str> {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("mp3") => Ok("audio/mpeg"),
        Some("wav") => Ok("audio/wav"),
        Some("m4a") => Ok("audio/mp4"),
        Some("mp4") => Ok("audio/mp4"),
        Some("aac") => Ok("audio/aac"),
        Some("webm") => Ok("audio/webm"),
        Some("ogg") => Ok("audio/ogg"),
        Some("flac") => Ok("audio/flac"),
        Some(other) => bail!(
            "Unsupported format: .{} (expected mp3, wav, m4a, aac, webm, ogg, or flac)",
            other
        ),
        None => bail!("Unsupported format: file has no extension"),
    }
}
