//! CLI command handlers.
//!
//! All commands communicate with the recap service over its HTTP API.

pub mod args;
mod meetings;
mod upload;
mod watch;

pub use args::{Cli, CliCommand};
pub use meetings::{handle_list_command, handle_show_command};
pub use upload::handle_upload_command;
pub use watch::handle_watch_command;

use crate::config::Config;
use anyhow::Result;

/// Base URL of the service: explicit override, or the configured host/port.
pub(crate) fn resolve_base_url(override_url: Option<String>) -> Result<String> {
    if let Some(url) = override_url {
        return Ok(url.trim_end_matches('/').to_string());
    }
    Ok(Config::load()?.base_url())
}
