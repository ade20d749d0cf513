//! Meeting status state machine.
//!
//! A meeting moves strictly forward through the pipeline:
//! uploaded → transcribing → transcribed → summarizing → completed,
//! with `failed` reachable from either in-flight state. `completed` and
//! `failed` are terminal; a failed meeting only moves again through an
//! explicit new stage invocation, never automatically.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Pipeline status of a meeting record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    Uploaded,
    Transcribing,
    Transcribed,
    Summarizing,
    Completed,
    Failed,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::Transcribing => "transcribing",
            Self::Transcribed => "transcribed",
            Self::Summarizing => "summarizing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "uploaded" => Ok(Self::Uploaded),
            "transcribing" => Ok(Self::Transcribing),
            "transcribed" => Ok(Self::Transcribed),
            "summarizing" => Ok(Self::Summarizing),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            _ => bail!("Invalid meeting status: {}", s),
        }
    }

    /// Whether the pipeline has finished with this meeting, one way or the
    /// other.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Whether a stage is currently working on the meeting.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, Self::Transcribing | Self::Summarizing)
    }
}

impl std::fmt::Display for MeetingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
