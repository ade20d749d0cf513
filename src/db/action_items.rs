//! Action item persistence.
//!
//! Action items are created in bulk by the summarization stage, always in
//! `pending` status. The status column exists for future user interaction;
//! nothing in the pipeline mutates it.

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

/// Priority of an extracted action item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl ItemPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => bail!("Invalid action item priority: {}", s),
        }
    }
}

/// Workflow status of an action item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            _ => bail!("Invalid action item status: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionItemRecord {
    pub id: i64,
    pub meeting_id: i64,
    pub task_description: String,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub priority: ItemPriority,
    pub status: ItemStatus,
    pub created_at: String,
}

const COLUMNS: &str =
    "id, meeting_id, task_description, assignee, due_date, priority, status, created_at";

fn from_row(row: &Row<'_>) -> rusqlite::Result<ActionItemRecord> {
    let priority_str: String = row.get(5)?;
    let status_str: String = row.get(6)?;

    let priority =
        ItemPriority::parse(&priority_str).map_err(|_| rusqlite::Error::InvalidQuery)?;
    let status = ItemStatus::parse(&status_str).map_err(|_| rusqlite::Error::InvalidQuery)?;

    Ok(ActionItemRecord {
        id: row.get(0)?,
        meeting_id: row.get(1)?,
        task_description: row.get(2)?,
        assignee: row.get(3)?,
        due_date: row.get(4)?,
        priority,
        status,
        created_at: row.get(7)?,
    })
}

pub struct ActionItemRepository;

impl ActionItemRepository {
    /// Insert one action item (status = pending). Returns the new ID.
    pub fn insert(
        conn: &Connection,
        meeting_id: i64,
        task_description: &str,
        assignee: Option<&str>,
        due_date: Option<&str>,
        priority: ItemPriority,
    ) -> Result<i64> {
        conn.execute(
            "INSERT INTO action_items \
             (meeting_id, task_description, assignee, due_date, priority, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                meeting_id,
                task_description,
                assignee,
                due_date,
                priority.as_str(),
                ItemStatus::Pending.as_str(),
            ],
        )
        .context("Failed to insert action item")?;

        Ok(conn.last_insert_rowid())
    }

    /// All action items for a meeting, oldest first.
    pub fn list_for_meeting(conn: &Connection, meeting_id: i64) -> Result<Vec<ActionItemRecord>> {
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {} FROM action_items WHERE meeting_id = ?1 ORDER BY id ASC",
                COLUMNS
            ))
            .context("Failed to prepare action items query")?;

        let rows = stmt
            .query_map(params![meeting_id], from_row)
            .context("Failed to list action items")?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }

        Ok(items)
    }
}
