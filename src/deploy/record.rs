// ABOUTME: Persisted deployment records and the append-only history file.
// ABOUTME: One JSON line per terminated deployment, never mutated afterward.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Lifecycle status of one deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeploymentStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    RolledBack,
}

impl DeploymentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            DeploymentStatus::Completed | DeploymentStatus::Failed | DeploymentStatus::RolledBack
        )
    }
}

/// One execution of the deployment state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub id: String,
    pub service: String,
    /// Name of the traffic-shift policy in force.
    pub config: String,
    pub old_revision: String,
    pub new_revision: String,
    pub status: DeploymentStatus,
    /// Why the deployment terminated the way it did.
    pub reason: Option<String>,
    /// Candidate's share of production traffic when the record was written.
    pub traffic_percent: u8,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DeploymentRecord {
    pub fn begin(
        service: &str,
        config: &str,
        old_revision: String,
        new_revision: String,
    ) -> Self {
        let started_at = Utc::now();
        Self {
            id: format!("dpl-{}-{}", service, started_at.timestamp_millis()),
            service: service.to_string(),
            config: config.to_string(),
            old_revision,
            new_revision,
            status: DeploymentStatus::Pending,
            reason: None,
            traffic_percent: 0,
            started_at,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to a terminal status, stamping the finish time.
    pub(crate) fn terminate(&mut self, status: DeploymentStatus, reason: Option<String>) {
        debug_assert!(status.is_terminal());
        self.status = status;
        self.reason = reason;
        self.finished_at = Some(Utc::now());
    }
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("I/O error on history file: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed history record: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("only terminal records may be appended (got {0:?})")]
    NotTerminal(DeploymentStatus),
}

/// Append-only deployment history, one JSON record per line.
#[derive(Debug, Clone)]
pub struct History {
    path: PathBuf,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one terminated deployment. Records are immutable from here on.
    pub fn append(&self, record: &DeploymentRecord) -> Result<(), HistoryError> {
        if !record.is_terminal() {
            return Err(HistoryError::NotTerminal(record.status));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// All records, oldest first.
    pub fn read_all(&self) -> Result<Vec<DeploymentRecord>, HistoryError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = std::fs::File::open(&self.path)?;
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }

    /// The most recent record for a service, if any.
    pub fn latest_for(&self, service: &str) -> Result<Option<DeploymentRecord>, HistoryError> {
        Ok(self
            .read_all()?
            .into_iter()
            .rev()
            .find(|r| r.service == service))
    }
}
