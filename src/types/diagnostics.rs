//! Diagnostic records: last executed command and persisted sessions

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::identifiers::SessionId;
use super::invocation::ExecutionMethod;
use crate::backend::BackendKind;

/// Snapshot of the most recent invocation
///
/// The client keeps exactly one of these; concurrent calls overwrite each
/// other and the last writer wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutedCommandInfo {
    /// Invocation correlation id
    pub invocation_id: Uuid,
    /// Full command line, shell-quoted for display
    pub command_line: String,
    /// Working directory of the process
    pub working_directory: Option<PathBuf>,
    /// Content written to standard input
    pub stdin: Option<String>,
    /// When the invocation started
    pub timestamp: DateTime<Utc>,
    /// Operation that produced the invocation
    pub method: ExecutionMethod,
    /// Backend that ran it
    pub backend: BackendKind,
}

/// A session persisted by the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Session id (transcript file stem)
    pub id: SessionId,
    /// Project directory name as stored by the CLI
    pub project: String,
    /// Transcript path
    pub path: PathBuf,
    /// Last modification time
    pub modified: DateTime<Utc>,
    /// Transcript size
    pub size_bytes: u64,
}
