//! Session store enumeration for the direct CLI backend
//!
//! The CLI persists each conversation as `<claude_home>/projects/<project>/<session>.jsonl`.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::diagnostics::SessionInfo;
use crate::types::identifiers::SessionId;

const TRANSCRIPT_EXTENSION: &str = "jsonl";

/// Every persisted session under `claude_home`, most recently modified first
///
/// A missing store is an empty list. Unreadable entries inside the store are
/// skipped.
///
/// # Errors
/// Returns `ClaudeError::Io` if the projects directory exists but cannot be read
pub(crate) fn scan_session_store(claude_home: &Path) -> Result<Vec<SessionInfo>> {
    let projects_dir = claude_home.join("projects");
    let projects = match fs::read_dir(&projects_dir) {
        Ok(projects) => projects,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("No session store at {}", projects_dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut sessions = Vec::new();
    for project in projects.flatten() {
        if !project.file_type().is_ok_and(|t| t.is_dir()) {
            continue;
        }
        let project_name = project.file_name().to_string_lossy().into_owned();
        let Ok(transcripts) = fs::read_dir(project.path()) else {
            log::debug!("Skipping unreadable project {project_name}");
            continue;
        };

        for transcript in transcripts.flatten() {
            let path = transcript.path();
            if path.extension().and_then(|e| e.to_str()) != Some(TRANSCRIPT_EXTENSION) {
                continue;
            }
            let (Some(stem), Ok(metadata)) = (path.file_stem(), transcript.metadata()) else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_default();

            sessions.push(SessionInfo {
                id: SessionId::new(stem.to_string_lossy()),
                project: project_name.clone(),
                path,
                modified,
                size_bytes: metadata.len(),
            });
        }
    }

    sessions.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.id.as_str().cmp(b.id.as_str())));
    Ok(sessions)
}
