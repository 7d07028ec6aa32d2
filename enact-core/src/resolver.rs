use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{EnactError, Result};
use crate::jsonl;
use crate::layout::{self, AGENT_PREFIX, SUBAGENTS_DIR};
use crate::model::ResolvedTranscript;

/// Maps a user-supplied identifier to exactly one transcript file.
#[derive(Debug, Clone)]
pub struct TranscriptResolver {
    projects_root: PathBuf,
}

impl TranscriptResolver {
    pub fn new(projects_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
        }
    }

    /// Resolves `identifier`, or the most recently modified session when it is `None`.
    pub fn resolve(&self, identifier: Option<&str>) -> Result<ResolvedTranscript> {
        match identifier {
            Some(identifier) => self.resolve_identifier(identifier),
            None => self.latest(),
        }
    }

    /// Tries, in order: a file path, a session id, an agent id, a `team/agent` reference.
    pub fn resolve_identifier(&self, identifier: &str) -> Result<ResolvedTranscript> {
        let direct = Path::new(identifier);
        if direct.is_file() {
            return Ok(make_resolved(direct.to_path_buf(), "path"));
        }

        if let Some(path) = self.find_by_session_id(identifier) {
            return Ok(make_resolved(path, "session-id"));
        }

        if let Some(path) = self.find_by_agent_id(identifier) {
            return Ok(make_resolved(path, "agent-id"));
        }

        if let Some(path) = self.find_by_team_ref(identifier) {
            return Ok(make_resolved(path, "team-ref"));
        }

        Err(EnactError::TranscriptNotFound {
            identifier: identifier.to_string(),
        })
    }

    /// The session file with the newest modification time across all projects.
    pub fn latest(&self) -> Result<ResolvedTranscript> {
        let candidates = layout::all_session_files(&self.projects_root);
        choose_latest(candidates)
            .map(|path| make_resolved(path, "latest"))
            .ok_or_else(|| EnactError::NoTranscripts {
                root: self.projects_root.clone(),
            })
    }

    fn find_by_session_id(&self, session_id: &str) -> Option<PathBuf> {
        if session_id.is_empty() || session_id.contains('/') {
            return None;
        }

        let file_name = format!("{session_id}.jsonl");
        layout::project_dirs(&self.projects_root)
            .into_iter()
            .map(|project_dir| project_dir.join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    fn find_by_agent_id(&self, agent_id: &str) -> Option<PathBuf> {
        let agent_id = layout::normalize_agent_id(agent_id);
        if agent_id.is_empty() || agent_id.contains('/') {
            return None;
        }

        let file_name = format!("{AGENT_PREFIX}{agent_id}.jsonl");
        layout::project_dirs(&self.projects_root)
            .iter()
            .flat_map(|project_dir| layout::session_dirs(project_dir))
            .map(|session_dir| session_dir.join(SUBAGENTS_DIR).join(&file_name))
            .find(|candidate| candidate.is_file())
    }

    /// Accepts `review/reviewer-1` as well as `1771028742-review/reviewer-1`.
    fn find_by_team_ref(&self, team_ref: &str) -> Option<PathBuf> {
        let (team_part, agent_part) = team_ref.rsplit_once('/')?;
        let team_suffix = format!("-{team_part}");

        layout::all_session_files(&self.projects_root)
            .into_iter()
            .find(|path| {
                // Only the first entry that declares membership decides the file.
                jsonl::scan_entries(path)
                    .find_map(|entry| {
                        entry.team_membership().map(|(team, agent)| {
                            agent == agent_part
                                && (team == team_part || team.ends_with(&team_suffix))
                        })
                    })
                    .unwrap_or(false)
            })
    }
}

fn make_resolved(path: PathBuf, source: &str) -> ResolvedTranscript {
    tracing::debug!(path = %path.display(), source, "resolved transcript");
    ResolvedTranscript {
        path,
        source: source.to_string(),
    }
}

/// Newest by modification time; ties keep the earliest candidate.
fn choose_latest(paths: Vec<PathBuf>) -> Option<PathBuf> {
    let mut latest = None::<(PathBuf, SystemTime)>;

    for path in paths {
        let modified = fs::metadata(&path)
            .and_then(|meta| meta.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if latest
            .as_ref()
            .is_none_or(|(_, best_modified)| modified > *best_modified)
        {
            latest = Some((path, modified));
        }
    }

    latest.map(|(path, _)| path)
}
