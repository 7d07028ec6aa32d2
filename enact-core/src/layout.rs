//! On-disk layout of the agent runtime's transcript store.
//!
//! ```text
//! <projects_root>/<project>/<session-uuid>.jsonl
//! <projects_root>/<project>/<session-uuid>/subagents/agent-<hex>.jsonl
//! ```
//!
//! All listings are sorted by file name so every scan visits files in the
//! same order.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

pub const SUBAGENTS_DIR: &str = "subagents";
pub const AGENT_PREFIX: &str = "agent-";

fn sorted_children(dir: &Path) -> impl Iterator<Item = walkdir::DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
}

fn is_jsonl(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "jsonl")
}

pub fn project_dirs(projects_root: &Path) -> Vec<PathBuf> {
    if !projects_root.is_dir() {
        return Vec::new();
    }

    sorted_children(projects_root)
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Top-level `*.jsonl` session files of one project.
pub fn session_files(project_dir: &Path) -> Vec<PathBuf> {
    sorted_children(project_dir)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_jsonl(path))
        .collect()
}

/// Session files of every project, projects first then file names.
pub fn all_session_files(projects_root: &Path) -> Vec<PathBuf> {
    project_dirs(projects_root)
        .iter()
        .flat_map(|project_dir| session_files(project_dir))
        .collect()
}

/// Per-session directories of one project (the ones that may hold `subagents/`).
pub fn session_dirs(project_dir: &Path) -> Vec<PathBuf> {
    sorted_children(project_dir)
        .filter(|entry| entry.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

pub fn is_subagent_filename(path: &Path) -> bool {
    is_jsonl(path)
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(AGENT_PREFIX))
}

/// `agent-*.jsonl` files directly inside a `subagents/` directory.
pub fn subagent_files(subagents_dir: &Path) -> Vec<PathBuf> {
    if !subagents_dir.is_dir() {
        return Vec::new();
    }

    sorted_children(subagents_dir)
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| is_subagent_filename(path))
        .collect()
}

/// Agent id from a subagent file name: `agent-a1b2.jsonl` -> `a1b2`.
pub fn agent_id_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    normalize_agent_id(stem)
}

pub fn normalize_agent_id(agent_id: &str) -> String {
    agent_id
        .strip_prefix(AGENT_PREFIX)
        .unwrap_or(agent_id)
        .to_string()
}
