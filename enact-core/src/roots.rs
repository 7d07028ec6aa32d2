use std::env;
use std::path::PathBuf;

use dirs::home_dir;

use crate::error::{EnactError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptRoots {
    /// Directory holding one subdirectory per project, each full of session files.
    pub projects_root: PathBuf,
    /// Directory holding one scratch directory per enact run.
    pub scratch_root: PathBuf,
}

impl TranscriptRoots {
    pub fn new(projects_root: impl Into<PathBuf>, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            projects_root: projects_root.into(),
            scratch_root: scratch_root.into(),
        }
    }

    pub fn from_env_or_home() -> Result<Self> {
        let home = home_dir().ok_or(EnactError::HomeDirectoryNotFound)?;

        // Precedence:
        // 1) CLAUDE_CONFIG_DIR/projects
        // 2) ~/.claude/projects
        let projects_root = env::var_os("CLAUDE_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".claude"))
            .join("projects");

        // Precedence:
        // 1) ENACT_SCRATCH_DIR
        // 2) ~/.llms/enact
        let scratch_root = env::var_os("ENACT_SCRATCH_DIR")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| home.join(".llms/enact"));

        Ok(Self {
            projects_root,
            scratch_root,
        })
    }
}
