use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnactError {
    #[error("cannot determine home directory")]
    HomeDirectoryNotFound,

    #[error("no enact sessions found under {root}")]
    NoEnactRuns { root: PathBuf },

    #[error("enact scratch directory not found: {path}")]
    ScratchDirNotFound { path: PathBuf },

    #[error("no project directories found under {root}")]
    NoProjectDirs { root: PathBuf },

    #[error("no session transcript found containing enact id '{run_id}'")]
    OrchestratorNotFound { run_id: String },

    #[error(
        "could not find transcript for '{identifier}'; provide a session UUID, agent id, team-name/agent-name, or path to a .jsonl file"
    )]
    TranscriptNotFound { identifier: String },

    #[error("no session transcripts found under {root}")]
    NoTranscripts { root: PathBuf },

    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, EnactError>;

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::EnactError;

    #[test]
    fn io_error_message_names_path() {
        let err = EnactError::Io {
            path: PathBuf::from("/tmp/x.jsonl"),
            source: std::io::Error::other("boom"),
        };
        assert!(format!("{err}").contains("/tmp/x.jsonl"));
    }

    #[test]
    fn orchestrator_message_names_run_id() {
        let err = EnactError::OrchestratorNotFound {
            run_id: "1700000000".to_string(),
        };
        assert!(format!("{err}").contains("'1700000000'"));
    }
}
