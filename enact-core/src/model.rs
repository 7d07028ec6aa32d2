use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    User,
    Assistant,
    System,
    /// Any record that is not a conversational turn (summaries, progress, snapshots).
    Meta,
}

impl EntryKind {
    pub fn from_record_type(record_type: Option<&str>) -> Self {
        match record_type {
            Some("user") => Self::User,
            Some("assistant") => Self::Assistant,
            Some("system") => Self::System,
            _ => Self::Meta,
        }
    }
}

/// One parsed line of a transcript file.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub kind: EntryKind,
    /// 1-based line number in the source file.
    pub line: usize,
    pub timestamp: Option<String>,
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub version: Option<String>,
    pub team_name: Option<String>,
    pub agent_name: Option<String>,
    pub message: Option<Message>,
    pub tool_use_result: Option<Value>,
}

impl LogEntry {
    pub fn message_id(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|message| message.id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        match self.message.as_ref().map(|message| &message.content) {
            Some(MessageContent::Blocks(blocks)) => blocks,
            _ => &[],
        }
    }

    /// The declared `(team, agent)` pair, when both are present and non-empty.
    pub fn team_membership(&self) -> Option<(&str, &str)> {
        let team = self.team_name.as_deref().filter(|team| !team.is_empty())?;
        let agent = self.agent_name.as_deref().filter(|agent| !agent.is_empty())?;
        Some((team, agent))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Option<String>,
    pub model: Option<String>,
    pub content: MessageContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentBlock {
    Thinking(String),
    Text(String),
    ToolUse(ToolInvocation),
    ToolResult(ToolResult),
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolInvocation {
    pub id: String,
    pub name: String,
    pub input: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    pub tool_use_id: String,
    pub is_error: bool,
    pub content: Value,
}

impl ToolResult {
    /// Plain text of the result: the string itself, or the concatenated `text`
    /// parts of a list payload.
    pub fn text(&self) -> String {
        match &self.content {
            Value::String(text) => text.clone(),
            Value::Array(parts) => parts
                .iter()
                .filter_map(|part| part.get("text").and_then(Value::as_str))
                .collect(),
            _ => String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTranscript {
    pub path: PathBuf,
    /// Which resolution strategy matched (`path`, `session-id`, `agent-id`, `team-ref`, `latest`).
    pub source: String,
}

/// A top-level session file and the project directory that holds it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRef {
    pub project_dir: PathBuf,
    pub path: PathBuf,
    pub session_id: String,
}

impl SessionRef {
    pub fn from_path(path: &Path) -> Option<Self> {
        let project_dir = path.parent()?.to_path_buf();
        let session_id = path.file_stem()?.to_str()?.to_string();
        Some(Self {
            project_dir,
            path: path.to_path_buf(),
            session_id,
        })
    }

    pub fn subagents_dir(&self) -> PathBuf {
        self.project_dir.join(&self.session_id).join("subagents")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubagentTranscript {
    pub agent_id: String,
    pub path: PathBuf,
    /// Description given when the agent was spawned, if it could be correlated.
    pub label: Option<String>,
}

impl SubagentTranscript {
    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.agent_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamMember {
    pub path: PathBuf,
    pub team_name: String,
    pub agent_name: String,
}

impl TeamMember {
    pub fn short_team_name(&self, run_id: &str) -> &str {
        let prefix = format!("{run_id}-");
        self.team_name
            .strip_prefix(&prefix)
            .unwrap_or(&self.team_name)
    }

    pub fn label(&self, run_id: &str) -> String {
        format!(
            "[team: {}] {}",
            self.short_team_name(run_id),
            self.agent_name
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamGroup {
    pub short_name: String,
    pub members: Vec<TeamMember>,
}

/// Every transcript related to one enact run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSet {
    pub run_id: String,
    pub orchestrator: SessionRef,
    pub subagents: Vec<SubagentTranscript>,
    pub teams: Vec<TeamGroup>,
}

impl TranscriptSet {
    pub fn team_member_count(&self) -> usize {
        self.teams.iter().map(|team| team.members.len()).sum()
    }

    pub fn transcript_count(&self) -> usize {
        1 + self.subagents.len() + self.team_member_count()
    }

    /// Orchestrator, direct subagents by start time, then team members grouped by team.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths = Vec::with_capacity(self.transcript_count());
        paths.push(self.orchestrator.path.as_path());
        paths.extend(self.subagents.iter().map(|agent| agent.path.as_path()));
        paths.extend(
            self.teams
                .iter()
                .flat_map(|team| team.members.iter().map(|member| member.path.as_path())),
        );
        paths
    }
}
