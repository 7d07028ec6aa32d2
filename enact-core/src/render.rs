//! Markdown summary of a single transcript.

use std::cmp::Reverse;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::format::{self, input::ToolInput};
use crate::layout::AGENT_PREFIX;
use crate::model::{ContentBlock, EntryKind, LogEntry, MessageContent, ToolInvocation};

const PROMPT_PREVIEW_CHARS: usize = 500;
const THINKING_PREVIEW_CHARS: usize = 1000;
/// Housekeeping slash commands that never count as a turn.
const SKIP_COMMANDS: &[&str] = &["clear", "compact", "help", "status", "cost"];
const FILE_MUTATING_TOOLS: &[&str] = &["Edit", "Write"];

static COMMAND_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<command-name>(.*?)</command-name>").expect("valid regex"));
static COMMAND_ARGS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<command-args>(.*?)</command-args>").expect("valid regex"));

/// The human prompt carried by a user entry's string content.
///
/// Slash commands render as `/<command> <args>`; housekeeping commands and
/// markup-only content yield `None`.
pub fn extract_user_prompt(content: &MessageContent) -> Option<String> {
    let MessageContent::Text(text) = content else {
        return None;
    };

    if let Some(captures) = COMMAND_NAME_RE.captures(text) {
        let command = captures
            .get(1)
            .map_or("", |name| name.as_str())
            .trim_start_matches('/');
        if SKIP_COMMANDS.contains(&command) {
            return None;
        }
        let args = COMMAND_ARGS_RE
            .captures(text)
            .and_then(|captures| captures.get(1))
            .map_or("", |args| args.as_str());
        return Some(format!("/{command} {args}").trim().to_string());
    }

    let cleaned = format::strip_xml_tags(text);
    (!cleaned.is_empty()).then_some(cleaned)
}

#[derive(Debug, Default)]
struct SessionMeta<'a> {
    session_id: Option<&'a str>,
    cwd: Option<&'a str>,
    version: Option<&'a str>,
    model: Option<&'a str>,
    team_name: Option<&'a str>,
    agent_name: Option<&'a str>,
    started: Option<&'a str>,
    ended: Option<&'a str>,
}

impl<'a> SessionMeta<'a> {
    /// First non-empty value of each field wins; `ended` tracks the last timestamp.
    fn collect(entries: &'a [LogEntry]) -> Self {
        let mut meta = Self::default();
        for entry in entries {
            meta.session_id = meta.session_id.or(non_empty(entry.session_id.as_deref()));
            meta.cwd = meta.cwd.or(non_empty(entry.cwd.as_deref()));
            meta.version = meta.version.or(non_empty(entry.version.as_deref()));
            meta.team_name = meta.team_name.or(non_empty(entry.team_name.as_deref()));
            meta.agent_name = meta.agent_name.or(non_empty(entry.agent_name.as_deref()));
            if let Some(timestamp) = non_empty(entry.timestamp.as_deref()) {
                meta.started = meta.started.or(Some(timestamp));
                meta.ended = Some(timestamp);
            }
            if entry.kind == EntryKind::Assistant && meta.model.is_none() {
                meta.model = entry
                    .message
                    .as_ref()
                    .and_then(|message| message.model.as_deref())
                    .filter(|model| !model.is_empty());
            }
        }
        meta
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn render_header(output: &mut String, path: &Path, meta: &SessionMeta<'_>) {
    output.push_str("# Session Summary\n\n");
    if let Some(session_id) = meta.session_id {
        output.push_str(&format!("- **Session**: `{session_id}`\n"));
    }
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    if file_name.starts_with(AGENT_PREFIX) {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default();
        let agent_id = stem.strip_prefix(AGENT_PREFIX).unwrap_or(stem);
        output.push_str(&format!("- **Agent ID**: `{agent_id}`\n"));
    }
    if let Some(team) = meta.team_name {
        output.push_str(&format!("- **Team**: {team}\n"));
    }
    if let Some(agent_name) = meta.agent_name {
        output.push_str(&format!("- **Agent Name**: {agent_name}\n"));
    }
    if let Some(model) = meta.model {
        output.push_str(&format!("- **Model**: {model}\n"));
    }
    if let Some(cwd) = meta.cwd {
        output.push_str(&format!("- **Working Directory**: `{cwd}`\n"));
    }
    if let Some(version) = meta.version {
        output.push_str(&format!("- **Claude Code Version**: {version}\n"));
    }
    if let Some(started) = meta.started {
        output.push_str(&format!("- **Started**: {started}\n"));
    }
    if let Some(ended) = meta.ended
        && Some(ended) != meta.started
    {
        output.push_str(&format!("- **Ended**: {ended}\n"));
    }
    output.push_str(&format!("- **Transcript**: `{}`\n\n", path.display()));
}

/// Single pass over deduplicated entries, appending markdown as it goes.
#[derive(Debug, Default)]
struct Summarizer {
    output: String,
    turns: usize,
    tool_calls: HashMap<String, ToolInvocation>,
    files_modified: BTreeSet<String>,
    /// Invocation counts in first-use order.
    tool_counts: Vec<(String, usize)>,
}

impl Summarizer {
    fn process(&mut self, entry: &LogEntry) {
        match entry.kind {
            EntryKind::User => self.process_user(entry),
            EntryKind::Assistant => self.process_assistant(entry),
            EntryKind::System | EntryKind::Meta => {}
        }
    }

    fn process_user(&mut self, entry: &LogEntry) {
        let Some(message) = entry.message.as_ref() else {
            return;
        };

        if let Some(prompt) = extract_user_prompt(&message.content) {
            self.turns += 1;
            self.output.push_str(&format!("## Turn {}: User Prompt\n\n", self.turns));
            self.output.push_str(&format::truncate_chars(&prompt, PROMPT_PREVIEW_CHARS));
            self.output.push_str("\n\n");
        }

        for block in entry.blocks() {
            let ContentBlock::ToolResult(result) = block else {
                continue;
            };
            if !self.tool_calls.contains_key(&result.tool_use_id) {
                continue;
            }
            let formatted = format::format_tool_result(result, entry.tool_use_result.as_ref());
            self.output.push_str(&format!("  - **Result**: {formatted}\n\n"));
        }
    }

    fn process_assistant(&mut self, entry: &LogEntry) {
        for block in entry.blocks() {
            match block {
                ContentBlock::Thinking(thinking) if !thinking.is_empty() => {
                    self.render_thinking(thinking);
                }
                ContentBlock::Text(text) if !text.trim().is_empty() => {
                    self.output.push_str("### Assistant Response\n\n");
                    self.output.push_str(text.trim());
                    self.output.push_str("\n\n");
                }
                ContentBlock::ToolUse(call) => self.record_tool_use(call),
                _ => {}
            }
        }
    }

    fn render_thinking(&mut self, thinking: &str) {
        self.output.push_str("### Thinking\n\n");
        match thinking.char_indices().nth(THINKING_PREVIEW_CHARS) {
            Some((cut, _)) => {
                let remaining = thinking[cut..].chars().count();
                self.output.push_str(&thinking[..cut]);
                self.output.push_str(&format!("\n\n... ({remaining} more characters)\n"));
            }
            None => {
                self.output.push_str(thinking);
                self.output.push('\n');
            }
        }
        self.output.push('\n');
    }

    fn record_tool_use(&mut self, call: &ToolInvocation) {
        let name = if call.name.is_empty() {
            "?"
        } else {
            call.name.as_str()
        };

        match self.tool_counts.iter_mut().find(|(tool, _)| tool == name) {
            Some((_, count)) => *count += 1,
            None => self.tool_counts.push((name.to_string(), 1)),
        }
        self.tool_calls.insert(call.id.clone(), call.clone());

        if FILE_MUTATING_TOOLS.contains(&name)
            && let Some(path) = file_path(&call.input)
        {
            self.files_modified.insert(path.to_string());
        }

        let formatted = format::format_tool_input(name, &call.input);
        self.output.push_str(&format!("- **{name}**: {formatted}\n"));
    }

    fn finish(mut self) -> String {
        self.output.push_str("\n---\n\n## Summary Statistics\n\n");
        self.output.push_str(&format!("- **Turns**: {}\n", self.turns));

        if !self.tool_counts.is_empty() {
            let total = self.tool_counts.iter().map(|(_, count)| count).sum::<usize>();
            self.output.push_str(&format!("- **Total Tool Calls**: {total}\n"));
            let mut counts = self.tool_counts;
            counts.sort_by_key(|(_, count)| Reverse(*count));
            let breakdown = counts
                .iter()
                .map(|(name, count)| format!("{name} ({count})"))
                .collect::<Vec<_>>()
                .join(", ");
            self.output.push_str(&format!("- **Tools Used**: {breakdown}\n"));
        }

        if !self.files_modified.is_empty() {
            self.output.push_str(&format!(
                "- **Files Modified**: {}\n",
                self.files_modified.len()
            ));
            for file_path in &self.files_modified {
                self.output.push_str(&format!("  - `{file_path}`\n"));
            }
        }

        self.output
    }
}

fn file_path(input: &ToolInput) -> Option<&str> {
    input
        .get("file_path")
        .and_then(Value::as_str)
        .filter(|path| !path.is_empty())
}

/// Renders the summary for already-deduplicated `entries` read from `path`.
pub fn render_summary(path: &Path, entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "(empty transcript)\n".to_string();
    }

    let meta = SessionMeta::collect(entries);
    let mut summarizer = Summarizer::default();
    render_header(&mut summarizer.output, path, &meta);
    for entry in entries {
        summarizer.process(entry);
    }
    summarizer.finish()
}
