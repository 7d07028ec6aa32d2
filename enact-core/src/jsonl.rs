//! Line-delimited transcript reading.
//!
//! Every line is parsed on its own. A line that is not a well-formed JSON
//! object is skipped, so a file caught mid-write still yields everything up
//! to its torn tail.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader, Split};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::{EnactError, Result};
use crate::model::{
    ContentBlock, EntryKind, LogEntry, Message, MessageContent, ToolInvocation, ToolResult,
};

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RawRecord {
    #[serde(rename = "type")]
    record_type: Option<Value>,
    timestamp: Option<Value>,
    session_id: Option<Value>,
    cwd: Option<Value>,
    version: Option<Value>,
    team_name: Option<Value>,
    agent_name: Option<Value>,
    message: Option<RawMessage>,
    tool_use_result: Option<Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawMessage {
    id: Option<Value>,
    model: Option<Value>,
    content: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawBlock {
    Thinking {
        #[serde(default)]
        thinking: String,
    },
    Text {
        #[serde(default)]
        text: String,
    },
    ToolUse {
        #[serde(default)]
        id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: String,
        #[serde(default)]
        is_error: Option<bool>,
        #[serde(default)]
        content: Value,
    },
    #[serde(other)]
    Unknown,
}

/// Parses one transcript line. Returns `None` for blank or malformed lines.
pub fn parse_entry_line(line: &[u8], line_no: usize) -> Option<LogEntry> {
    if line.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    let raw = serde_json::from_slice::<RawRecord>(line).ok()?;
    Some(LogEntry {
        kind: EntryKind::from_record_type(raw.record_type.as_ref().and_then(Value::as_str)),
        line: line_no,
        timestamp: scalar_text(raw.timestamp),
        session_id: scalar_text(raw.session_id),
        cwd: scalar_text(raw.cwd),
        version: scalar_text(raw.version),
        team_name: scalar_text(raw.team_name),
        agent_name: scalar_text(raw.agent_name),
        message: raw.message.map(convert_message),
        tool_use_result: raw.tool_use_result,
    })
}

/// Metadata fields are read leniently: a stray number still reads as text,
/// and any other shape counts as absent instead of rejecting the line.
fn scalar_text(value: Option<Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn convert_message(raw: RawMessage) -> Message {
    let content = match raw.content {
        Some(Value::String(text)) => MessageContent::Text(text),
        Some(Value::Array(items)) => {
            MessageContent::Blocks(items.into_iter().map(convert_block).collect())
        }
        _ => MessageContent::Blocks(Vec::new()),
    };

    Message {
        id: scalar_text(raw.id),
        model: scalar_text(raw.model),
        content,
    }
}

fn convert_block(item: Value) -> ContentBlock {
    let Ok(block) = serde_json::from_value::<RawBlock>(item) else {
        return ContentBlock::Other;
    };

    match block {
        RawBlock::Thinking { thinking } => ContentBlock::Thinking(thinking),
        RawBlock::Text { text } => ContentBlock::Text(text),
        RawBlock::ToolUse { id, name, input } => ContentBlock::ToolUse(ToolInvocation {
            id,
            name,
            input: match input {
                Value::Object(map) => map,
                _ => Map::new(),
            },
        }),
        RawBlock::ToolResult {
            tool_use_id,
            is_error,
            content,
        } => ContentBlock::ToolResult(ToolResult {
            tool_use_id,
            is_error: is_error.unwrap_or(false),
            content,
        }),
        RawBlock::Unknown => ContentBlock::Other,
    }
}

/// Streams the entries of one transcript file in append order.
///
/// Malformed lines are skipped. An I/O failure is yielded once and ends the
/// stream.
pub struct TranscriptReader<R> {
    path: PathBuf,
    lines: Split<R>,
    line_no: usize,
    failed: bool,
}

impl TranscriptReader<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| EnactError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, BufReader::new(file)))
    }
}

impl<R: BufRead> TranscriptReader<R> {
    pub fn new(path: &Path, reader: R) -> Self {
        Self {
            path: path.to_path_buf(),
            lines: reader.split(b'\n'),
            line_no: 0,
            failed: false,
        }
    }
}

impl<R: BufRead> Iterator for TranscriptReader<R> {
    type Item = Result<LogEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(source) => {
                    self.failed = true;
                    return Some(Err(EnactError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line_no += 1;

            if let Some(entry) = parse_entry_line(&line, self.line_no) {
                return Some(Ok(entry));
            }
            if !line.iter().all(u8::is_ascii_whitespace) {
                tracing::debug!(
                    path = %self.path.display(),
                    line = self.line_no,
                    "skipping malformed transcript line"
                );
            }
        }
    }
}

/// Reads a whole transcript and applies [`dedup_assistant_messages`].
pub fn read_transcript(path: &Path) -> Result<Vec<LogEntry>> {
    let entries = TranscriptReader::open(path)?.collect::<Result<Vec<_>>>()?;
    Ok(dedup_assistant_messages(entries))
}

/// Drops every assistant entry whose message id reappears later in the file.
///
/// Streaming writes the same message several times as it grows; only the
/// last copy is complete. Surviving entries keep their relative order.
pub fn dedup_assistant_messages(entries: Vec<LogEntry>) -> Vec<LogEntry> {
    let mut last_index = HashMap::<&str, usize>::new();
    for (idx, entry) in entries.iter().enumerate() {
        if entry.kind == EntryKind::Assistant
            && let Some(id) = entry.message_id()
        {
            last_index.insert(id, idx);
        }
    }
    let keep = last_index.into_values().collect::<HashSet<_>>();

    entries
        .into_iter()
        .enumerate()
        .filter(|(idx, entry)| {
            entry.kind != EntryKind::Assistant
                || entry.message_id().is_none()
                || keep.contains(idx)
        })
        .map(|(_, entry)| entry)
        .collect()
}

/// Entries of a file for secondary scans: I/O failures end the scan quietly.
pub fn scan_entries(path: &Path) -> impl Iterator<Item = LogEntry> {
    let reader = match TranscriptReader::open(path) {
        Ok(reader) => Some(reader),
        Err(err) => {
            tracing::debug!(error = %err, "skipping unreadable transcript");
            None
        }
    };

    reader.into_iter().flatten().map_while(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(err) => {
            tracing::debug!(error = %err, "transcript scan stopped early");
            None
        }
    })
}

/// Earliest embedded timestamp of a transcript, or `""` when it has none.
pub fn first_timestamp(path: &Path) -> String {
    scan_entries(path)
        .find_map(|entry| entry.timestamp)
        .unwrap_or_default()
}

/// First `(team, agent)` pair a transcript declares.
pub fn team_info(path: &Path) -> Option<(String, String)> {
    scan_entries(path).find_map(|entry| {
        entry
            .team_membership()
            .map(|(team, agent)| (team.to_string(), agent.to_string()))
    })
}
