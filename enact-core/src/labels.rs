use std::collections::HashMap;
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::jsonl;
use crate::model::{ContentBlock, EntryKind, LogEntry};

pub const SPAWN_TOOL_NAME: &str = "Task";

static AGENT_ID_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"agentId: (a[0-9a-f]+)").expect("valid regex"));

/// Maps spawned agent ids to the description given when they were spawned.
///
/// A `Task` call is remembered by its call id; the result answering that id
/// carries an `agentId: a<hex>` line. Results whose text lacks that line
/// leave the agent unlabeled.
pub fn build_agent_label_map<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
) -> HashMap<String, String> {
    let mut labels = HashMap::new();
    let mut pending = HashMap::<String, String>::new();

    for entry in entries {
        match entry.kind {
            EntryKind::Assistant => {
                for block in entry.blocks() {
                    if let ContentBlock::ToolUse(call) = block
                        && call.name == SPAWN_TOOL_NAME
                    {
                        let description = call
                            .input
                            .get("description")
                            .and_then(Value::as_str)
                            .unwrap_or_default();
                        pending.insert(call.id.clone(), description.to_string());
                    }
                }
            }
            EntryKind::User => {
                for block in entry.blocks() {
                    let ContentBlock::ToolResult(result) = block else {
                        continue;
                    };
                    let Some(description) = pending.get(&result.tool_use_id) else {
                        continue;
                    };
                    if let Some(agent_id) = extract_agent_id(&result.text()) {
                        labels.insert(agent_id, description.clone());
                    }
                }
            }
            EntryKind::System | EntryKind::Meta => {}
        }
    }

    labels
}

/// Label map for an orchestrator transcript; unreadable files yield no labels.
pub fn agent_labels_for(orchestrator: &Path) -> HashMap<String, String> {
    let entries = jsonl::scan_entries(orchestrator).collect::<Vec<_>>();
    build_agent_label_map(&entries)
}

pub fn extract_agent_id(text: &str) -> Option<String> {
    AGENT_ID_RE
        .captures(text)
        .and_then(|captures| captures.get(1))
        .map(|id| id.as_str().to_string())
}
