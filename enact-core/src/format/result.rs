use serde_json::{Map, Value};

use super::{group_thousands, strip_xml_tags, truncate_chars, value_text};
use crate::model::ToolResult;

/// Recognizes one `toolUseResult` shape; `None` passes to the next formatter.
pub type ResultFormatter = fn(&Map<String, Value>) -> Option<String>;

/// Checked in order: the first formatter that recognizes the payload wins.
const RESULT_FORMATTERS: &[ResultFormatter] = &[
    format_file_read,
    format_edit_confirmation,
    format_command_output,
    format_file_listing,
    format_agent_outcome,
];

/// Summarizes a tool result, preferring the structured `toolUseResult` payload
/// of the surrounding entry over the raw result text.
pub fn format_tool_result(result: &ToolResult, tool_use_result: Option<&Value>) -> String {
    if let Some(structured) = tool_use_result.and_then(Value::as_object)
        && let Some(formatted) = RESULT_FORMATTERS
            .iter()
            .find_map(|formatter| formatter(structured))
    {
        return formatted;
    }

    let text = strip_xml_tags(&result.text());
    if result.is_error {
        return format!("ERROR: {}", truncate_chars(&text, 300));
    }
    if text.is_empty() {
        return "(no result)".to_string();
    }
    truncate_chars(&text, 300)
}

fn str_field<'a>(payload: &'a Map<String, Value>, key: &str) -> &'a str {
    payload.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn u64_field(payload: &Map<String, Value>, key: &str) -> u64 {
    payload.get(key).and_then(Value::as_u64).unwrap_or(0)
}

fn format_file_read(payload: &Map<String, Value>) -> Option<String> {
    if payload.get("type").and_then(Value::as_str) != Some("text") {
        return None;
    }
    let file = payload.get("file")?;

    Some(format!(
        "Read {} lines from {} ({} total)",
        file.get("numLines").and_then(Value::as_u64).unwrap_or(0),
        file.get("filePath").and_then(Value::as_str).unwrap_or("?"),
        file.get("totalLines").and_then(Value::as_u64).unwrap_or(0),
    ))
}

fn format_edit_confirmation(payload: &Map<String, Value>) -> Option<String> {
    payload.contains_key("structuredPatch").then(|| {
        format!(
            "Edited {}",
            payload
                .get("filePath")
                .map_or_else(|| "?".to_string(), value_text)
        )
    })
}

fn format_command_output(payload: &Map<String, Value>) -> Option<String> {
    if !payload.contains_key("stdout") {
        return None;
    }

    let stdout = str_field(payload, "stdout").trim();
    let stderr = str_field(payload, "stderr").trim();

    let mut sections = Vec::new();
    if !stdout.is_empty() {
        sections.push(format!("stdout: {}", truncate_chars(stdout, 300)));
    }
    if !stderr.is_empty() {
        sections.push(format!("stderr: {}", truncate_chars(stderr, 200)));
    }
    if sections.is_empty() {
        return Some("(no output)".to_string());
    }
    Some(sections.join("\n"))
}

fn format_file_listing(payload: &Map<String, Value>) -> Option<String> {
    let filenames = payload
        .get("filenames")?
        .as_array()
        .map(|names| names.iter().map(value_text).collect::<Vec<_>>())
        .unwrap_or_default();
    let count = payload
        .get("numFiles")
        .and_then(Value::as_u64)
        .unwrap_or(filenames.len() as u64);

    if count <= 5 {
        Some(format!("Found: {}", filenames.join(", ")))
    } else {
        Some(format!("Found {count} files"))
    }
}

fn format_agent_outcome(payload: &Map<String, Value>) -> Option<String> {
    let agent_id = value_text(payload.get("agentId")?);
    let status = payload
        .get("status")
        .map_or_else(|| "?".to_string(), value_text);
    let tokens = u64_field(payload, "totalTokens");
    let tool_calls = u64_field(payload, "totalToolUseCount");

    let output = payload
        .get("content")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|part| part.get("type").and_then(Value::as_str) == Some("text"))
        .filter_map(|part| part.get("text").and_then(Value::as_str))
        .collect::<String>();

    let mut line = format!("Agent {agent_id} ({status})");
    if tokens > 0 {
        line.push_str(&format!(
            " — {} tokens, {tool_calls} tool calls",
            group_thousands(tokens)
        ));
    }
    if !output.is_empty() {
        line.push_str(&format!("\n  Result: {}", truncate_chars(&output, 300)));
    }
    Some(line)
}
