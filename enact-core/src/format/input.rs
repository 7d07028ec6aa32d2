use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::{Map, Value};

use super::{oneline, truncate_chars, value_text};

pub type ToolInput = Map<String, Value>;

/// Renders one tool's input as a single summary line (Edit adds detail lines).
pub type InputFormatter = fn(&ToolInput) -> String;

const MCP_PREFIX: &str = "mcp__";
const MCP_INFO_KEYS: &[&str] = &[
    "url",
    "phabricator_diff_number",
    "pattern",
    "keywords",
    "natural_language_query",
    "comment",
    "diff_num",
];

static INPUT_FORMATTERS: Lazy<HashMap<&'static str, InputFormatter>> = Lazy::new(|| {
    let mut formatters = HashMap::<&'static str, InputFormatter>::new();
    formatters.insert("Read", format_read);
    formatters.insert("Edit", format_edit);
    formatters.insert("Write", format_write);
    formatters.insert("Bash", format_bash);
    formatters.insert("Glob", format_glob);
    formatters.insert("Grep", format_grep);
    formatters.insert("Task", format_task);
    formatters.insert("SendMessage", format_send_message);
    formatters.insert("TeamCreate", format_team_create);
    formatters.insert("TeamDelete", |_| "(cleanup)".to_string());
    formatters.insert("WebSearch", |input| format!("\"{}\"", str_or(input, "query", "?")));
    formatters.insert("WebFetch", |input| str_or(input, "url", "?"));
    formatters.insert("AskUserQuestion", format_ask_user_question);
    formatters.insert("TaskCreate", |input| {
        format!("\"{}\"", str_or(input, "subject", "?"))
    });
    formatters.insert("TaskUpdate", format_task_update);
    formatters.insert("Skill", |input| str_or(input, "skill", "?"));
    formatters
});

/// Dispatches on the tool name; unknown tools fall back to [`format_generic`].
pub fn format_tool_input(name: &str, input: &ToolInput) -> String {
    if let Some(formatter) = INPUT_FORMATTERS.get(name) {
        return formatter(input);
    }
    if name.starts_with(MCP_PREFIX) {
        return format_mcp(name, input);
    }
    format_generic(input)
}

fn str_or(input: &ToolInput, key: &str, default: &str) -> String {
    input
        .get(key)
        .map_or_else(|| default.to_string(), value_text)
}

fn str_field<'a>(input: &'a ToolInput, key: &str) -> &'a str {
    input.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn bool_field(input: &ToolInput, key: &str) -> bool {
    input.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn format_read(input: &ToolInput) -> String {
    let mut parts = vec![format!("**{}**", str_or(input, "file_path", "?"))];
    if let Some(offset) = input.get("offset") {
        parts.push(format!("from line {}", value_text(offset)));
    }
    if let Some(limit) = input.get("limit") {
        parts.push(format!("({} lines)", value_text(limit)));
    }
    parts.join(" ")
}

fn format_edit(input: &ToolInput) -> String {
    let old = str_field(input, "old_string");
    let new = str_field(input, "new_string");

    let mut out = format!("**{}**", str_or(input, "file_path", "?"));
    if bool_field(input, "replace_all") {
        out.push_str(" (replace all)");
    }
    out.push('\n');
    if !old.is_empty() {
        out.push_str(&format!(
            "  - Remove: `{}`\n",
            oneline(&truncate_chars(old, 300))
        ));
    }
    if !new.is_empty() {
        out.push_str(&format!(
            "  - Insert: `{}`",
            oneline(&truncate_chars(new, 300))
        ));
    }
    out
}

fn format_write(input: &ToolInput) -> String {
    let content = str_field(input, "content");
    format!(
        "**{}** ({} chars)",
        str_or(input, "file_path", "?"),
        content.chars().count()
    )
}

fn format_bash(input: &ToolInput) -> String {
    let description = str_field(input, "description");
    let mut out = format!("`{}`", str_or(input, "command", "?"));
    if !description.is_empty() {
        out.push_str(&format!(" — {description}"));
    }
    out
}

fn format_glob(input: &ToolInput) -> String {
    let pattern = str_or(input, "pattern", "?");
    match str_field(input, "path") {
        "" => format!("`{pattern}`"),
        path => format!("`{pattern}` in {path}"),
    }
}

fn format_grep(input: &ToolInput) -> String {
    let path = str_field(input, "path");
    let mode = input
        .get("output_mode")
        .and_then(Value::as_str)
        .unwrap_or("files_with_matches");

    let mut out = format!("`{}`", str_or(input, "pattern", "?"));
    if !path.is_empty() {
        out.push_str(&format!(" in {path}"));
    }
    if mode != "files_with_matches" {
        out.push_str(&format!(" (mode: {mode})"));
    }
    out
}

fn format_task(input: &ToolInput) -> String {
    let description = str_field(input, "description");
    let agent_type = str_field(input, "subagent_type");
    let team = str_field(input, "team_name");
    let agent_name = str_field(input, "name");
    let prompt = str_field(input, "prompt");

    let mut out = String::new();
    if !description.is_empty() {
        out.push_str(&format!("**{description}**"));
    }
    if !agent_type.is_empty() {
        out.push_str(&format!(" (type: {agent_type})"));
    }
    if !team.is_empty() {
        out.push_str(&format!(" [team: {team}]"));
    }
    if !agent_name.is_empty() {
        out.push_str(&format!(" as {agent_name}"));
    }
    if !prompt.is_empty() {
        out.push_str(&format!("\n  Prompt: {}", truncate_chars(prompt, 200)));
    }
    out
}

fn format_send_message(input: &ToolInput) -> String {
    let recipient = str_field(input, "recipient");
    let content = str_field(input, "content");
    let summary = str_field(input, "summary");
    let verdict = if bool_field(input, "approve") {
        "approved"
    } else {
        "rejected"
    };

    match input
        .get("type")
        .and_then(Value::as_str)
        .unwrap_or("message")
    {
        "shutdown_request" => format!("shutdown request -> {recipient}"),
        "shutdown_response" => format!("shutdown {verdict}"),
        "broadcast" => {
            let text = if summary.is_empty() { content } else { summary };
            format!("broadcast: {}", text.chars().take(100).collect::<String>())
        }
        "plan_approval_response" => format!("plan {verdict} -> {recipient}"),
        _ => {
            let preview = if summary.is_empty() {
                content.chars().take(100).collect::<String>()
            } else {
                summary.to_string()
            };
            format!("-> {recipient}: {preview}")
        }
    }
}

fn format_team_create(input: &ToolInput) -> String {
    let team = str_or(input, "team_name", "?");
    match str_field(input, "description") {
        "" => format!("**{team}**"),
        description => format!("**{team}** — {description}"),
    }
}

fn format_ask_user_question(input: &ToolInput) -> String {
    input
        .get("questions")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|question| {
            question
                .get("question")
                .map_or_else(|| "?".to_string(), value_text)
        })
        .collect::<Vec<_>>()
        .join("; ")
}

fn format_task_update(input: &ToolInput) -> String {
    let task_id = str_or(input, "taskId", "?");
    match str_field(input, "status") {
        "" => format!("task {task_id}"),
        status => format!("task {task_id} -> {status}"),
    }
}

/// `mcp__server__tool` renders as `tool: <first informative input>`.
fn format_mcp(name: &str, input: &ToolInput) -> String {
    let short_name = name.rsplit("__").next().unwrap_or(name);
    MCP_INFO_KEYS
        .iter()
        .find_map(|key| input.get(*key))
        .map_or_else(
            || short_name.to_string(),
            |value| format!("{short_name}: {}", truncate_chars(&value_text(value), 150)),
        )
}

/// Up to three `key=value` pairs, otherwise just the parameter count.
pub fn format_generic(input: &ToolInput) -> String {
    if input.len() > 3 {
        return format!("({} parameters)", input.len());
    }

    input
        .iter()
        .map(|(key, value)| format!("{key}={}", truncate_chars(&value_text(value), 80)))
        .collect::<Vec<_>>()
        .join(", ")
}
