//! Markdown snippets for tool calls and their results.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub mod input;
pub mod result;

pub use input::format_tool_input;
pub use result::format_tool_result;

static SYSTEM_REMINDER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<system-reminder>.*?</system-reminder>").expect("valid regex")
});
static COMMAND_CAVEAT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<local-command-caveat>.*?</local-command-caveat>").expect("valid regex")
});
static COMMAND_STDOUT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<local-command-stdout>.*?</local-command-stdout>").expect("valid regex")
});
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Removes reminder, caveat and captured-stdout markup, then trims.
pub fn strip_xml_tags(text: &str) -> String {
    let text = SYSTEM_REMINDER_RE.replace_all(text, "");
    let text = COMMAND_CAVEAT_RE.replace_all(&text, "");
    let text = COMMAND_STDOUT_RE.replace_all(&text, "");
    text.trim().to_string()
}

/// Collapses whitespace runs so the text fits on one line.
pub fn oneline(text: &str) -> String {
    WHITESPACE_RE.replace_all(text, " ").trim().to_string()
}

/// First `max_chars` characters, with `...` appended when anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Strings render bare; everything else as compact JSON.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `1234567` -> `1,234,567`.
pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
