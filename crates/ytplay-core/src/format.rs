//! Display formatting shared by the engine and the CLI.

use serde_json::Value;

use crate::snapshot::Track;

/// Cell text longer than this is trimmed (the full text stays in the tooltip).
pub const CELL_MAX_CHARS: usize = 140;

/// `m:ss`, or `h:mm:ss` past the hour. Invalid or negative input is `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total = seconds.floor() as u64;
    let hours = total / 3600;
    let mins = (total / 60) % 60;
    let secs = total % 60;
    if hours > 0 {
        format!("{hours}:{mins:02}:{secs:02}")
    } else {
        format!("{mins}:{secs:02}")
    }
}

/// `"{title} - {artist}"`, or `"-"` when there is no track.
pub fn format_track(track: Option<&Track>) -> String {
    match track {
        Some(t) => format!("{} - {}", t.title_or_unknown(), t.artist_or_unknown()),
        None => "-".to_string(),
    }
}

/// One rendered table cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedCell {
    pub text: String,
    /// Untrimmed text, kept for hover display.
    pub full: String,
    pub truncated: bool,
}

/// Render a raw JSON value as table cell text.
///
/// Strings that look like JSON objects or arrays are re-serialized compactly.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => {
            let trimmed = s.trim();
            let looks_json = (trimmed.starts_with('{') && trimmed.ends_with('}'))
                || (trimmed.starts_with('[') && trimmed.ends_with(']'));
            if looks_json {
                if let Ok(parsed) = serde_json::from_str::<Value>(trimmed) {
                    return parsed.to_string();
                }
            }
            s.clone()
        }
        Value::Array(_) | Value::Object(_) => value.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
    }
}

pub fn trim_cell(text: &str, max_chars: usize) -> (String, bool) {
    if text.chars().count() <= max_chars {
        return (text.to_string(), false);
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    (format!("{head}..."), true)
}

pub fn format_cell(value: &Value) -> FormattedCell {
    let full = cell_text(value);
    let (text, truncated) = trim_cell(&full, CELL_MAX_CHARS);
    FormattedCell {
        text,
        full,
        truncated,
    }
}
