use serde_json::{Map as JsonMap, Value};

/// Width of a one-line tool invocation preview.
pub const DISPLAY_WIDTH: usize = 80;
const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max` characters, marking the cut with `...`.
///
/// Text already within the limit is returned unchanged, so the function is
/// idempotent.
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    if max <= ELLIPSIS.len() {
        return text.chars().take(max).collect();
    }
    let keep = max - ELLIPSIS.len();
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(ELLIPSIS);
    out
}

/// Render `name k=v k=v` for an invocation, capped at [`DISPLAY_WIDTH`].
pub fn format_display(name: &str, arguments: &JsonMap<String, Value>) -> String {
    let mut line = name.to_string();
    for (key, value) in arguments {
        line.push(' ');
        line.push_str(key);
        line.push('=');
        match value {
            Value::String(text) => line.push_str(text),
            other => line.push_str(&other.to_string()),
        }
    }
    truncate(&line, DISPLAY_WIDTH)
}
