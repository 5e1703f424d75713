//! Recovers a JSON value from free-form generation output.
//!
//! Models wrap JSON in prose or markdown fences often enough that a plain
//! `serde_json::from_str` is not sufficient. Strategies are tried in order and
//! the first one yielding an object or array wins. Every strategy is pure and
//! total: bad input yields `None`, never a panic.

use serde_json::Value;

type Strategy = fn(&str) -> Option<Value>;

const STRATEGIES: [(&str, Strategy); 3] = [
    ("direct", parse_direct),
    ("fenced_block", parse_fenced_block),
    ("brace_scan", parse_brace_scan),
];

/// Extract the first JSON object or array from `text`.
#[must_use]
pub fn extract_json(text: &str) -> Option<Value> {
    STRATEGIES.iter().find_map(|(name, strategy)| {
        let value = strategy(text)?;
        tracing::trace!(strategy = name, "extracted JSON from generated text");
        Some(value)
    })
}

fn structured(value: Value) -> Option<Value> {
    matches!(value, Value::Object(_) | Value::Array(_)).then_some(value)
}

fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text.trim()).ok().and_then(structured)
}

/// Contents of the first ```` ``` ```` fenced block, skipping a language tag.
fn parse_fenced_block(text: &str) -> Option<Value> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    let body_start = after_fence.find('\n').map_or(0, |i| i + 1);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    parse_direct(&body[..close])
}

/// Try every `{` / `[` as a start and parse up to its balanced close.
fn parse_brace_scan(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{' || *c == '[')
        .find_map(|(start, _)| {
            let end = balanced_end(&text[start..])?;
            parse_direct(&text[start..start + end])
        })
}

/// Byte length of the balanced bracket expression at the start of `s`.
fn balanced_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
