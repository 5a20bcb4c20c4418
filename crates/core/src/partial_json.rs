//! Partial JSON
//!
//! Helpers for reading JSON that a model is still in the middle of writing.
//! Models frequently wrap objects in markdown fences or prose, and a stream
//! cut at an arbitrary byte is rarely valid JSON on its own.

use serde_json::Value;

/// Strip a surrounding markdown code fence (```json ... ``` or ``` ... ```).
///
/// An unterminated fence (still streaming) yields everything after the
/// opening line.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_fence = &trimmed[start + 3..];
    // Skip optional language identifier (e.g., "json")
    let content = match after_fence.find('\n') {
        Some(nl) => &after_fence[nl + 1..],
        None => return "",
    };
    match content.find("```") {
        Some(end) => content[..end].trim(),
        None => content.trim(),
    }
}

/// Locate the JSON object in a complete model response.
///
/// Returns the slice from the first `{` to the last `}`, after fence
/// stripping, or the trimmed text when no braces are present.
pub fn extract_json_object(text: &str) -> &str {
    let body = strip_code_fence(text);
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if start <= end => &body[start..=end],
        _ => body,
    }
}

/// Best-effort parse of a JSON document that may be truncated.
///
/// Open strings are terminated and open objects/arrays closed. When the tail
/// is a dangling key, colon or half-written literal, the text is cut back to
/// the last complete member and closed from there. Returns `None` when no
/// opening `{` or `[` has been seen yet.
pub fn repair_partial_json(text: &str) -> Option<Value> {
    let body = strip_code_fence(text);
    let start = body.find(|c| c == '{' || c == '[')?;
    let body = &body[start..];

    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Some(value);
    }

    if let Ok(value) = serde_json::from_str::<Value>(&close_prefix(body)) {
        return Some(value);
    }

    for cut in cut_points(body).into_iter().rev() {
        if let Ok(value) = serde_json::from_str::<Value>(&close_prefix(&body[..cut])) {
            return Some(value);
        }
    }

    None
}

/// Byte offsets where the document can be cut and still close cleanly:
/// before each member-separating comma and right after each opening bracket.
fn cut_points(text: &str) -> Vec<usize> {
    let mut points = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            ',' => points.push(i),
            '{' | '[' => points.push(i + 1),
            _ => {}
        }
    }
    points
}

/// Terminate an open string, drop a trailing comma and append the closing
/// brackets for every structure still open.
fn close_prefix(prefix: &str) -> String {
    let mut stack: Vec<char> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for c in prefix.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => stack.push('}'),
            '[' => stack.push(']'),
            '}' | ']' => {
                stack.pop();
            }
            _ => {}
        }
    }

    let mut out = if in_string {
        prefix.to_string()
    } else {
        prefix.trim_end().to_string()
    };

    if in_string {
        if escaped {
            out.pop();
        }
        out.push('"');
    } else {
        while out.ends_with(',') {
            out.pop();
            out.truncate(out.trim_end().len());
        }
    }

    while let Some(close) = stack.pop() {
        out.push(close);
    }
    out
}
