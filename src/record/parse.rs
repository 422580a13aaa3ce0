use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::record::model::ContentPayload;

/// Literal backslash followed by a whitespace character. Models escape
/// things that need no escaping; both characters go.
static ESCAPE_ARTIFACT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\\s").expect("static regex"));

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("no JSON object found in payload")]
    NoObject,
    #[error("invalid payload JSON: {source} (near: {snippet})")]
    Invalid {
        source: serde_json::Error,
        snippet: String,
    },
}

/// Decodes a model-emitted payload string that is JSON-shaped but not
/// reliably JSON. Prose around the outermost object is discarded, bare
/// control characters inside string literals are escaped, and the `content`
/// and `suggestions` fields are coerced to their expected types.
pub fn parse_loose_payload(raw: &str) -> Result<ContentPayload, PayloadError> {
    let slice = outermost_object(raw)?;
    let value: Value = match serde_json::from_str(slice) {
        Ok(value) => value,
        Err(_) => serde_json::from_str(&repair_json_text(slice)).map_err(|source| {
            PayloadError::Invalid {
                source,
                snippet: slice.chars().take(120).collect(),
            }
        })?,
    };
    let mut payload = payload_from_value(&value);
    payload.content = clean_content(&payload.content);
    Ok(payload)
}

/// Pulls the follow-up suggestions out of a raw payload string. Extraction
/// never fails; anything undecodable simply yields no suggestions.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    match parse_loose_payload(raw) {
        Ok(payload) => payload.suggestions,
        Err(err) => {
            tracing::debug!("no suggestions extracted: {err}");
            Vec::new()
        }
    }
}

/// Field-level coercion shared by the loose parser and the wire decoder:
/// whatever shape the fields arrive in, `content` becomes a string and
/// `suggestions` a list of strings.
pub fn payload_from_value(value: &Value) -> ContentPayload {
    let content = value.get("content").map(coerce_string).unwrap_or_default();
    let suggestions = value
        .get("suggestions")
        .map(coerce_string_list)
        .unwrap_or_default();
    ContentPayload {
        content,
        suggestions,
    }
}

/// Strips escape artifacts and surrounding whitespace from decoded content.
pub fn clean_content(content: &str) -> String {
    ESCAPE_ARTIFACT.replace_all(content, "").trim().to_string()
}

fn outermost_object(raw: &str) -> Result<&str, PayloadError> {
    let start = raw.find('{').ok_or(PayloadError::NoObject)?;
    let end = raw.rfind('}').ok_or(PayloadError::NoObject)?;
    if end < start {
        return Err(PayloadError::NoObject);
    }
    Ok(&raw[start..=end])
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn coerce_string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(coerce_string).collect(),
        _ => Vec::new(),
    }
}

/// Second-chance pass for text that failed strict parsing. Inside string
/// literals, raw control characters become their escape sequences and a
/// backslash that does not start a valid escape is doubled so it reads as a
/// literal backslash. Text outside strings passes through untouched.
fn repair_json_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 8);
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    while let Some(ch) = chars.next() {
        if !in_string {
            if ch == '"' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }
        match ch {
            '"' => {
                in_string = false;
                out.push(ch);
            }
            '\\' => match chars.peek() {
                Some(&next)
                    if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') =>
                {
                    out.push('\\');
                    out.push(next);
                    chars.next();
                }
                _ => out.push_str("\\\\"),
            },
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}
