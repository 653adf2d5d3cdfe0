//! Pulling the JSON payload out of a model reply.

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Locate the JSON document inside a reply. Prefers a fenced ```json block,
/// otherwise takes the span from the first `{` or `[` to the last matching
/// closer.
pub fn extract_json_payload(text: &str) -> Option<&str> {
    if let Some(fenced) = fenced_block(text) {
        return Some(fenced);
    }
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    let body_start = after.find('\n')? + 1;
    let lang = after[..body_start].trim();
    if !(lang.is_empty() || lang.eq_ignore_ascii_case("json")) {
        return None;
    }
    let body = &after[body_start..];
    let close = body.find("```")?;
    let inner = body[..close].trim();
    (!inner.is_empty()).then_some(inner)
}

/// Decode a reply into `T`. The error string explains what was wrong with it.
///
/// Providers in JSON-object mode wrap list answers as `{"items": [...]}`; when
/// the plain decode fails, a single-key object holding an array is unwrapped
/// and tried again.
pub fn decode_reply<T: DeserializeOwned>(text: &str) -> Result<T, String> {
    let payload = extract_json_payload(text).ok_or_else(|| "reply contains no JSON document".to_string())?;
    match serde_json::from_str(payload) {
        Ok(out) => Ok(out),
        Err(e) => wrapped_array(payload)
            .and_then(|inner| serde_json::from_value(inner).ok())
            .ok_or_else(|| format!("reply does not match the output schema: {e}")),
    }
}

fn wrapped_array(payload: &str) -> Option<Value> {
    let Ok(Value::Object(map)) = serde_json::from_str(payload) else {
        return None;
    };
    if map.len() != 1 {
        return None;
    }
    map.into_iter().next().map(|(_, inner)| inner).filter(Value::is_array)
}
