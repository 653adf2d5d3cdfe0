//! Prompt template rendering.
//!
//! Placeholders may be written as `{field}`, `{{field}}` or `{{{field}}}`; all
//! three substitute the raw value. `{{#if field}}…{{else}}…{{/if}}` picks a
//! branch on whether the field is non-empty, and `{{media url=field}}` moves a
//! data-URI field out of the text and into the request's media attachments.
//! Brace runs whose content is not an identifier are copied through.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm::Media;

/// Text the model sees in place of an attached document.
pub const MEDIA_REFERENCE: &str = "[attached document]";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("template references unknown field `{0}`")]
    UnknownField(String),
    #[error("`{{{{#if {0}}}}}` block is never closed")]
    UnterminatedIf(String),
    #[error("malformed media helper `{0}`")]
    MalformedMedia(String),
    #[error("field `{0}` is not a base64 data URI")]
    InvalidMedia(String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub text: String,
    pub media: Vec<Media>,
}

pub fn render(template: &str, fields: &Map<String, Value>) -> Result<Rendered, TemplateError> {
    let mut out = Rendered {
        text: String::with_capacity(template.len()),
        media: Vec::new(),
    };
    render_into(template, fields, &mut out)?;
    Ok(out)
}

fn render_into(src: &str, fields: &Map<String, Value>, out: &mut Rendered) -> Result<(), TemplateError> {
    let mut rest = src;
    while let Some(start) = rest.find('{') {
        out.text.push_str(&rest[..start]);
        let tail = &rest[start..];
        let depth = tail.bytes().take_while(|b| *b == b'{').count().min(3);
        let close = &"}}}"[..depth];

        let Some(end) = tail[depth..].find(close) else {
            out.text.push_str(tail);
            return Ok(());
        };
        let inner = tail[depth..depth + end].trim();
        let consumed = depth + end + depth;

        if depth == 2 {
            if let Some(field) = inner.strip_prefix("#if ") {
                rest = render_if(field.trim(), &tail[consumed..], fields, out)?;
                continue;
            }
            if let Some(args) = inner.strip_prefix("media ") {
                attach_media(args.trim(), fields, out)?;
                rest = &tail[consumed..];
                continue;
            }
        }

        if is_identifier(inner) {
            let value = fields
                .get(inner)
                .ok_or_else(|| TemplateError::UnknownField(inner.to_string()))?;
            push_value(&mut out.text, value);
        } else {
            out.text.push_str(&tail[..consumed]);
        }
        rest = &tail[consumed..];
    }
    out.text.push_str(rest);
    Ok(())
}

/// Render one conditional block and return the text following `{{/if}}`.
fn render_if<'a>(
    field: &str,
    body: &'a str,
    fields: &Map<String, Value>,
    out: &mut Rendered,
) -> Result<&'a str, TemplateError> {
    const ELSE: &str = "{{else}}";
    const END_IF: &str = "{{/if}}";

    let value = fields
        .get(field)
        .ok_or_else(|| TemplateError::UnknownField(field.to_string()))?;
    let end = body
        .find(END_IF)
        .ok_or_else(|| TemplateError::UnterminatedIf(field.to_string()))?;
    let block = &body[..end];
    let (then_branch, else_branch) = match block.find(ELSE) {
        Some(at) => (&block[..at], &block[at + ELSE.len()..]),
        None => (block, ""),
    };

    let branch = if is_truthy(value) { then_branch } else { else_branch };
    render_into(branch, fields, out)?;
    Ok(&body[end + END_IF.len()..])
}

fn attach_media(args: &str, fields: &Map<String, Value>, out: &mut Rendered) -> Result<(), TemplateError> {
    let field = args
        .strip_prefix("url=")
        .map(str::trim)
        .filter(|f| is_identifier(f))
        .ok_or_else(|| TemplateError::MalformedMedia(args.to_string()))?;
    let value = fields
        .get(field)
        .ok_or_else(|| TemplateError::UnknownField(field.to_string()))?;
    let media = value
        .as_str()
        .and_then(Media::from_data_uri)
        .ok_or_else(|| TemplateError::InvalidMedia(field.to_string()))?;
    out.media.push(media);
    out.text.push_str(MEDIA_REFERENCE);
    Ok(())
}

fn push_value(text: &mut String, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => text.push_str(s),
        other => text.push_str(&other.to_string()),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(_) | Value::Number(_) => true,
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Every identifier placeholder a template mentions, in order of appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let tail = &rest[start..];
        let depth = tail.bytes().take_while(|b| *b == b'{').count().min(3);
        let close = &"}}}"[..depth];
        let Some(end) = tail[depth..].find(close) else {
            break;
        };
        let inner = tail[depth..depth + end].trim();
        let name = inner
            .strip_prefix("#if ")
            .or_else(|| inner.strip_prefix("media url="))
            .unwrap_or(inner)
            .trim();
        if name != "else" && is_identifier(name) && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        rest = &tail[depth + end + depth..];
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn substitutes_all_brace_styles() {
        let f = fields(json!({ "a": "one", "b": "two", "c": "three" }));
        let r = render("{a} {{b}} {{{c}}}", &f).unwrap();
        assert_eq!(r.text, "one two three");
        assert!(r.media.is_empty());
    }

    #[test]
    fn arrays_render_as_compact_json() {
        let f = fields(json!({ "clauses": [{ "clauseId": "C1" }] }));
        let r = render("Clauses: {{{clauses}}}", &f).unwrap();
        assert_eq!(r.text, r#"Clauses: [{"clauseId":"C1"}]"#);
    }

    #[test]
    fn null_renders_empty() {
        let f = fields(json!({ "a": null }));
        assert_eq!(render("[{{a}}]", &f).unwrap().text, "[]");
    }

    #[test]
    fn unknown_field_is_an_error() {
        let f = fields(json!({ "a": "x" }));
        assert_eq!(
            render("{{missing}}", &f),
            Err(TemplateError::UnknownField("missing".into()))
        );
    }

    #[test]
    fn non_identifier_braces_are_literal() {
        let f = fields(json!({}));
        let text = r#"Return {"risks": []} or { two words } and {{ 1 + 1 }} and {unclosed"#;
        assert_eq!(render(text, &f).unwrap().text, text);
    }

    #[test]
    fn if_else_picks_branch() {
        let tpl = "{{#if uri}}FILE{{else}}TEXT: {{text}}{{/if}}!";
        let with_text = fields(json!({ "uri": null, "text": "hello" }));
        assert_eq!(render(tpl, &with_text).unwrap().text, "TEXT: hello!");

        let with_empty = fields(json!({ "uri": "", "text": "hi" }));
        assert_eq!(render(tpl, &with_empty).unwrap().text, "TEXT: hi!");
    }

    #[test]
    fn media_helper_attaches_data_uri() {
        let tpl = "{{#if uri}}Document File: {{media url=uri}}{{else}}{{text}}{{/if}}";
        let f = fields(json!({ "uri": "data:application/pdf;base64,JVBERi0xLjQ=", "text": null }));
        let r = render(tpl, &f).unwrap();
        assert_eq!(r.text, format!("Document File: {MEDIA_REFERENCE}"));
        assert_eq!(r.media.len(), 1);
        assert_eq!(r.media[0].mime_type, "application/pdf");
    }

    #[test]
    fn media_helper_rejects_plain_strings() {
        let f = fields(json!({ "uri": "not a data uri" }));
        assert_eq!(
            render("{{media url=uri}}", &f),
            Err(TemplateError::InvalidMedia("uri".into()))
        );
    }

    #[test]
    fn unterminated_if_is_an_error() {
        let f = fields(json!({ "a": "x" }));
        assert_eq!(
            render("{{#if a}}never closed", &f),
            Err(TemplateError::UnterminatedIf("a".into()))
        );
    }

    #[test]
    fn substituted_values_are_not_rescanned() {
        let f = fields(json!({ "a": "{{b}}" }));
        assert_eq!(render("{{a}}", &f).unwrap().text, "{{b}}");
    }

    #[test]
    fn placeholders_lists_each_name_once() {
        let tpl = "{{#if uri}}{{media url=uri}}{{else}}\"{{text}}\"{{/if}} {text} {{{role}}}";
        assert_eq!(placeholders(tpl), vec!["uri", "text", "role"]);
    }
}
