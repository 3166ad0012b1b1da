// Article response flattening.
//
// ## Observed content shapes
//
// The generation endpoint has returned its content in three shapes, and the
// shape is not stable between requests:
//
// 1. `content_draft` is a flat string.
// 2. `content_draft` is an object whose `content` field is a flat string.
// 3. `content_draft.content` is itself structured: `introduction`, ordered
//    `sections`, and `conclusion`, each an object carrying `plain_text`
//    and/or `html`.
//
// The dispatch order below is the contract: flat string first, then the
// wrapped string, then the structured walk (plain_text preferred over html
// per part), and only then the legacy flat `content` field on the article.
// Absent substructures contribute nothing; nothing in here returns an error.

use serde::Serialize;
use serde_json::Value;

use crate::normalize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub content_text: String,
    pub char_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_report: Option<Value>,
}

/// Locate the article object inside a generation response.
/// The service wraps it as `data.article`, or returns `data` itself as the
/// article.
pub fn article_value(parsed: &Value) -> &Value {
    static NULL: Value = Value::Null;
    let data = parsed.get("data").unwrap_or(&NULL);
    data.get("article").unwrap_or(data)
}

/// Flatten an article object into a shape-independent view.
///
/// `char_count` is the Unicode scalar count of the flattened text; the
/// service under test generates CJK content, so byte length would overstate
/// it roughly threefold.
pub fn extract(article: &Value) -> NormalizedArticle {
    let content_text = flatten_content(article);
    let char_count = content_text.chars().count();

    NormalizedArticle {
        id: normalize::lookup_id(article, &[&["id"], &["article_id"]]),
        title: article
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string),
        status: article
            .get("status")
            .and_then(Value::as_str)
            .map(str::to_string),
        quality_report: normalize::lookup(article, &[&["quality_report"], &["qualityReport"]])
            .cloned(),
        content_text,
        char_count,
    }
}

fn flatten_content(article: &Value) -> String {
    match article.get("content_draft") {
        Some(Value::String(draft)) => draft.clone(),
        Some(Value::Object(draft)) => match draft.get("content") {
            Some(Value::String(inner)) => inner.clone(),
            Some(Value::Object(content)) => join_structured_parts(content),
            Some(other) => other.to_string(),
            None => String::new(),
        },
        _ => article
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    }
}

fn join_structured_parts(content: &serde_json::Map<String, Value>) -> String {
    let mut parts = Vec::new();

    if let Some(text) = part_text(content.get("introduction")) {
        parts.push(text);
    }
    if let Some(Value::Array(sections)) = content.get("sections") {
        for section in sections {
            if let Some(text) = part_text(Some(section)) {
                parts.push(text);
            }
        }
    }
    if let Some(text) = part_text(content.get("conclusion")) {
        parts.push(text);
    }

    parts.join("\n")
}

/// Text of one structured part: `plain_text` when present, `html` otherwise,
/// empty when the part is an object carrying neither. Non-object parts
/// contribute nothing.
fn part_text(part: Option<&Value>) -> Option<String> {
    let obj = part?.as_object()?;
    let text = obj
        .get("plain_text")
        .and_then(Value::as_str)
        .or_else(|| obj.get("html").and_then(Value::as_str))
        .unwrap_or_default();
    Some(text.to_string())
}
