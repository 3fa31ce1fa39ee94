//! Turns free-form provider output into a [`ParsedDraft`].
//!
//! Providers are asked for strict JSON but routinely wrap it in code fences,
//! prepend prose, rename keys or give the correct answer as a letter. Nothing
//! here fails: unusable output becomes an empty item list.

use serde_json::{Map, Value};

use crate::models::{DraftItem, ParsedDraft, Resource};

/// What to do with an item whose correct answer cannot be resolved to a
/// valid choice index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum CorrectIndexPolicy {
    /// Drop the item.
    #[default]
    Strict,
    /// Keep the item and mark the first choice as correct.
    Lenient,
}

/// Remove markdown code fence lines (```` ``` ```` or ```` ```json ````).
pub fn strip_code_fences(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The span from the first `{` to the last `}`, if any.
pub fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_payload(raw: &str) -> Option<Value> {
    let text = strip_code_fences(raw);
    let trimmed = text.trim();

    if trimmed.starts_with('[') {
        if let Ok(value @ Value::Array(_)) = serde_json::from_str::<Value>(trimmed) {
            return Some(value);
        }
    }

    let blob = outermost_object(trimmed).unwrap_or(trimmed);
    serde_json::from_str(blob).ok()
}

/// Normalize a raw completion into draft items.
pub fn normalize_response(raw: &str, policy: CorrectIndexPolicy) -> ParsedDraft {
    let items = match parse_payload(raw) {
        Some(Value::Array(items)) => items,
        Some(Value::Object(mut obj)) => match obj.remove("items") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        _ => {
            tracing::warn!("provider output was not parseable JSON");
            Vec::new()
        }
    };

    normalize_items(&items, policy)
}

pub fn normalize_items(items: &[Value], policy: CorrectIndexPolicy) -> ParsedDraft {
    let items = items
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|item| normalize_item(item, policy))
        .collect();

    ParsedDraft { items }
}

fn normalize_item(item: &Map<String, Value>, policy: CorrectIndexPolicy) -> Option<DraftItem> {
    let question = ["question", "q", "prompt"]
        .iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .find(|q| !q.is_empty())?
        .to_string();

    let choices: Vec<String> = ["choices", "options"]
        .iter()
        .filter_map(|key| item.get(*key).and_then(Value::as_array))
        .find(|list| !list.is_empty())?
        .iter()
        .map(|c| match c {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();

    let answer_given = ["correct_index", "correct"]
        .iter()
        .any(|key| item.get(*key).is_some_and(|v| !v.is_null()));

    // a missing answer means the first choice; only a given but unusable one
    // is subject to the policy
    let correct_index = match resolve_correct(item, choices.len()) {
        Some(idx) => idx,
        None if !answer_given => 0,
        None => match policy {
            CorrectIndexPolicy::Strict => {
                tracing::debug!("dropping item with unresolvable answer: {question}");
                return None;
            }
            CorrectIndexPolicy::Lenient => 0,
        },
    };

    let points = item
        .get("points")
        .and_then(as_integer)
        .filter(|p| *p > 0)
        .unwrap_or(1);

    let explanation = item
        .get("explanation")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(DraftItem {
        question,
        choices,
        correct_index,
        points,
        explanation,
    })
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// `correct_index` as an integer (or numeric string), else `correct` as an
/// integer or a letter (`"B"` is 1). Out-of-range answers resolve to `None`.
fn resolve_correct(item: &Map<String, Value>, n_choices: usize) -> Option<usize> {
    let idx = match item.get("correct_index").filter(|v| !v.is_null()) {
        Some(value) => as_integer(value)?,
        None => match item.get("correct")? {
            Value::Number(n) => n.as_i64()?,
            Value::String(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(n) => n,
                    Err(_) => {
                        let letter = s.chars().next()?.to_ascii_uppercase();
                        if !letter.is_ascii_uppercase() {
                            return None;
                        }
                        i64::from(letter as u8 - b'A')
                    }
                }
            }
            _ => return None,
        },
    };

    usize::try_from(idx).ok().filter(|i| *i < n_choices)
}

/// Parse an explanation completion. Anything without a usable summary
/// falls back to the raw text with no resources.
pub fn parse_explanation(raw: &str) -> (String, Vec<Resource>) {
    let fallback = || (raw.trim().to_string(), Vec::new());

    let Some(Value::Object(obj)) = parse_payload(raw) else {
        return fallback();
    };

    let Some(summary) = obj
        .get("summary")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
    else {
        return fallback();
    };

    let resources = obj
        .get("resources")
        .and_then(Value::as_array)
        .map(|list| {
            list.iter()
                .filter_map(|r| {
                    let title = r.get("title")?.as_str()?.trim();
                    let url = r.get("url")?.as_str()?.trim();
                    (url.starts_with("http://") || url.starts_with("https://")).then(|| Resource {
                        title: if title.is_empty() { url } else { title }.to_string(),
                        url: url.to_string(),
                    })
                })
                .collect()
        })
        .unwrap_or_default();

    (summary.to_string(), resources)
}
