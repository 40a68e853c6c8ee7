//! Extraction of the ranked post-id list from a free-text model reply.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// A JSON array of one or more double-quoted strings.
static QUOTED_ARRAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[\s*"[^"]*"(?:\s*,\s*"[^"]*")*\s*\]"#).expect("valid ranking regex")
});

/// The reply contained no usable id array.
#[derive(Debug, Error, PartialEq)]
#[error("could not parse ranking response: {reason}")]
pub struct ResponseParseError {
    pub reason: String,
}

/// Parse the ids the model ranked, most relevant first.
///
/// Tries a strict match for an array of quoted strings, then the span
/// between the first `[` and the last `]`. `Ok(vec![])` means the model
/// answered "no matches"; `Err` means the reply could not be understood.
pub fn parse_ranked_ids(text: &str) -> Result<Vec<String>, ResponseParseError> {
    log::debug!("Raw ranking response:\n{text}");

    if let Some(ids) = strict_array(text) {
        return Ok(ids);
    }
    if let Some(ids) = bracket_span(text)? {
        return Ok(ids);
    }

    Err(ResponseParseError {
        reason: "no JSON array in response".to_string(),
    })
}

fn strict_array(text: &str) -> Option<Vec<String>> {
    let found = QUOTED_ARRAY.find(text)?;
    serde_json::from_str(found.as_str()).ok()
}

/// `Ok(None)` when there is no bracketed span at all.
fn bracket_span(text: &str) -> Result<Option<Vec<String>>, ResponseParseError> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Ok(None);
    };
    if end < start {
        return Ok(None);
    }

    let span = &text[start..=end];
    let values: Vec<serde_json::Value> = serde_json::from_str(span)
        .or_else(|_| serde_json::from_str(&fix_trailing_commas(span)))
        .map_err(|e| ResponseParseError {
            reason: format!("bracketed span is not a JSON array: {e}"),
        })?;

    values
        .into_iter()
        .map(|v| match v {
            serde_json::Value::String(s) => Ok(s),
            serde_json::Value::Number(n) => Ok(n.to_string()),
            other => Err(ResponseParseError {
                reason: format!("unexpected id value: {other}"),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

/// Drop commas that directly precede `]` or `}` outside strings.
fn fix_trailing_commas(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }
        if c == '\\' && in_string {
            result.push(c);
            escape_next = true;
            continue;
        }
        if c == '"' {
            in_string = !in_string;
        } else if !in_string && c == ',' {
            let rest = chars.clone().find(|n| !n.is_whitespace());
            if matches!(rest, Some(']') | Some('}')) {
                continue;
            }
        }
        result.push(c);
    }
    result
}
