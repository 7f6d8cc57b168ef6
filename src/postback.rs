use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::filter::strip_diacritic;

/// Receiver of legacy framework postbacks. The sink forwards a target name
/// and an opaque command argument; transport is the embedder's business.
pub trait PostbackSink {
    fn post_back(&mut self, target: &str, argument: &str);
}

/// Payload serialized into the postback command string.
#[derive(Debug, Clone, Serialize)]
pub struct PostbackPayload {
    #[serde(rename = "isOpen")]
    pub is_open: bool,
    pub label: String,
    #[serde(rename = "inputType")]
    pub input_type: String,
    pub data: Value,
}

/// Sanitize a string for the postback channel: diacritics stripped, control
/// characters replaced with spaces, quote and bracket characters removed,
/// surrounding whitespace trimmed.
pub fn sanitize_text(text: &str) -> String {
    text.chars()
        .map(strip_diacritic)
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .filter(|c| !matches!(c, '"' | '\'' | '{' | '}' | '[' | ']'))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Recursively sanitize every string inside a JSON value.
pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(sanitize_text(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => {
            Value::Object(map.iter().map(|(k, v)| (k.clone(), sanitize_value(v))).collect())
        }
        other => other.clone(),
    }
}

/// Build the framework command argument: the event name with the JSON
/// payload appended after a `$` separator.
pub fn command_argument(event: &str, payload: &PostbackPayload) -> String {
    let json = serde_json::to_string(payload).unwrap_or_default();
    trace!("Postback argument for {event}: {json}");
    format!("{event}${json}")
}
