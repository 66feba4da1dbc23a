//! Turn free-form model answers into JSON objects
//!
//! Models wrap their JSON in markdown fences or surround it with prose. The
//! cleaner takes the span from the first `{` to the last `}` and parses it.
//! Callers always get a mapping or a tagged failure, never a parse panic.

use litminer_domain::{AnalysisResult, EventSender, MalformedReason, TaskFailure};
use serde_json::{Map, Value};

/// Maximum characters of raw answer text echoed into log lines
pub const LOG_PREVIEW_CHARS: usize = 500;

/// Locate the greedy brace-delimited span in `text`
pub fn find_json_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Parse the JSON object embedded in a model answer
pub fn clean_json_response(text: &str, events: &EventSender) -> AnalysisResult {
    let Some(span) = find_json_span(text) else {
        events.warn("No valid JSON object found in the API response.");
        events.warn(format!("Raw content (first {} chars): {}", LOG_PREVIEW_CHARS, preview(text)));
        return Err(TaskFailure::malformed(
            MalformedReason::NoJsonFound,
            "no brace-delimited span",
            text,
        ));
    };

    match serde_json::from_str::<Map<String, Value>>(span) {
        Ok(fields) => Ok(fields),
        Err(e) => {
            events.warn(format!("Could not decode JSON returned by the API: {}", e));
            events.warn(format!("Raw content (first {} chars): {}", LOG_PREVIEW_CHARS, preview(text)));
            Err(TaskFailure::malformed(MalformedReason::JsonDecode, e.to_string(), text))
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use litminer_domain::{event_channel, PipelineEvent};

    #[test]
    fn test_extracts_json_from_markdown_fence() {
        let raw = "Here is the result:\n```json\n{\"x\":1}\n```";
        let fields = clean_json_response(raw, &EventSender::detached()).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["x"], 1);
    }

    #[test]
    fn test_plain_json_passes_through() {
        let raw = r#"{"material": "TiO2", "band_gap": {"value": 3.2, "unit": "eV"}}"#;
        let fields = clean_json_response(raw, &EventSender::detached()).unwrap();
        assert_eq!(fields["material"], "TiO2");
        assert_eq!(fields["band_gap"]["unit"], "eV");
    }

    #[test]
    fn test_span_is_greedy_to_last_brace() {
        let raw = "prefix {\"a\": {\"b\": 2}} suffix";
        assert_eq!(find_json_span(raw), Some("{\"a\": {\"b\": 2}}"));
    }

    #[test]
    fn test_no_json_carries_original_text() {
        let (events, mut rx) = event_channel();
        let raw = "I could not find any materials in this abstract.";
        let failure = clean_json_response(raw, &events).unwrap_err();

        match &failure {
            TaskFailure::MalformedResponse { reason, raw: carried, .. } => {
                assert_eq!(*reason, MalformedReason::NoJsonFound);
                assert_eq!(carried, raw);
            }
            other => panic!("Expected MalformedResponse, got {:?}", other),
        }
        assert_eq!(failure.label(), "No JSON found in response");

        let warnings = rx
            .drain()
            .into_iter()
            .filter(|e| matches!(e, PipelineEvent::Log { .. }))
            .count();
        assert_eq!(warnings, 2);
    }

    #[test]
    fn test_closing_brace_before_opening_is_not_a_span() {
        assert_eq!(find_json_span("} nothing {"), None);
        assert_eq!(find_json_span("no braces at all"), None);
    }

    #[test]
    fn test_invalid_json_is_decode_error() {
        let raw = "```json\n{\"x\": 1,}\n```";
        let failure = clean_json_response(raw, &EventSender::detached()).unwrap_err();
        assert_eq!(failure.label(), "JSON Decode Error");
        assert_eq!(failure.raw_content(), Some(raw));
    }

    #[test]
    fn test_log_preview_is_truncated() {
        let (events, mut rx) = event_channel();
        let raw = "z".repeat(2_000);
        let _ = clean_json_response(&raw, &events);

        let longest = rx
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                PipelineEvent::Log { message, .. } => Some(message.len()),
                _ => None,
            })
            .max()
            .unwrap();
        assert!(longest < 600);
    }
}
