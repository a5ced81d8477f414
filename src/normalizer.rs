//! Response normalization for raw model completions
//!
//! The hosted model gives no guarantee about output shape: replies may be
//! clean JSON, JSON wrapped in a code fence, JSON surrounded by commentary,
//! or plain prose. [`normalize`] turns any of these into a valid
//! [`ReasoningDocument`] and never fails. Recovery runs in a fixed order:
//!
//! 1. fence stripping
//! 2. brace-span extraction
//! 3. JSON parse
//! 4. shape validation
//! 5. fallback construction when any earlier stage gives up
//!
//! Fence stripping has to run before brace extraction because prose outside
//! a fence may itself contain braces.

use serde_json::Value;
use tracing::debug;

use crate::types::{ReasoningDocument, ReasoningStep};

/// Follow-up questions used whenever the model does not supply its own
pub const DEFAULT_FOLLOW_UPS: [&str; 3] = [
    "What are the potential obstacles to implementing this?",
    "How would you measure success for this approach?",
    "What alternative strategies should be considered?",
];

pub const FALLBACK_STEP_LABEL: &str = "Unstructured Response";

pub const FALLBACK_CONCLUSION: &str =
    "Please try rephrasing your question for a more structured response.";

pub const FALLBACK_PLACEHOLDER: &str = "The response could not be organized into clear reasoning steps. \
     Please rephrase your question with a bit more detail and try again.";

/// Cleaned fallback text shorter than this is replaced by [`FALLBACK_PLACEHOLDER`]
pub const MIN_LEGIBLE_CHARS: usize = 100;

const FENCE: &str = "```";

/// Which path produced a normalized document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Structured,
    Fallback,
}

impl NormalizeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizeOutcome::Structured => "structured",
            NormalizeOutcome::Fallback => "fallback",
        }
    }
}

/// Normalize raw model output into a reasoning document.
pub fn normalize(raw: &str) -> ReasoningDocument {
    normalize_with_outcome(raw).0
}

/// Same as [`normalize`], also reporting whether the fallback path was taken.
pub fn normalize_with_outcome(raw: &str) -> (ReasoningDocument, NormalizeOutcome) {
    let candidate = extract_brace_span(strip_fences(raw));

    let parsed = match serde_json::from_str::<Value>(candidate) {
        Ok(value) => value,
        Err(e) => {
            debug!("Model output is not JSON ({}); using fallback document", e);
            return (fallback_document(raw), NormalizeOutcome::Fallback);
        }
    };

    match validate_shape(parsed) {
        Some(doc) => (doc, NormalizeOutcome::Structured),
        None => {
            debug!("Model output parsed but failed shape validation; using fallback document");
            (fallback_document(raw), NormalizeOutcome::Fallback)
        }
    }
}

/// Remove a surrounding code fence.
///
/// A fence with a language tag (```` ```json ````) is sliced to the first `{`
/// through last `}` inside the fenced block, so braces in prose after the
/// closing fence are ignored. A bare fence has its opening line dropped, and
/// its last line too when that line is the closing fence.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(after_fence) = trimmed.strip_prefix(FENCE) else {
        return trimmed;
    };

    if after_fence.starts_with(|c: char| c.is_ascii_alphanumeric()) {
        let block = after_fence
            .split_once('\n')
            .map_or(after_fence, |(_, rest)| rest);
        // Unclosed fence runs to the end of the text
        let block = block.find(FENCE).map_or(block, |end| &block[..end]);
        return match (block.find('{'), block.rfind('}')) {
            (Some(start), Some(end)) if start < end => &block[start..=end],
            _ => trimmed,
        };
    }

    let Some(first_newline) = trimmed.find('\n') else {
        return trimmed;
    };
    let body = &trimmed[first_newline + 1..];
    match body.rfind('\n') {
        Some(last_newline) if body[last_newline + 1..].trim_start().starts_with(FENCE) => {
            &body[..last_newline]
        }
        None if body.trim_start().starts_with(FENCE) => "",
        _ => body,
    }
}

/// Slice to the span from the first `{` to the last `}` inclusive, if one exists.
pub fn extract_brace_span(text: &str) -> &str {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

/// Accept a parsed value only when it carries a usable `thinking` sequence.
fn validate_shape(value: Value) -> Option<ReasoningDocument> {
    let Value::Object(map) = value else {
        return None;
    };

    let raw_steps = map.get("thinking")?.as_array()?;
    if raw_steps.is_empty() {
        return None;
    }
    let thinking = raw_steps
        .iter()
        .map(parse_step)
        .collect::<Option<Vec<_>>>()?;

    let conclusion = map
        .get("conclusion")
        .and_then(Value::as_str)
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_CONCLUSION.to_string());

    let follow_ups: Vec<String> = map
        .get("followUpQuestions")
        .and_then(Value::as_array)
        .map(|qs| {
            qs.iter()
                .filter_map(Value::as_str)
                .filter(|q| !q.trim().is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Some(ReasoningDocument {
        thinking,
        conclusion,
        follow_up_questions: Some(if follow_ups.is_empty() {
            default_follow_ups()
        } else {
            follow_ups
        }),
    })
}

// A step must be an object with string label and content.
fn parse_step(value: &Value) -> Option<ReasoningStep> {
    let label = value.get("label")?.as_str()?;
    let content = value.get("content")?.as_str()?;
    Some(ReasoningStep::new(label, content))
}

pub fn default_follow_ups() -> Vec<String> {
    DEFAULT_FOLLOW_UPS.iter().map(|q| q.to_string()).collect()
}

/// Build the always-valid document used when structured parsing fails.
pub fn fallback_document(raw: &str) -> ReasoningDocument {
    let cleaned = strip_residual_fences(raw);
    let content = if cleaned.chars().count() < MIN_LEGIBLE_CHARS {
        FALLBACK_PLACEHOLDER.to_string()
    } else {
        cleaned
    };

    ReasoningDocument {
        thinking: vec![ReasoningStep::new(FALLBACK_STEP_LABEL, content)],
        conclusion: FALLBACK_CONCLUSION.to_string(),
        follow_up_questions: Some(default_follow_ups()),
    }
}

/// Remove fence markers but keep any text sharing a line with them.
fn strip_residual_fences(raw: &str) -> String {
    raw.lines()
        .filter(|line| !is_fence_line(line))
        .map(|line| line.replace(FENCE, ""))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

// A line holding only a fence, optionally followed by a language tag.
fn is_fence_line(line: &str) -> bool {
    line.trim().strip_prefix(FENCE).is_some_and(|tag| {
        tag.chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '.'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labeled_fence_is_sliced_to_braces() {
        let text = "```json\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_drops_delimiter_lines() {
        let text = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn bare_fence_without_closing_keeps_body() {
        let text = "```\n{\"a\": 1}";
        assert_eq!(strip_fences(text), "{\"a\": 1}");
    }

    #[test]
    fn labeled_fence_ignores_braces_after_closing_fence() {
        let text = "```json\n{\"a\": 1}\n```\nSee {docs} for more.";
        assert_eq!(strip_fences(text), "{\"a\": 1}");
        assert_eq!(strip_fences("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn fence_lines_are_recognized() {
        assert!(is_fence_line("```"));
        assert!(is_fence_line("  ```json  "));
        assert!(!is_fence_line("```Some prose here```"));
        assert!(!is_fence_line("plain"));
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_fences("  plain words \n"), "plain words");
    }

    #[test]
    fn brace_span_ignores_surrounding_prose() {
        assert_eq!(extract_brace_span("Sure! {\"x\": 2} Hope that helps."), "{\"x\": 2}");
        assert_eq!(extract_brace_span("} backwards {"), "} backwards {");
        assert_eq!(extract_brace_span("no braces"), "no braces");
    }

    #[test]
    fn empty_thinking_array_is_rejected() {
        let (doc, outcome) = normalize_with_outcome(r#"{"thinking": [], "conclusion": "x"}"#);
        assert_eq!(outcome, NormalizeOutcome::Fallback);
        assert_eq!(doc.thinking[0].label, FALLBACK_STEP_LABEL);
    }

    #[test]
    fn malformed_step_is_rejected() {
        let raw = r#"{"thinking": [{"label": "A", "content": "ok"}, {"title": "B"}], "conclusion": "x"}"#;
        let (_, outcome) = normalize_with_outcome(raw);
        assert_eq!(outcome, NormalizeOutcome::Fallback);
    }

    #[test]
    fn blank_conclusion_is_replaced() {
        let raw = r#"{"thinking": [{"label": "A", "content": "ok"}], "conclusion": "  "}"#;
        let (doc, outcome) = normalize_with_outcome(raw);
        assert_eq!(outcome, NormalizeOutcome::Structured);
        assert_eq!(doc.conclusion, FALLBACK_CONCLUSION);
    }

    #[test]
    fn non_string_follow_ups_are_dropped() {
        let raw = r#"{"thinking": [{"label": "A", "content": "ok"}], "conclusion": "c",
                      "followUpQuestions": [1, "", "Next?"]}"#;
        let doc = normalize(raw);
        assert_eq!(doc.follow_up_questions, Some(vec!["Next?".to_string()]));
    }

    #[test]
    fn long_prose_is_kept_in_fallback() {
        let prose = "I think the answer depends on several factors. ".repeat(4);
        let raw = format!("```\n\n{prose}\n```");
        let doc = normalize(&raw);
        assert_eq!(doc.thinking.len(), 1);
        assert_eq!(doc.thinking[0].content, prose.trim());
    }
}
