//! Response Normalizer: turns raw model output into one decoded JSON object.
//!
//! Flow: collect segment text → strip an optional code fence → strict JSON
//! object decode. Decode failures are returned as `NormalizationError`; each
//! orchestrator decides whether that is fatal (tailor) or falls back to a
//! default payload (analyze, interview prep).
//!
//! The `*_from_map` helpers fill every required key with its default so
//! nothing downstream ever sees a missing field.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{ModelOutput, OutputSegment};
use crate::models::operations::{
    AnalysisResult, InterviewQuestion, InterviewSet, QuestionCategory, MAX_INTERVIEW_QUESTIONS,
};
use crate::models::resume::{bullets_to_description, IDENTITY_FIELDS};

/// Legacy summary-only responses are capped at this many characters.
const LEGACY_SUMMARY_MAX_CHARS: usize = 500;
const MIN_FENCE_TICKS: usize = 3;

#[derive(Debug, Error)]
pub enum NormalizationError {
    #[error("model returned no content")]
    Empty,

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    #[error("unexpected shape for `{field}`: {reason}")]
    Shape { field: String, reason: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Text collection and fence stripping
// ────────────────────────────────────────────────────────────────────────────

/// Concatenates the text carried by the output, in order.
pub fn collect_text(output: &ModelOutput) -> String {
    match output {
        ModelOutput::Text(text) => text.clone(),
        ModelOutput::Segments(segments) => segments
            .iter()
            .filter_map(|segment| match segment {
                OutputSegment::Text(text) => Some(text.as_str()),
                OutputSegment::Structured(Value::String(text)) => Some(text.as_str()),
                OutputSegment::Structured(value) => value.get("text").and_then(Value::as_str),
            })
            .collect(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FenceState {
    Ticks,
    Tag,
    Padding,
    Done,
}

/// Returns the byte length of an opening fence (```` ``` ````, optional
/// `json` tag, optional trailing whitespace and newline) at the start of
/// `text`, or `None` when `text` does not open with a JSON/unlabeled fence.
fn opening_fence_len(text: &str) -> Option<usize> {
    let mut state = FenceState::Ticks;
    let mut ticks = 0;
    let mut tag_start = 0;
    let mut tag_end = 0;
    let mut end = 0;

    for (idx, ch) in text.char_indices() {
        match state {
            FenceState::Ticks if ch == '`' => ticks += 1,
            FenceState::Ticks => {
                if ticks < MIN_FENCE_TICKS {
                    return None;
                }
                tag_start = idx;
                tag_end = idx;
                end = idx;
                state = if ch.is_ascii_alphanumeric() {
                    tag_end = idx + ch.len_utf8();
                    end = tag_end;
                    FenceState::Tag
                } else if ch == ' ' || ch == '\t' {
                    end = idx + 1;
                    FenceState::Padding
                } else if ch == '\n' {
                    end = idx + 1;
                    FenceState::Done
                } else {
                    FenceState::Done
                };
            }
            FenceState::Tag if ch.is_ascii_alphanumeric() => {
                tag_end = idx + ch.len_utf8();
                end = tag_end;
            }
            FenceState::Tag | FenceState::Padding => {
                if ch == ' ' || ch == '\t' || ch == '\r' {
                    end = idx + 1;
                    state = FenceState::Padding;
                } else if ch == '\n' {
                    end = idx + 1;
                    state = FenceState::Done;
                } else {
                    state = FenceState::Done;
                }
            }
            FenceState::Done => break,
        }
        if state == FenceState::Done {
            break;
        }
    }

    match state {
        FenceState::Ticks if ticks >= MIN_FENCE_TICKS => return Some(text.len()),
        FenceState::Ticks => return None,
        FenceState::Tag if tag_end == text.len() => end = text.len(),
        _ => {}
    }

    let tag = &text[tag_start..tag_end];
    if tag.is_empty() || tag.eq_ignore_ascii_case("json") {
        Some(end)
    } else {
        None
    }
}

/// Returns the byte index where a closing fence starts at the end of `text`.
fn closing_fence_start(text: &str) -> Option<usize> {
    let trimmed = text.trim_end();
    let ticks = trimmed.chars().rev().take_while(|c| *c == '`').count();
    (ticks >= MIN_FENCE_TICKS).then(|| trimmed.len() - ticks)
}

/// Removes a leading and/or trailing markdown fence. Text without fences is
/// returned trimmed but otherwise untouched; backticks inside the body are
/// never considered.
pub fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let body = match opening_fence_len(trimmed) {
        Some(len) => &trimmed[len..],
        None => trimmed,
    };
    let body = match closing_fence_start(body) {
        Some(idx) => &body[..idx],
        None => body,
    };
    body.trim()
}

// ────────────────────────────────────────────────────────────────────────────
// Decoding
// ────────────────────────────────────────────────────────────────────────────

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Strictly decodes `text` as a single JSON object.
pub fn decode_object(text: &str) -> Result<Map<String, Value>, NormalizationError> {
    if text.trim().is_empty() {
        return Err(NormalizationError::Empty);
    }
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(NormalizationError::NotAnObject(kind(&other))),
    }
}

/// Full normalization: collect text, strip fences, decode.
pub fn normalize(output: &ModelOutput) -> Result<Map<String, Value>, NormalizationError> {
    decode_object(strip_fences(&collect_text(output)))
}

// ────────────────────────────────────────────────────────────────────────────
// Legacy delimiter format
// ────────────────────────────────────────────────────────────────────────────

/// Result of the `Summary:` / `Skills:` compatibility extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTailoring {
    pub summary: String,
    /// Empty when the response carried no `Skills:` line.
    pub skills: Vec<String>,
}

/// Best-effort extractor for the older two-line response format:
///
/// ```text
/// Summary: <summary>
/// Skills: <comma separated skills>
/// ```
///
/// Only the first line after `Skills:` is read as the list, so trailing
/// explanations are ignored. Returns `None` when there is no `Summary:` label.
pub fn parse_delimited(text: &str) -> Option<LegacyTailoring> {
    let text = text.trim();
    if !text.contains("Summary:") {
        return None;
    }

    let parsed = match text.split_once("Skills:") {
        Some((head, tail)) => LegacyTailoring {
            summary: head.replace("Summary:", "").trim().to_string(),
            skills: tail
                .trim()
                .lines()
                .next()
                .unwrap_or_default()
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        },
        None => LegacyTailoring {
            summary: text
                .replace("Summary:", "")
                .trim()
                .chars()
                .take(LEGACY_SUMMARY_MAX_CHARS)
                .collect(),
            skills: vec![],
        },
    };

    if parsed.summary.is_empty() && parsed.skills.is_empty() {
        None
    } else {
        Some(parsed)
    }
}

impl LegacyTailoring {
    /// Partial resume update holding only the fields that were present.
    pub fn into_update(self) -> Map<String, Value> {
        let mut update = Map::new();
        if !self.summary.is_empty() {
            update.insert("summary".to_string(), Value::String(self.summary));
        }
        if !self.skills.is_empty() {
            update.insert(
                "skills".to_string(),
                Value::Array(self.skills.into_iter().map(Value::String).collect()),
            );
        }
        update
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Field defaults
// ────────────────────────────────────────────────────────────────────────────

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// String field, or `default` when absent, null or not a scalar.
pub fn string_field(map: &Map<String, Value>, key: &str, default: &str) -> String {
    map.get(key)
        .and_then(scalar_to_string)
        .unwrap_or_else(|| default.to_string())
}

/// List of strings. A bare string becomes a one-item list; anything else is empty.
pub fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(scalar_to_string)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => vec![],
    }
}

/// Integer score clamped to 0..=100. Floats are rounded, numeric strings parsed,
/// anything else is 0.
pub fn score_field(map: &Map<String, Value>, key: &str) -> u8 {
    let raw = match map.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Some(Value::String(s)) => {
            let s = s.trim().trim_end_matches('%').trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.round() as i64))
        }
        _ => None,
    };
    raw.unwrap_or(0).clamp(0, 100) as u8
}

// ────────────────────────────────────────────────────────────────────────────
// Per-operation shaping
// ────────────────────────────────────────────────────────────────────────────

pub fn analysis_from_map(map: &Map<String, Value>) -> AnalysisResult {
    AnalysisResult {
        score: score_field(map, "score"),
        reasoning: string_field(map, "reasoning", "No reasoning provided"),
        feedback: string_list(map, "feedback"),
        missing_keywords: string_list(map, "missing_keywords"),
    }
}

/// Builds the question set. Non-object items are skipped; at most ten are kept.
pub fn interview_from_map(map: &Map<String, Value>) -> InterviewSet {
    let questions = match map.get("questions") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_object)
            .map(|item| InterviewQuestion {
                question: string_field(item, "question", ""),
                category: item
                    .get("type")
                    .or_else(|| item.get("category"))
                    .and_then(Value::as_str)
                    .map(QuestionCategory::from_label)
                    .unwrap_or_default(),
                answer_guide: string_field(item, "answer_guide", ""),
            })
            .take(MAX_INTERVIEW_QUESTIONS)
            .collect(),
        _ => vec![],
    };

    InterviewSet { questions }
}

/// Generated tailoring content split into the resume update and the cover letter.
#[derive(Debug, Clone, PartialEq)]
pub struct TailoringUpdate {
    pub update: Map<String, Value>,
    pub cover_letter: String,
}

/// Prepares a decoded tailoring object for merging.
///
/// Removes `cover_letter`, identity fields and null values from the update, splits a
/// comma-separated `skills` string and re-encodes list-valued experience
/// descriptions as `* ` bullets.
pub fn tailoring_from_map(mut map: Map<String, Value>) -> Result<TailoringUpdate, NormalizationError> {
    let cover_letter = map
        .remove("cover_letter")
        .as_ref()
        .and_then(scalar_to_string)
        .unwrap_or_default();

    for field in IDENTITY_FIELDS {
        map.remove(field);
    }
    // null means "not generated"; the original value is kept.
    map.retain(|_, value| !value.is_null());

    if let Some(Value::String(skills)) = map.get("skills") {
        let split: Vec<Value> = skills
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| Value::String(s.to_string()))
            .collect();
        map.insert("skills".to_string(), Value::Array(split));
    }

    match map.get_mut("experience") {
        None => {}
        Some(Value::Array(entries)) => {
            for entry in entries.iter_mut() {
                let fields = match entry {
                    Value::Object(fields) => fields,
                    other => {
                        return Err(NormalizationError::Shape {
                            field: "experience".to_string(),
                            reason: format!("expected objects, got {}", kind(other)),
                        });
                    }
                };
                fields.retain(|_, value| !value.is_null());
                let bullets: Option<Vec<String>> = match fields.get("description") {
                    Some(Value::Array(items)) => {
                        Some(items.iter().filter_map(scalar_to_string).collect())
                    }
                    _ => None,
                };
                if let Some(bullets) = bullets {
                    fields.insert(
                        "description".to_string(),
                        Value::String(bullets_to_description(&bullets)),
                    );
                }
            }
        }
        Some(other) => {
            return Err(NormalizationError::Shape {
                field: "experience".to_string(),
                reason: format!("expected an array, got {}", kind(other)),
            });
        }
    }

    Ok(TailoringUpdate {
        update: map,
        cover_letter,
    })
}
