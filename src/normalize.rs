//! Turns free-form model output into a [`CriticismResult`].
//!
//! The model is an untrusted text generator: its reply may wrap the JSON in
//! prose or markdown fences, omit fields, or put the wrong types in them.
//! Every field is coerced on its own and degrades to a default, so the only
//! way to reach the fallback result is finding no JSON object at all.

use crate::fallback::fallback_result;
use crate::models::{
    Alternative, AnalysisMetadata, ContextAlignment, CriticismResult, Issue, IssueType, LineRange,
    Severity, Suggestion,
};
use serde_json::{Map, Value};

pub const DEFAULT_SCORE: u8 = 5;
pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;
pub const GOAL_ANALYSIS_PLACEHOLDER: &str = "Analysis not available";

/// Outcome of normalizing one model reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// A JSON object was found and coerced field by field.
    Parsed(CriticismResult),
    /// No JSON object could be extracted; a synthetic result stands in.
    Fallback(CriticismResult),
}

impl Normalized {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    pub fn result(&self) -> &CriticismResult {
        match self {
            Self::Parsed(result) | Self::Fallback(result) => result,
        }
    }

    pub fn into_result(self) -> CriticismResult {
        match self {
            Self::Parsed(result) | Self::Fallback(result) => result,
        }
    }
}

/// Normalizes `raw` model text.
///
/// `line_count` sizes the fallback issue; `metadata` always replaces whatever
/// metadata the model claimed.
pub fn normalize_response(raw: &str, line_count: usize, metadata: AnalysisMetadata) -> Normalized {
    match extract_json_object(raw) {
        Some(object) => Normalized::Parsed(from_object(&object, metadata)),
        None => Normalized::Fallback(fallback_result(line_count, metadata)),
    }
}

/// Finds the JSON object embedded in `raw`: the greedy slice from the first
/// `{` to the last `}`. A slice that does not parse (a reply cut off
/// mid-object, say) yields `None` rather than a nested fragment.
pub fn extract_json_object(raw: &str) -> Option<Map<String, Value>> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    match serde_json::from_str(&raw[start..=end]) {
        Ok(Value::Object(object)) => Some(object),
        _ => None,
    }
}

fn from_object(object: &Map<String, Value>, metadata: AnalysisMetadata) -> CriticismResult {
    let alignment = object.get("context_alignment").and_then(Value::as_object);

    CriticismResult {
        overall_score: score(object.get("overall_score")),
        critical_issues: objects(object.get("critical_issues")).map(issue).collect(),
        suggestions: objects(object.get("suggestions")).map(suggestion).collect(),
        alternatives: objects(object.get("alternatives")).map(alternative).collect(),
        context_alignment: ContextAlignment {
            alignment_score: score(alignment.and_then(|a| a.get("alignment_score"))),
            goal_analysis: alignment
                .and_then(|a| a.get("goal_analysis"))
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .unwrap_or(GOAL_ANALYSIS_PLACEHOLDER)
                .to_string(),
            recommendations: strings(alignment.and_then(|a| a.get("recommendations"))),
        },
        analysis_metadata: metadata,
    }
}

fn issue(object: &Map<String, Value>) -> Issue {
    Issue {
        issue_type: issue_type(object.get("type")),
        severity: object
            .get("severity")
            .and_then(Value::as_str)
            .and_then(Severity::parse)
            .unwrap_or_default(),
        line_range: line_range(object.get("line_range")),
        description: text(object.get("description")),
        explanation: text(object.get("explanation")),
        fix_suggestion: text(object.get("fix_suggestion")),
    }
}

fn suggestion(object: &Map<String, Value>) -> Suggestion {
    Suggestion {
        suggestion_type: issue_type(object.get("type")),
        description: text(object.get("description")),
        line_range: line_range(object.get("line_range")),
        impact: text(object.get("impact")),
    }
}

fn alternative(object: &Map<String, Value>) -> Alternative {
    Alternative {
        description: text(object.get("description")),
        code_example: text(object.get("code_example")),
        benefits: strings(object.get("benefits")),
        trade_offs: strings(object.get("trade_offs")),
    }
}

/// Numeric (or numeric string) scores are rounded and clamped to 1..=10.
fn score(value: Option<&Value>) -> u8 {
    let number = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match number {
        Some(n) if n.is_finite() => n.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64) as u8,
        _ => DEFAULT_SCORE,
    }
}

fn issue_type(value: Option<&Value>) -> IssueType {
    value
        .and_then(Value::as_str)
        .and_then(IssueType::parse)
        .unwrap_or_default()
}

/// Only an exact `[start, end]` pair of integers is honoured.
fn line_range(value: Option<&Value>) -> LineRange {
    let Some(Value::Array(items)) = value else {
        return LineRange::default();
    };
    match items.as_slice() {
        [start, end] => match (line_number(start), line_number(end)) {
            (Some(start), Some(end)) => LineRange::new(start, end),
            _ => LineRange::default(),
        },
        _ => LineRange::default(),
    }
}

fn line_number(value: &Value) -> Option<u32> {
    let n = value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))?;
    Some(n.clamp(1, u32::MAX as i64) as u32)
}

fn text(value: Option<&Value>) -> String {
    value.and_then(Value::as_str).unwrap_or_default().to_string()
}

fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => vec![],
    }
}

fn objects(value: Option<&Value>) -> impl Iterator<Item = &Map<String, Value>> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}
