use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RelatedFile {
    pub path: String,

    pub content: String,

    pub relevance: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatHistoryEntry {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CodeContext {
    pub language: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework: Option<String>,

    pub user_goal: String,

    #[serde(default)]
    pub related_files: Vec<RelatedFile>,
}

/// A request that has passed the input contract.
///
/// Fields are not public, so the only way to obtain one is
/// [`AnalysisRequest::validate`], which guarantees that
/// `code` and `context.user_goal` are non-empty and the code fits the
/// configured length limit.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub(crate) code: String,

    pub(crate) context: CodeContext,

    pub(crate) chat_history: Vec<ChatHistoryEntry>,
}

impl AnalysisRequest {
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn context(&self) -> &CodeContext {
        &self.context
    }

    pub fn chat_history(&self) -> &[ChatHistoryEntry] {
        &self.chat_history
    }

    /// Number of lines in the submitted code, never less than one.
    pub fn line_count(&self) -> usize {
        self.code.lines().count().max(1)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum IssueType {
    Security,
    Performance,
    Maintainability,
    #[default]
    Readability,
}

impl IssueType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "security" => Some(Self::Security),
            "performance" => Some(Self::Performance),
            "maintainability" => Some(Self::Maintainability),
            "readability" => Some(Self::Readability),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Security => "security",
            Self::Performance => "performance",
            Self::Maintainability => "maintainability",
            Self::Readability => "readability",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Severity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "critical" => Some(Self::Critical),
            "high" => Some(Self::High),
            "medium" => Some(Self::Medium),
            "low" => Some(Self::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

/// Inclusive, 1-indexed line span. Serialized as `[start, end]`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct LineRange {
    pub start: u32,

    pub end: u32,
}

impl LineRange {
    pub fn new(start: u32, end: u32) -> Self {
        let start = start.max(1);
        let end = end.max(1);
        if start <= end {
            Self { start, end }
        } else {
            Self { start: end, end: start }
        }
    }
}

impl Default for LineRange {
    fn default() -> Self {
        Self { start: 1, end: 1 }
    }
}

impl From<[u32; 2]> for LineRange {
    fn from([start, end]: [u32; 2]) -> Self {
        Self::new(start, end)
    }
}

impl From<LineRange> for [u32; 2] {
    fn from(range: LineRange) -> Self {
        [range.start, range.end]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Issue {
    #[serde(rename = "type")]
    pub issue_type: IssueType,

    pub severity: Severity,

    pub line_range: LineRange,

    pub description: String,

    pub explanation: String,

    pub fix_suggestion: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Suggestion {
    #[serde(rename = "type")]
    pub suggestion_type: IssueType,

    pub description: String,

    pub line_range: LineRange,

    pub impact: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Alternative {
    pub description: String,

    pub code_example: String,

    pub benefits: Vec<String>,

    pub trade_offs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ContextAlignment {
    pub alignment_score: u8,

    pub goal_analysis: String,

    pub recommendations: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AnalysisMetadata {
    pub analysis_time_ms: u64,

    pub model_used: String,

    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CriticismResult {
    pub overall_score: u8,

    pub critical_issues: Vec<Issue>,

    pub suggestions: Vec<Suggestion>,

    pub alternatives: Vec<Alternative>,

    pub context_alignment: ContextAlignment,

    pub analysis_metadata: AnalysisMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn line_range_serializes_as_pair() {
        let range = LineRange::new(3, 7);
        assert_eq!(serde_json::to_value(range).unwrap(), json!([3, 7]));
    }

    #[test]
    fn line_range_is_ordered_and_one_indexed() {
        assert_eq!(LineRange::new(9, 4), LineRange { start: 4, end: 9 });
        assert_eq!(LineRange::new(0, 0), LineRange::default());
    }

    #[test]
    fn issue_type_uses_lowercase_tag() {
        let issue = Issue {
            issue_type: IssueType::Security,
            severity: Severity::Critical,
            line_range: LineRange::default(),
            description: "eval used".into(),
            explanation: String::new(),
            fix_suggestion: String::new(),
        };
        let value = serde_json::to_value(&issue).unwrap();
        assert_eq!(value["type"], "security");
        assert_eq!(value["severity"], "critical");
    }

    #[test]
    fn enum_parsing_rejects_unknown_values() {
        assert_eq!(IssueType::parse("performance"), Some(IssueType::Performance));
        assert_eq!(IssueType::parse("style"), None);
        assert_eq!(Severity::parse("low"), Some(Severity::Low));
        assert_eq!(Severity::parse("CRITICAL"), None);
    }
}
