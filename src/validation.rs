//! Input contract for analysis requests.
//!
//! Callers hand in a loosely-typed [`CritiqueInput`] (typically deserialized
//! from JSON); [`AnalysisRequest::validate`] turns it into the immutable
//! request the rest of the pipeline works with, or rejects it.

use crate::error::CriticError;
use crate::models::{AnalysisRequest, ChatHistoryEntry, CodeContext, RelatedFile};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct CritiqueInput {
    #[serde(default)]
    pub code: Option<String>,

    #[serde(default)]
    pub context: Option<ContextInput>,

    #[serde(default)]
    pub chat_history: Option<Vec<ChatHistoryEntry>>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ContextInput {
    #[serde(default)]
    pub language: Option<String>,

    #[serde(default)]
    pub framework: Option<String>,

    #[serde(default)]
    pub user_goal: Option<String>,

    #[serde(default)]
    pub related_files: Option<Vec<RelatedFile>>,
}

impl CritiqueInput {
    pub fn from_json(text: &str) -> Result<Self, CriticError> {
        serde_json::from_str(text)
            .map_err(|e| CriticError::validation(format!("Invalid request JSON: {}", e)))
    }
}

impl AnalysisRequest {
    /// Checks `input` against the request contract.
    ///
    /// Rejects empty or oversized code (length counted in characters), a
    /// missing `context`, and an empty `language` or `userGoal`.
    pub fn validate(input: CritiqueInput, max_code_length: usize) -> Result<Self, CriticError> {
        let code = input
            .code
            .ok_or_else(|| CriticError::validation("Missing required field: code"))?;
        if code.is_empty() {
            return Err(CriticError::validation("Code must not be empty"));
        }
        if code.chars().count() > max_code_length {
            return Err(CriticError::validation(format!(
                "Code length exceeds maximum allowed length of {} characters",
                max_code_length
            )));
        }

        let context = input
            .context
            .ok_or_else(|| CriticError::validation("Missing required field: context"))?;
        let language = context
            .language
            .filter(|l| !l.is_empty())
            .ok_or_else(|| CriticError::validation("Missing required field: context.language"))?;
        let user_goal = context
            .user_goal
            .filter(|g| !g.is_empty())
            .ok_or_else(|| CriticError::validation("Missing required field: context.userGoal"))?;
        let framework = context.framework.filter(|f| !f.trim().is_empty());

        Ok(Self {
            code,
            context: CodeContext {
                language,
                framework,
                user_goal,
                related_files: context.related_files.unwrap_or_default(),
            },
            chat_history: input.chat_history.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(code: &str, goal: &str) -> CritiqueInput {
        CritiqueInput {
            code: Some(code.to_string()),
            context: Some(ContextInput {
                language: Some("rust".into()),
                user_goal: Some(goal.to_string()),
                ..Default::default()
            }),
            chat_history: None,
        }
    }

    #[test]
    fn accepts_minimal_request() {
        let req = AnalysisRequest::validate(input("fn main() {}", "review"), 100).unwrap();
        assert_eq!(req.code(), "fn main() {}");
        assert_eq!(req.context().language, "rust");
        assert!(req.context().related_files.is_empty());
        assert!(req.chat_history().is_empty());
    }

    #[test]
    fn rejects_empty_code() {
        let err = AnalysisRequest::validate(input("", "review"), 100).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn whitespace_only_fields_are_not_empty() {
        let req = AnalysisRequest::validate(input("  ", " "), 100).unwrap();
        assert_eq!(req.code(), "  ");
        assert_eq!(req.context().user_goal, " ");
    }

    #[test]
    fn rejects_code_one_char_over_limit() {
        let code = "x".repeat(11);
        let err = AnalysisRequest::validate(input(&code, "review"), 10).unwrap_err();
        assert!(err.to_string().contains("maximum allowed length of 10"));

        let code = "x".repeat(10);
        assert!(AnalysisRequest::validate(input(&code, "review"), 10).is_ok());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        let code = "é".repeat(10);
        assert!(AnalysisRequest::validate(input(&code, "review"), 10).is_ok());
    }

    #[test]
    fn rejects_empty_goal() {
        let err = AnalysisRequest::validate(input("let x = 1;", ""), 100).unwrap_err();
        assert!(err.to_string().contains("userGoal"));
    }

    #[test]
    fn rejects_missing_context_and_language() {
        let mut no_context = input("let x = 1;", "review");
        no_context.context = None;
        assert!(AnalysisRequest::validate(no_context, 100).is_err());

        let no_language = CritiqueInput::from_json(
            r#"{"code": "let x = 1;", "context": {"userGoal": "review"}}"#,
        )
        .unwrap();
        let err = AnalysisRequest::validate(no_language, 100).unwrap_err();
        assert!(err.to_string().contains("context.language"));
    }

    #[test]
    fn parses_camel_case_json() {
        let raw = r#"{
            "code": "print(1)",
            "context": {
                "language": "python",
                "framework": "django",
                "userGoal": "make it fast",
                "relatedFiles": [{"path": "a.py", "content": "x = 1", "relevance": "imported"}]
            },
            "chatHistory": [{"message": "hi"}, {"message": "again", "timestamp": "2024-01-01T00:00:00Z"}]
        }"#;
        let req = AnalysisRequest::validate(CritiqueInput::from_json(raw).unwrap(), 100).unwrap();
        assert_eq!(req.context().framework.as_deref(), Some("django"));
        assert_eq!(req.context().related_files[0].relevance, "imported");
        assert_eq!(req.chat_history().len(), 2);
    }

    #[test]
    fn malformed_json_is_a_validation_error() {
        assert!(CritiqueInput::from_json("{not json").unwrap_err().is_validation());
    }
}
