use crate::models::{
    AnalysisMetadata, ContextAlignment, CriticismResult, Issue, IssueType, LineRange, Severity,
};

pub const FALLBACK_SCORE: u8 = 5;

/// Builds the low-confidence critique returned when the model's reply held
/// no usable JSON object. The single synthetic issue spans the whole
/// submission.
pub fn fallback_result(line_count: usize, metadata: AnalysisMetadata) -> CriticismResult {
    let last_line = u32::try_from(line_count).unwrap_or(u32::MAX);
    CriticismResult {
        overall_score: FALLBACK_SCORE,
        critical_issues: vec![Issue {
            issue_type: IssueType::Readability,
            severity: Severity::Medium,
            line_range: LineRange::new(1, last_line),
            description: "Failed to parse the model's analysis response".to_string(),
            explanation: "The AI model did not return a parseable JSON analysis for this code"
                .to_string(),
            fix_suggestion: "Please try again or check the code format".to_string(),
        }],
        suggestions: vec![],
        alternatives: vec![],
        context_alignment: ContextAlignment {
            alignment_score: FALLBACK_SCORE,
            goal_analysis: "Analysis failed: the model response could not be parsed".to_string(),
            recommendations: vec!["Try again with a smaller code sample".to_string()],
        },
        analysis_metadata: metadata,
    }
}
