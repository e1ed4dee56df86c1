use crate::models::CriticismResult;
use anyhow::{Context, Result};
use std::fmt::Write;
use tracing::info;

pub const DEFAULT_MARKDOWN_OUTPUT: &str = "critique_report.md";

/// Renders a critique as a Markdown document. `source` names what was
/// analyzed (usually the file path).
pub fn render_report(result: &CriticismResult, source: &str) -> String {
    let mut md = String::new();
    let _ = writeln!(md, "# Code Critique: {}\n", source);
    let _ = writeln!(md, "- Overall score: **{}/10**", result.overall_score);
    let _ = writeln!(
        md,
        "- Goal alignment: **{}/10**",
        result.context_alignment.alignment_score
    );
    let meta = &result.analysis_metadata;
    let _ = writeln!(
        md,
        "- Model: `{}` ({} ms, {})\n",
        meta.model_used, meta.analysis_time_ms, meta.timestamp
    );

    if !result.critical_issues.is_empty() {
        md.push_str("## Critical Issues\n\n");
        for issue in &result.critical_issues {
            let _ = writeln!(
                md,
                "### [{}] {} (lines {}-{})\n",
                issue.severity.as_str(),
                issue.description,
                issue.line_range.start,
                issue.line_range.end
            );
            let _ = writeln!(md, "- Category: {}", issue.issue_type.as_str());
            if !issue.explanation.is_empty() {
                let _ = writeln!(md, "- Why: {}", issue.explanation);
            }
            if !issue.fix_suggestion.is_empty() {
                let _ = writeln!(md, "- Fix: {}", issue.fix_suggestion);
            }
            md.push('\n');
        }
    }

    if !result.suggestions.is_empty() {
        md.push_str("## Suggestions\n\n");
        for suggestion in &result.suggestions {
            let _ = write!(
                md,
                "- **{}** (lines {}-{}): {}",
                suggestion.suggestion_type.as_str(),
                suggestion.line_range.start,
                suggestion.line_range.end,
                suggestion.description
            );
            if !suggestion.impact.is_empty() {
                let _ = write!(md, " _Impact: {}_", suggestion.impact);
            }
            md.push('\n');
        }
        md.push('\n');
    }

    if !result.alternatives.is_empty() {
        md.push_str("## Alternatives\n\n");
        for (index, alternative) in result.alternatives.iter().enumerate() {
            let _ = writeln!(md, "### {}. {}\n", index + 1, alternative.description);
            if !alternative.code_example.is_empty() {
                let _ = writeln!(md, "```\n{}\n```\n", alternative.code_example);
            }
            for benefit in &alternative.benefits {
                let _ = writeln!(md, "- ✅ {}", benefit);
            }
            for trade_off in &alternative.trade_offs {
                let _ = writeln!(md, "- ⚠️ {}", trade_off);
            }
            md.push('\n');
        }
    }

    md.push_str("## Goal Alignment\n\n");
    let _ = writeln!(md, "{}\n", result.context_alignment.goal_analysis);
    for recommendation in &result.context_alignment.recommendations {
        let _ = writeln!(md, "- {}", recommendation);
    }
    md
}

pub fn write_markdown_report(
    result: &CriticismResult,
    source: &str,
    output_path: &str,
) -> Result<()> {
    std::fs::write(output_path, render_report(result, source))
        .with_context(|| format!("Failed to write {}", output_path))?;
    info!("Markdown report written to {}", output_path);
    Ok(())
}

/// Re-renders a saved JSON critique as Markdown.
pub fn generate_md_from_json(report_path: &str, output_path: Option<&str>) -> Result<()> {
    let report_content = std::fs::read_to_string(report_path)
        .with_context(|| format!("Failed to read report {}", report_path))?;
    let result: CriticismResult = serde_json::from_str(&report_content)
        .with_context(|| format!("{} is not a critique report", report_path))?;
    write_markdown_report(
        &result,
        report_path,
        output_path.unwrap_or(DEFAULT_MARKDOWN_OUTPUT),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::fallback_result;
    use crate::models::{Alternative, AnalysisMetadata, IssueType, LineRange, Suggestion};
    use tempfile::TempDir;

    fn result() -> CriticismResult {
        let mut result = fallback_result(
            12,
            AnalysisMetadata {
                analysis_time_ms: 250,
                model_used: "test-model".into(),
                timestamp: "2024-01-01T00:00:00.000Z".into(),
            },
        );
        result.suggestions.push(Suggestion {
            suggestion_type: IssueType::Performance,
            description: "cache the lookup".into(),
            line_range: LineRange::new(3, 4),
            impact: "fewer queries".into(),
        });
        result.alternatives.push(Alternative {
            description: "Use a HashMap".into(),
            code_example: "let m = HashMap::new();".into(),
            benefits: vec!["O(1) lookups".into()],
            trade_offs: vec!["more memory".into()],
        });
        result
    }

    #[test]
    fn renders_every_section() {
        let md = render_report(&result(), "src/lib.rs");
        assert!(md.starts_with("# Code Critique: src/lib.rs\n"));
        assert!(md.contains("- Overall score: **5/10**"));
        assert!(
            md.contains("### [medium] Failed to parse the model's analysis response (lines 1-12)")
        );
        assert!(
            md.contains("- **performance** (lines 3-4): cache the lookup _Impact: fewer queries_")
        );
        assert!(md.contains("### 1. Use a HashMap"));
        assert!(md.contains("- ⚠️ more memory"));
        assert!(md.contains("- Try again with a smaller code sample"));
    }

    #[test]
    fn converts_saved_json_report() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("report.json");
        let md_path = dir.path().join("report.md");
        std::fs::write(&json_path, serde_json::to_string_pretty(&result()).unwrap()).unwrap();

        generate_md_from_json(json_path.to_str().unwrap(), md_path.to_str()).unwrap();
        let md = std::fs::read_to_string(md_path).unwrap();
        assert!(md.contains("## Alternatives"));
    }
}
