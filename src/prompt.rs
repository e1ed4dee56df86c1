use crate::models::AnalysisRequest;
use std::fmt::Write;

/// Only the most recent chat entries are sent to keep the prompt bounded.
pub const MAX_HISTORY_ENTRIES: usize = 5;

const SYSTEM_PROMPT: &str = "You are an expert code critic and analyzer. Your role is to provide comprehensive, context-aware feedback on code quality, security, and best practices.
Be direct and honest.

ANALYSIS AREAS:
1. SECURITY: Identify vulnerabilities, potential attack vectors, and security anti-patterns
2. PERFORMANCE: Detect bottlenecks, inefficient algorithms, and optimization opportunities
3. MAINTAINABILITY: Assess code structure, complexity, and long-term maintainability
4. READABILITY: Evaluate naming conventions, code clarity, and documentation
5. BEST PRACTICES: Check adherence to language/framework-specific conventions

RESPONSE FORMAT:
You must respond with a valid JSON object matching this exact structure:
{
  \"overall_score\": number (1-10),
  \"critical_issues\": [
    {
      \"type\": \"security|performance|maintainability|readability\",
      \"severity\": \"critical|high|medium|low\",
      \"line_range\": [start_line, end_line],
      \"description\": \"Brief description\",
      \"explanation\": \"Detailed explanation\",
      \"fix_suggestion\": \"How to fix it\"
    }
  ],
  \"suggestions\": [
    {
      \"type\": \"security|performance|maintainability|readability\",
      \"description\": \"Improvement suggestion\",
      \"line_range\": [start_line, end_line],
      \"impact\": \"Expected impact\"
    }
  ],
  \"alternatives\": [
    {
      \"description\": \"Alternative approach\",
      \"code_example\": \"Code example\",
      \"benefits\": [\"benefit1\", \"benefit2\"],
      \"trade_offs\": [\"tradeoff1\", \"tradeoff2\"]
    }
  ],
  \"context_alignment\": {
    \"alignment_score\": number (1-10),
    \"goal_analysis\": \"How well code achieves user's goal\",
    \"recommendations\": [\"rec1\", \"rec2\"]
  }
}

INSTRUCTIONS:
- Be constructive and educational in your feedback
- Provide specific, actionable suggestions
- Consider the user's stated goal and project context
- Focus on the most impactful issues first
- Line numbers should be 1-indexed
- Always return valid JSON";

/// The fixed instruction sent as the `system` message.
pub fn system_prompt() -> &'static str {
    SYSTEM_PROMPT
}

/// Renders the `user` message for a validated request.
pub fn user_prompt(request: &AnalysisRequest) -> String {
    let context = request.context();
    let language = &context.language;

    let mut prompt = format!(
        "CODE TO ANALYZE:\n```{language}\n{code}\n```\n\nUSER GOAL: {goal}\nLANGUAGE: {language}",
        language = language,
        code = request.code(),
        goal = context.user_goal,
    );

    if let Some(framework) = &context.framework {
        let _ = write!(prompt, "\nFRAMEWORK: {}", framework);
    }

    if !context.related_files.is_empty() {
        prompt.push_str("\n\nRELATED FILES CONTEXT:");
        for (index, file) in context.related_files.iter().enumerate() {
            let _ = write!(
                prompt,
                "\n{}. {} ({}):\n```{}\n{}\n```",
                index + 1,
                file.path,
                file.relevance,
                language,
                file.content
            );
        }
    }

    let history = request.chat_history();
    if !history.is_empty() {
        prompt.push_str("\n\nCHAT HISTORY CONTEXT:");
        let recent = &history[history.len().saturating_sub(MAX_HISTORY_ENTRIES)..];
        for (index, entry) in recent.iter().enumerate() {
            let _ = write!(prompt, "\n{}. {}", index + 1, entry.message);
        }
    }

    prompt.push_str(
        "\n\nPlease analyze this code and provide detailed feedback focusing on security, performance, maintainability, readability, and best practices.",
    );
    prompt
}
