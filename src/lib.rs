//! Structured code critique from a remote LLM.
//!
//! A [`Critic`] validates an analysis request, sends it to an
//! OpenAI-compatible chat-completion endpoint with a fixed analysis prompt,
//! and turns whatever text comes back into a well-formed
//! [`CriticismResult`].
//!
//! ```rust,no_run
//! use code_critic::{Config, Critic, CritiqueInput};
//!
//! async fn review() -> Result<(), code_critic::CriticError> {
//!     let config = Config { api_key: "sk-...".into(), ..Config::default() };
//!     let critic = Critic::new(&config)?;
//!     let input = CritiqueInput::from_json(
//!         r#"{"code": "eval(x)", "context": {"language": "javascript", "userGoal": "security review"}}"#,
//!     )?;
//!     let result = critic.critique(input).await?;
//!     println!("score: {}", result.overall_score);
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod config;
pub mod context;
pub mod error;
pub mod fallback;
pub mod markdown;
pub mod models;
pub mod normalize;
pub mod openai;
pub mod prompt;
pub mod validation;

pub use analysis::Critic;
pub use config::Config;
pub use error::CriticError;
pub use models::{
    Alternative, AnalysisMetadata, AnalysisRequest, ChatHistoryEntry, CodeContext,
    ContextAlignment, CriticismResult, Issue, IssueType, LineRange, RelatedFile, Severity,
    Suggestion,
};
pub use normalize::Normalized;
pub use validation::{ContextInput, CritiqueInput};
