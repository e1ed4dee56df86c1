use crate::config::Config;
use crate::error::CriticError;
use crate::models::{AnalysisMetadata, AnalysisRequest, CriticismResult};
use crate::normalize::{normalize_response, Normalized};
use crate::openai::ChatClient;
use crate::prompt;
use crate::validation::CritiqueInput;
use chrono::{SecondsFormat, Utc};
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// The analysis pipeline: validate, build prompts, call the model once,
/// normalize the reply.
///
/// Holds no state between calls, so one instance can serve concurrent
/// requests.
#[derive(Clone)]
pub struct Critic {
    client: ChatClient,
    max_code_length: usize,
}

impl fmt::Debug for Critic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Critic")
            .field("client", &self.client)
            .field("max_code_length", &self.max_code_length)
            .finish()
    }
}

impl Critic {
    /// Fails when the API key is missing or the timeout is zero.
    pub fn new(config: &Config) -> Result<Self, CriticError> {
        if config.api_key.trim().is_empty() {
            return Err(CriticError::Config(
                "API key is required (set api_key in .critic.yml or CRITIC_API_KEY)".to_string(),
            ));
        }
        if config.timeout_ms == 0 {
            return Err(CriticError::Config("timeout_ms must be greater than zero".to_string()));
        }
        let client = ChatClient::new(
            &config.api_url,
            &config.api_key,
            &config.model,
            Duration::from_millis(config.timeout_ms),
        )?;
        Ok(Self {
            client,
            max_code_length: config.max_code_length,
        })
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub fn max_code_length(&self) -> usize {
        self.max_code_length
    }

    /// Validates a raw request and analyzes it.
    pub async fn critique(&self, input: CritiqueInput) -> Result<CriticismResult, CriticError> {
        let request = AnalysisRequest::validate(input, self.max_code_length)?;
        self.analyze(&request).await
    }

    #[instrument(
        skip_all,
        fields(language = %request.context().language, code_length = request.code().len())
    )]
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<CriticismResult, CriticError> {
        if request.code().chars().count() > self.max_code_length {
            return Err(CriticError::validation(format!(
                "Code length exceeds maximum allowed length of {} characters",
                self.max_code_length
            )));
        }

        let started = Instant::now();
        info!(
            model = self.model(),
            "Sending analysis request ({} chars of {})",
            request.code().len(),
            request.context().language
        );

        let system = prompt::system_prompt();
        let user = prompt::user_prompt(request);
        let content = self.client.complete(system, &user).await?;

        let metadata = AnalysisMetadata {
            analysis_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            model_used: self.model().to_string(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let result = match normalize_response(&content, request.line_count(), metadata) {
            Normalized::Parsed(result) => result,
            Normalized::Fallback(result) => {
                error!("Failed to extract a JSON analysis from the model response");
                debug!("Unparseable model response: {}", content);
                result
            }
        };

        info!(
            analysis_time_ms = result.analysis_metadata.analysis_time_ms,
            overall_score = result.overall_score,
            critical_issues = result.critical_issues.len(),
            suggestions = result.suggestions.len(),
            "Analysis completed"
        );
        Ok(result)
    }

    pub async fn health_check(&self) -> bool {
        self.client.health_check().await
    }

    pub async fn list_models(&self) -> Result<Vec<String>, CriticError> {
        self.client.list_models().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: &str) -> Config {
        Config {
            api_key: api_key.to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn missing_api_key_fails_construction() {
        let err = Critic::new(&config("  ")).unwrap_err();
        assert!(matches!(err, CriticError::Config(_)));
    }

    #[test]
    fn zero_timeout_fails_construction() {
        let mut config = config("key");
        config.timeout_ms = 0;
        assert!(Critic::new(&config).is_err());
    }

    #[test]
    fn carries_configured_model_and_limit() {
        let mut config = config("key");
        config.model = "my-model".into();
        config.max_code_length = 64;
        let critic = Critic::new(&config).unwrap();
        assert_eq!(critic.model(), "my-model");
        assert_eq!(critic.max_code_length(), 64);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let critic = Critic::new(&config("sk-secret-value")).unwrap();
        let printed = format!("{:?}", critic);
        assert!(!printed.contains("sk-secret-value"));
        assert!(printed.contains("max_code_length"));
    }

    #[tokio::test]
    async fn oversized_code_is_rejected_before_any_request() {
        let mut config = config("key");
        // Nothing listens here; reaching the network would surface as an API error.
        config.api_url = "http://127.0.0.1:9".into();
        config.max_code_length = 4;
        let critic = Critic::new(&config).unwrap();
        let input = CritiqueInput::from_json(
            r#"{"code": "12345", "context": {"language": "text", "userGoal": "review"}}"#,
        )
        .unwrap();
        let err = critic.critique(input).await.unwrap_err();
        assert!(err.is_validation());
    }
}
