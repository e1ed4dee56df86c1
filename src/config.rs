use anyhow::{anyhow, Context, Result};
use dialoguer::{theme::ColorfulTheme, Input, Select};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub const CONFIG_FILE: &str = ".critic.yml";
const GLOBAL_CONFIG_DIR: &str = ".config/critic";

pub const DEFAULT_API_URL: &str = "https://api.together.ai/v1";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-R1-0528-tput";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CODE_LENGTH: usize = 50_000;

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_ms: u64,
    pub max_code_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

/// Stand-in printed for an API key in `Debug` output.
pub(crate) fn redacted(key: &str) -> &'static str {
    if key.is_empty() {
        "<unset>"
    } else {
        "[redacted]"
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("api_key", &redacted(&self.api_key))
            .field("model", &self.model)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_code_length", &self.max_code_length)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_code_length: DEFAULT_MAX_CODE_LENGTH,
            log_level: None,
        }
    }
}

impl Config {
    /// Project file first, then the global file, then defaults.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let config_path = project_dir.join(CONFIG_FILE);
        if config_path.exists() {
            Self::load_file(&config_path)
        } else if let Some(global_config) = Self::load_global()? {
            Ok(global_config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn save(&self, project_dir: &Path) -> Result<()> {
        let config_path = project_dir.join(CONFIG_FILE);
        let content = serde_yaml::to_string(self)?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn load_global() -> Result<Option<Self>> {
        match dirs::home_dir() {
            Some(home) => {
                let global_config_path = home.join(GLOBAL_CONFIG_DIR).join(CONFIG_FILE);
                if global_config_path.exists() {
                    Ok(Some(Self::load_file(&global_config_path)?))
                } else {
                    Ok(None)
                }
            }
            None => Ok(None),
        }
    }

    pub fn save_global(&self) -> Result<()> {
        let home = dirs::home_dir().ok_or_else(|| anyhow!("Unable to locate the home directory"))?;
        let global_config_dir = home.join(GLOBAL_CONFIG_DIR);
        fs::create_dir_all(&global_config_dir)?;
        let content = serde_yaml::to_string(self)?;
        fs::write(global_config_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    /// Applies `CRITIC_*` environment variables on top of the file values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(value) = var("CRITIC_API_KEY") {
            self.api_key = value;
        }
        if let Some(value) = var("CRITIC_API_URL") {
            self.api_url = value;
        }
        if let Some(value) = var("CRITIC_MODEL") {
            self.model = value;
        }
        if let Some(value) = var("CRITIC_TIMEOUT_MS") {
            self.timeout_ms = value
                .trim()
                .parse()
                .with_context(|| format!("CRITIC_TIMEOUT_MS is not a number: {}", value))?;
        }
        if let Some(value) = var("CRITIC_MAX_CODE_LENGTH") {
            self.max_code_length = value
                .trim()
                .parse()
                .with_context(|| format!("CRITIC_MAX_CODE_LENGTH is not a number: {}", value))?;
        }
        if let Some(value) = var("CRITIC_LOG_LEVEL") {
            self.log_level = Some(value);
        }
        Ok(())
    }
}

/// File configuration with environment overrides applied.
pub fn get_effective_config(project_dir: &Path) -> Result<Config> {
    let mut config = Config::load(project_dir)?;
    config.apply_env()?;
    Ok(config)
}

pub async fn configure_interactive(project_dir: &Path, global: bool) -> Result<()> {
    let theme = ColorfulTheme::default();
    let current_config = if global {
        Config::load_global()?.unwrap_or_default()
    } else {
        Config::load(project_dir)?
    };
    println!("\n🔧 Code critic configuration");
    println!("===========================");
    if global {
        println!("Editing the global configuration\n");
    } else {
        println!("Editing the project configuration\n");
    }

    let api_url: String = Input::with_theme(&theme)
        .with_prompt("API URL")
        .with_initial_text(&current_config.api_url)
        .interact_text()?;
    let api_key: String = Input::with_theme(&theme)
        .with_prompt("API Key")
        .with_initial_text(&current_config.api_key)
        .interact_text()?;

    let candidate = Config {
        api_url: api_url.clone(),
        api_key: api_key.clone(),
        ..current_config.clone()
    };
    let listed = match crate::analysis::Critic::new(&candidate) {
        Ok(critic) => critic.list_models().await.map_err(anyhow::Error::from),
        Err(e) => Err(e.into()),
    };
    let mut models = match listed {
        Ok(models) if !models.is_empty() => {
            info!("Fetched {} available models", models.len());
            models
        }
        Ok(_) => vec![current_config.model.clone()],
        Err(e) => {
            warn!("Unable to fetch the model list: {}, falling back to the configured model", e);
            vec![current_config.model.clone()]
        }
    };
    if !models.contains(&current_config.model) {
        models.insert(0, current_config.model.clone());
    }
    let default_index = models
        .iter()
        .position(|m| m == &current_config.model)
        .unwrap_or(0);
    let model_index = Select::with_theme(&theme)
        .with_prompt("Select a model")
        .default(default_index)
        .items(&models)
        .interact()?;

    let timeout_ms: u64 = Input::with_theme(&theme)
        .with_prompt("Request timeout (ms)")
        .default(current_config.timeout_ms)
        .interact_text()?;
    let max_code_length: usize = Input::with_theme(&theme)
        .with_prompt("Maximum code length (characters)")
        .default(current_config.max_code_length)
        .interact_text()?;

    let new_config = Config {
        api_url,
        api_key,
        model: models[model_index].clone(),
        timeout_ms,
        max_code_length,
        log_level: current_config.log_level,
    };
    if global {
        new_config.save_global()?;
        info!("Global configuration updated");
    } else {
        new_config.save(project_dir)?;
        info!("Project configuration updated");
    }
    Ok(())
}

pub fn init_project(project_dir: &Path) -> Result<()> {
    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        return Err(anyhow!("Config file already exists: {}", config_path.display()));
    }
    Config::default().save(project_dir)?;
    info!("Created config file: {}", config_path.display());

    // The file holds the API key, keep it out of version control.
    let gitignore_path = project_dir.join(".gitignore");
    if gitignore_path.exists() {
        let mut content = fs::read_to_string(&gitignore_path)?;
        if !content.lines().any(|line| line.trim() == CONFIG_FILE) {
            if !content.is_empty() && !content.ends_with('\n') {
                content.push('\n');
            }
            content.push_str(CONFIG_FILE);
            content.push('\n');
            fs::write(&gitignore_path, content)?;
            info!("Added {} to .gitignore", CONFIG_FILE);
        }
    } else {
        fs::write(&gitignore_path, format!("{}\n", CONFIG_FILE))?;
        info!("Created .gitignore with {}", CONFIG_FILE);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_provider_settings() {
        let config = Config::default();
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.max_code_length, 50_000);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn save_and_load_project_file() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            api_key: "secret".into(),
            model: "small-model".into(),
            max_code_length: 1000,
            ..Config::default()
        };
        config.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), config);
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = Config {
            api_key: "sk-do-not-log".into(),
            ..Config::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("sk-do-not-log"));
        assert!(printed.contains("[redacted]"));
        assert!(format!("{:?}", Config::default()).contains("<unset>"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "api_key: abc\ntimeout_ms: 500\n").unwrap();
        let config = Config::load(dir.path()).unwrap();
        assert_eq!(config.api_key, "abc");
        assert_eq!(config.timeout_ms, 500);
        assert_eq!(config.model, DEFAULT_MODEL);
    }

    #[test]
    fn env_vars_override_file_values() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CRITIC_API_KEY", "from-env"),
            ("CRITIC_MAX_CODE_LENGTH", "2048"),
            ("CRITIC_LOG_LEVEL", "debug"),
        ]);
        let mut config = Config::default();
        config
            .apply_vars(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.api_key, "from-env");
        assert_eq!(config.max_code_length, 2048);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn non_numeric_env_timeout_is_an_error() {
        let mut config = Config::default();
        let result =
            config.apply_vars(|key| (key == "CRITIC_TIMEOUT_MS").then(|| "soon".to_string()));
        assert!(result.is_err());
    }

    #[test]
    fn init_creates_config_and_gitignore_entry() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target").unwrap();
        init_project(dir.path()).unwrap();

        assert!(dir.path().join(CONFIG_FILE).exists());
        let gitignore = fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(gitignore, "target\n.critic.yml\n");
        assert!(init_project(dir.path()).is_err());
    }
}
