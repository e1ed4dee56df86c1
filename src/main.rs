use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use code_critic::context::{self, DEFAULT_GOAL};
use code_critic::{config, markdown, Config, ContextInput, Critic, CriticismResult, CritiqueInput};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about = "Send source code to an LLM and get a structured critique")]
struct Args {
    /// Project directory holding .critic.yml
    #[arg(short, long, default_value = ".")]
    path: PathBuf,
    /// File to analyze ("-" reads standard input)
    #[arg(short, long)]
    file: Option<PathBuf>,
    /// Full analysis request as a JSON file
    #[arg(long, conflicts_with = "file")]
    request: Option<PathBuf>,
    /// Language of the code (detected from the file extension when omitted)
    #[arg(short, long)]
    language: Option<String>,
    /// Framework the code is written for
    #[arg(long)]
    framework: Option<String>,
    /// What the code is supposed to achieve
    #[arg(short, long)]
    goal: Option<String>,
    /// Related file as path[=relevance], repeatable
    #[arg(long)]
    related: Vec<String>,
    /// Add every file of the same language under this directory as context
    #[arg(long)]
    related_dir: Option<PathBuf>,
    /// Earlier conversation message, repeatable (oldest first)
    #[arg(long)]
    history: Vec<String>,
    /// Chat-completion API base URL
    #[arg(long)]
    api_url: Option<String>,
    /// API key for the completion provider
    #[arg(long)]
    api_key: Option<String>,
    /// Model name
    #[arg(long)]
    model: Option<String>,
    /// Request timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,
    /// Emit JSON instead of Markdown
    #[arg(long)]
    json: bool,
    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a .critic.yml in the project directory
    Init,
    /// Edit the configuration interactively
    Config {
        /// Edit the global configuration
        #[arg(short, long)]
        global: bool,
    },
    /// Check that the completion provider is reachable
    Health,
    /// Render a saved JSON critique as Markdown
    GenerateMd {
        /// JSON report path
        #[arg(short, long)]
        report: String,
        /// Markdown output path
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = config::get_effective_config(&args.path)?;
    apply_overrides(&mut config, &args);

    let level = args
        .log_level
        .clone()
        .or_else(|| config.log_level.clone())
        .unwrap_or_else(|| "info".to_string());
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    match &args.command {
        Some(Commands::Init) => config::init_project(&args.path)?,
        Some(Commands::Config { global }) => {
            config::configure_interactive(&args.path, *global).await?;
        }
        Some(Commands::Health) => health(&config).await?,
        Some(Commands::GenerateMd { report, output }) => {
            markdown::generate_md_from_json(report, output.as_deref())?;
        }
        None => critique(&config, &args).await?,
    }
    Ok(())
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(api_url) = &args.api_url {
        config.api_url = api_url.clone();
    }
    if let Some(api_key) = &args.api_key {
        config.api_key = api_key.clone();
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(timeout_ms) = args.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
}

async fn health(config: &Config) -> Result<()> {
    let critic = Critic::new(config)?;
    let healthy = critic.health_check().await;
    let status = serde_json::json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "api_url": config.api_url,
        "model": critic.model(),
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    if healthy {
        Ok(())
    } else {
        Err(anyhow!("Completion provider is not reachable at {}", config.api_url))
    }
}

async fn critique(config: &Config, args: &Args) -> Result<()> {
    let (input, source) = build_input(args)?;
    let critic = Critic::new(config)?;

    info!("Starting critique of {}", source);
    let result = match critic.critique(input).await {
        Ok(result) => result,
        Err(e) => {
            error!(status = e.status(), "Critique failed: {}", e);
            return Err(e.into());
        }
    };
    write_result(&result, &source, args)
}

fn build_input(args: &Args) -> Result<(CritiqueInput, String)> {
    if let Some(request_path) = &args.request {
        let text = std::fs::read_to_string(request_path)
            .with_context(|| format!("Failed to read request {}", request_path.display()))?;
        return Ok((CritiqueInput::from_json(&text)?, request_path.display().to_string()));
    }

    let file = args
        .file
        .as_ref()
        .ok_or_else(|| anyhow!("Nothing to analyze: pass --file <path> or --request <json>"))?;
    let (code, source) = if file.as_os_str() == "-" {
        let mut code = String::new();
        std::io::stdin().read_to_string(&mut code)?;
        (code, "stdin".to_string())
    } else {
        let code = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        (code, file.display().to_string())
    };

    let language = args
        .language
        .clone()
        .or_else(|| context::detect_language(file).map(String::from));

    let mut related_files = args
        .related
        .iter()
        .map(String::as_str)
        .map(context::read_related_file)
        .collect::<Result<Vec<_>>>()?;
    if let (Some(dir), Some(language)) = (&args.related_dir, &language) {
        related_files.extend(context::collect_related_dir(dir, language, Some(Path::new(file))));
    }

    let input = CritiqueInput {
        code: Some(code),
        context: Some(ContextInput {
            language,
            framework: args.framework.clone(),
            user_goal: Some(args.goal.clone().unwrap_or_else(|| DEFAULT_GOAL.to_string())),
            related_files: Some(related_files),
        }),
        chat_history: Some(context::history_entries(&args.history)),
    };
    Ok((input, source))
}

fn write_result(result: &CriticismResult, source: &str, args: &Args) -> Result<()> {
    let as_json = args.json || args.output.as_deref().is_some_and(|o| o.ends_with(".json"));
    let rendered = if as_json {
        serde_json::to_string_pretty(result)?
    } else {
        markdown::render_report(result, source)
    };
    match &args.output {
        Some(path) => {
            std::fs::write(path, &rendered).with_context(|| format!("Failed to write {}", path))?;
            info!("Critique written to {}", path);
        }
        None => println!("{}", rendered),
    }
    Ok(())
}
