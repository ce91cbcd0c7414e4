/*
newsbrief - single-binary main.rs
Fetches category news feeds and renders three-bullet briefings in the terminal.
*/

use anyhow::Result;
use clap::Parser;
use common::Config;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsbrief::briefing::{BriefItem, Briefing};
use newsbrief::feeds::Category;
use newsbrief::llm::remote::RemoteLlmProvider;
use newsbrief::llm::summarizer::SummaryOutcome;
use newsbrief::llm::LlmProvider;

/// Gemini's OpenAI-compatible chat endpoint; overridable in config.
const DEFAULT_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
const DEFAULT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Parser, Debug)]
#[command(name = "newsbrief", about = "Three-bullet news briefings from category feeds")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Category to brief; omit for an interactive prompt
    #[arg(long, value_enum)]
    category: Option<Category>,

    /// Override the model identifier from config
    #[arg(long)]
    model: Option<String>,

    /// API key; falls back to the env var named in config, then an interactive prompt
    #[arg(long)]
    api_key: Option<String>,

    /// List model identifiers available at the provider and exit
    #[arg(long)]
    list_models: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // Resolve config paths
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = args.config.clone() {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() {
            Some(p)
        } else {
            None
        }
    };

    // Load configuration with defaults
    let config = match Config::load_with_defaults(
        if default_path.exists() {
            Some(&default_path)
        } else {
            None
        },
        override_path.as_deref(),
    )
    .await
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    info!(default = ?default_path, override_file = ?override_path, "configuration loaded");

    // Resolve the credential: CLI flag, then environment, then (in the
    // interactive loop) a one-time prompt.
    let mut api_key = resolve_api_key(args.api_key.as_deref(), &config);

    if args.list_models {
        let Some(key) = api_key else {
            return Err(anyhow::anyhow!(
                "listing models requires an API key (--api-key or the configured env var)"
            ));
        };
        let provider = build_provider(&config, args.model.as_deref(), key);
        for model in provider.list_models().await? {
            println!("{}", model);
        }
        return Ok(());
    }

    if api_key.is_none() && args.category.is_none() {
        api_key = prompt_api_key()?;
    }

    let provider: Option<Arc<dyn LlmProvider>> = match api_key {
        Some(key) => Some(Arc::new(build_provider(&config, args.model.as_deref(), key))),
        None => {
            warn!(
                "no API credential configured; headlines will render without summaries \
                 (set {} or pass --api-key)",
                api_key_env_name(&config)
            );
            None
        }
    };

    let briefing = Briefing::new(&config, provider)?;

    match args.category {
        Some(category) => {
            let items = briefing.run(Some(category)).await;
            render(&category.to_string(), &items);
        }
        None => interactive_loop(&briefing).await?,
    }

    Ok(())
}

fn api_key_env_name(config: &Config) -> String {
    config
        .llm
        .as_ref()
        .and_then(|l| l.api_key_env.clone())
        .unwrap_or_else(|| DEFAULT_API_KEY_ENV.to_string())
}

fn resolve_api_key(cli_key: Option<&str>, config: &Config) -> Option<String> {
    if let Some(key) = cli_key {
        return Some(key.to_string());
    }
    std::env::var(api_key_env_name(config))
        .ok()
        .filter(|key| !key.is_empty())
}

/// One-time interactive credential entry; blank input keeps summaries off.
fn prompt_api_key() -> Result<Option<String>> {
    print!("Enter API key (blank to browse headlines only): ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let key = line.trim();
    Ok(if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    })
}

fn build_provider(config: &Config, model_override: Option<&str>, api_key: String) -> RemoteLlmProvider {
    let llm = config.llm.as_ref();
    let api_url = llm
        .and_then(|l| l.api_url.clone())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let model = model_override
        .map(str::to_string)
        .or_else(|| llm.and_then(|l| l.model.clone()))
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let timeout_secs = llm.and_then(|l| l.timeout_seconds).unwrap_or(30);
    let max_tokens = llm.and_then(|l| l.max_tokens).unwrap_or(500);

    RemoteLlmProvider::new(api_url, api_key, model).with_defaults(timeout_secs, max_tokens, 0.7)
}

/// Read category selections from stdin until the user quits. One selection
/// is one logical request; the caches carry over between selections.
async fn interactive_loop(briefing: &Briefing) -> Result<()> {
    let menu = Category::ALL
        .map(|c| c.to_string())
        .join(", ");

    loop {
        println!("\nCategories: {}", menu);
        print!("Select a category (blank for top stories, q to quit): ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if std::io::stdin().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.eq_ignore_ascii_case("q") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let category = if input.is_empty() {
            None
        } else {
            match Category::from_label(input) {
                Some(c) => Some(c),
                None => {
                    println!("Unknown category '{}'; showing top stories instead.", input);
                    None
                }
            }
        };

        let heading = category
            .map(|c| c.to_string())
            .unwrap_or_else(|| "Top stories".to_string());
        let items = briefing.run(category).await;
        render(&heading, &items);
    }

    Ok(())
}

fn render(heading: &str, items: &[BriefItem]) {
    println!("\n=== {} ===", heading);

    if items.is_empty() {
        println!("No articles available right now.");
        return;
    }

    for (idx, item) in items.iter().enumerate() {
        println!("\n[{}] {}", idx + 1, item.article.title);
        println!("    {} | {}", item.article.published_label(), item.article.link);
        match &item.summary {
            Some(SummaryOutcome::Success(text)) => {
                for line in text.lines().filter(|l| !l.trim().is_empty()) {
                    println!("    {}", line.trim());
                }
            }
            Some(SummaryOutcome::RateLimited) => {
                println!(
                    "    Summary unavailable: the model API is rate limited. \
                     Try again in a minute; finished summaries are cached."
                );
            }
            Some(SummaryOutcome::Failed(message)) => {
                println!(
                    "    Summary failed: {} (a different --model may help)",
                    message
                );
            }
            None => {
                println!("    Summaries disabled: no API credential configured.");
            }
        }
    }
}
