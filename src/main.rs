use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use doffin::config::Config;
use doffin::models::NoticeRef;
use doffin::tools::{error_payload, NoticeTools, SearchNoticesArgs};
use doffin::NoticeClient;

#[derive(Parser)]
#[command(
    name = "doffin",
    version,
    about = "Search and read public procurement notices on doffin.no",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (TOML); environment variables are used otherwise
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the configuration
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search notices
    Search {
        /// Free-text query
        #[arg(short, long)]
        query: Option<String>,

        /// Contracting authority
        #[arg(short, long)]
        buyer: Option<String>,

        /// Published on or after (YYYY-MM-DD)
        #[arg(long)]
        published_from: Option<String>,

        /// Published on or before (YYYY-MM-DD)
        #[arg(long)]
        published_to: Option<String>,

        /// Deadline on or before (YYYY-MM-DD)
        #[arg(long)]
        deadline_to: Option<String>,

        /// County
        #[arg(long)]
        county: Option<String>,

        /// Procedure type
        #[arg(long)]
        procedure: Option<String>,

        /// CPV codes, comma separated
        #[arg(long, value_delimiter = ',')]
        cpv: Vec<String>,

        /// Result page
        #[arg(short, long, default_value = "1")]
        page: i64,
    },

    /// Fetch one notice by identifier or URL
    Get {
        /// Notice identifier or detail page URL
        notice: String,
    },

    /// Print the tool definitions as JSON
    Tools,

    /// Invoke a tool with JSON arguments
    Call {
        /// Tool name
        name: String,

        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env()?,
    };
    if let Some(format) = &cli.log_format {
        config.logging.format = format.clone();
    }
    config.validate().context("Invalid configuration")?;

    setup_tracing(&config.logging.level, &config.logging.format, cli.verbose)?;

    if let Commands::Tools = cli.command {
        return print_json(&serde_json::to_value(NoticeTools::definitions())?);
    }

    let client = Arc::new(NoticeClient::new(&config)?);
    let tools = NoticeTools::new(Arc::clone(&client));

    match cli.command {
        Commands::Search {
            query,
            buyer,
            published_from,
            published_to,
            deadline_to,
            county,
            procedure,
            cpv,
            page,
        } => {
            let filter = SearchNoticesArgs {
                q: query,
                cpv: Some(cpv),
                buyer,
                published_from,
                published_to,
                deadline_to,
                county,
                procedure,
                page: Some(page),
            }
            .into_filter()?;
            let response = client.search_notices(&filter).await?;
            print_json(&serde_json::to_value(&response)?)
        }
        Commands::Get { notice } => {
            let notice = NoticeRef::parse(&notice)?;
            let detail = client.get_notice(&notice).await?;
            print_json(&serde_json::to_value(&detail)?)
        }
        Commands::Call { name, args } => {
            let args: Value =
                serde_json::from_str(&args).context("Tool arguments must be valid JSON")?;
            match tools.call(&name, args).await {
                Ok(output) => print_json(&output),
                Err(e) => {
                    print_json(&error_payload(&e))?;
                    std::process::exit(1);
                }
            }
        }
        Commands::Tools => Ok(()),
    }
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn setup_tracing(level: &str, format: &str, verbose: bool) -> Result<()> {
    let default_directive = if verbose {
        "doffin=debug,info".to_string()
    } else {
        format!("doffin={level},warn")
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // Logs go to stderr so stdout carries only results
    match format {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }

    Ok(())
}
