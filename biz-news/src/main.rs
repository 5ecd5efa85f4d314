//! biz-news - Read industry news on Bizlink

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libbizlink::logging::LoggingConfig;
use libbizlink::{AppContext, BizlinkError, Config, NewsArticle};

#[derive(Parser)]
#[command(name = "biz-news")]
#[command(about = "Read industry news on Bizlink", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch the latest articles (only those with an image are kept)
    Fetch {
        /// Maximum number of articles to print
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the articles from the last successful fetch without going online
    Cached {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.verbose).init();

    if let Err(e) = run_command(cli.command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(exit_code(&e));
    }
}

fn exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<BizlinkError>()
        .map(BizlinkError::exit_code)
        .unwrap_or(1)
}

async fn run_command(command: Commands) -> Result<()> {
    let config = Config::load_or_default().context("Failed to load configuration")?;
    let mut ctx = AppContext::from_config(&config)
        .await
        .context("Failed to initialize Bizlink")?;

    match command {
        Commands::Fetch { limit, format } => {
            ctx.fetch_news().await?;
            tracing::debug!(count = ctx.state().news.len(), "News feed refreshed");
            print_articles(&ctx.state().news.items, limit, format)
        }
        Commands::Cached { limit, format } => {
            print_articles(&ctx.state().news.items, limit, format)
        }
    }
}

fn print_articles(articles: &[NewsArticle], limit: usize, format: OutputFormat) -> Result<()> {
    let articles = &articles[..articles.len().min(limit)];

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(articles)?),
        OutputFormat::Text => {
            if articles.is_empty() {
                println!("No articles");
            }
            for article in articles {
                println!(
                    "{}  {}",
                    article.published_at.format("%Y-%m-%d"),
                    article.title
                );
                println!("    {} | {}", article.source.name, article.url);
            }
        }
    }

    Ok(())
}
