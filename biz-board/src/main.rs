//! biz-board - Browse and post announcements on the Bizlink board

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libbizlink::logging::LoggingConfig;
use libbizlink::{
    Announcement, AnnouncementDraft, AnnouncementKind, AppContext, BizlinkError, Company, Config,
};

#[derive(Parser)]
#[command(name = "biz-board")]
#[command(about = "Browse and post announcements on the Bizlink board", long_about = None)]
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
    /// List announcements, newest first
    List {
        /// Only show this kind (search or offer)
        #[arg(short, long)]
        kind: Option<AnnouncementKind>,

        /// Only show announcements posted by your company
        #[arg(long)]
        mine: bool,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one announcement
    Show {
        id: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Post a new announcement
    Post {
        #[arg(long)]
        title: String,

        #[arg(long)]
        description: String,

        /// search (looking for a partner) or offer (offering a service)
        #[arg(short, long, default_value = "search")]
        kind: AnnouncementKind,

        /// Requirement or offered service (repeatable, at most 5)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,
    },

    /// Change an announcement; omitted fields keep their current value
    Update {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(short, long)]
        kind: Option<AnnouncementKind>,

        /// Replace the requirement list (repeatable, at most 5)
        #[arg(short, long = "requirement")]
        requirements: Vec<String>,
    },

    /// Delete an announcement
    Delete { id: i64 },

    /// List registered companies
    Companies {
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
        let code = exit_code(&e);
        if code == 2 {
            eprintln!("Run 'biz-auth login <email>' to sign in");
        }
        std::process::exit(code);
    }
}

fn exit_code(e: &anyhow::Error) -> i32 {
    e.downcast_ref::<BizlinkError>()
        .map(BizlinkError::exit_code)
        .unwrap_or(1)
}

async fn run_command(command: Commands) -> Result<()> {
    let config = Config::load_or_default().context("Failed to load configuration")?;
    let mut ctx = AppContext::open_session(&config).await?;

    match command {
        Commands::List { kind, mine, format } => list(&mut ctx, kind, mine, format).await,
        Commands::Show { id, format } => show(&ctx, id, format).await,
        Commands::Post {
            title,
            description,
            kind,
            requirements,
        } => {
            let draft = build_draft(title, description, kind, &requirements)?;
            let announcement = ctx.create_announcement(draft).await?;
            println!("Posted announcement {}", announcement.id);
            Ok(())
        }
        Commands::Update {
            id,
            title,
            description,
            kind,
            requirements,
        } => {
            let current = ctx
                .services()
                .announcements()
                .get(id)
                .await
                .map_err(BizlinkError::from)?;

            let requirements = if requirements.is_empty() {
                current.requirements
            } else {
                requirements
            };
            let draft = build_draft(
                title.unwrap_or(current.title),
                description.unwrap_or(current.description),
                kind.unwrap_or(current.kind),
                &requirements,
            )?;

            let announcement = ctx.update_announcement(id, draft).await?;
            println!("Updated announcement {}", announcement.id);
            Ok(())
        }
        Commands::Delete { id } => {
            ctx.delete_announcement(id).await?;
            println!("Deleted announcement {}", id);
            Ok(())
        }
        Commands::Companies { format } => companies(&ctx, format).await,
    }
}

fn build_draft(
    title: String,
    description: String,
    kind: AnnouncementKind,
    requirements: &[String],
) -> Result<AnnouncementDraft> {
    let mut draft = AnnouncementDraft::new(title, description, kind);
    for requirement in requirements {
        draft.add_requirement(requirement)?;
    }
    Ok(draft)
}

async fn list(
    ctx: &mut AppContext,
    kind: Option<AnnouncementKind>,
    mine: bool,
    format: OutputFormat,
) -> Result<()> {
    ctx.fetch_announcements().await?;

    let own_id = ctx
        .state()
        .session
        .user_id
        .as_deref()
        .and_then(|id| id.parse::<i64>().ok());

    let announcements: Vec<&Announcement> = ctx
        .state()
        .announcements
        .items
        .iter()
        .filter(|a| kind.map_or(true, |kind| a.kind == kind))
        .filter(|a| !mine || (own_id.is_some() && a.owner_id() == own_id))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&announcements)?),
        OutputFormat::Text => {
            if announcements.is_empty() {
                println!("No announcements");
            }
            for announcement in announcements {
                let company = announcement
                    .company
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("-");
                println!(
                    "[{}] {:<6} {}  ({}, {})",
                    announcement.id,
                    announcement.kind.to_string(),
                    announcement.title,
                    company,
                    announcement.created_at.format("%Y-%m-%d")
                );
            }
        }
    }

    Ok(())
}

async fn show(ctx: &AppContext, id: i64, format: OutputFormat) -> Result<()> {
    let announcement = ctx
        .services()
        .announcements()
        .get(id)
        .await
        .map_err(BizlinkError::from)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&announcement)?),
        OutputFormat::Text => {
            println!("{} ({})", announcement.title, announcement.kind);
            if let Some(company) = &announcement.company {
                println!("Posted by {}", company.name);
            }
            println!("Posted on {}", announcement.created_at.format("%Y-%m-%d %H:%M"));
            println!();
            println!("{}", announcement.description);
            if !announcement.requirements.is_empty() {
                println!();
                for requirement in &announcement.requirements {
                    println!("  - {}", requirement);
                }
            }
        }
    }

    Ok(())
}

async fn companies(ctx: &AppContext, format: OutputFormat) -> Result<()> {
    let companies: Vec<Company> = ctx.list_companies().await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&companies)?),
        OutputFormat::Text => {
            for company in &companies {
                println!("[{}] {}  ({})", company.id, company.name, company.industry);
            }
        }
    }

    Ok(())
}
