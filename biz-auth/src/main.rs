//! biz-auth - Sign in to Bizlink and manage the company profile

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libbizlink::logging::LoggingConfig;
use libbizlink::{AppContext, BizlinkError, CompanyInfo, Config, RegistrationWizard};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "biz-auth")]
#[command(about = "Sign in to Bizlink and manage your company profile", long_about = None)]
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
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,

        /// Read the password from stdin (for automation)
        #[arg(long)]
        password_stdin: bool,
    },

    /// Create a company account and sign in
    Register {
        /// Account email
        #[arg(long)]
        email: String,

        /// Company name
        #[arg(long)]
        name: String,

        /// Industry the company works in
        #[arg(long)]
        industry: String,

        /// Short company description
        #[arg(long)]
        description: String,

        /// Year the company was founded (default: current year)
        #[arg(long)]
        founded_year: Option<i32>,

        /// Offered service (repeatable)
        #[arg(long = "service")]
        services: Vec<String>,

        /// Read password and confirmation from stdin, one per line
        #[arg(long)]
        password_stdin: bool,
    },

    /// Sign out and forget the stored session
    Logout,

    /// Show whether a session is active
    Status {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// View or change the company profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the profile
    Show {
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Change profile fields; omitted fields keep their current value
    Edit {
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        industry: Option<String>,

        #[arg(long)]
        description: Option<String>,
    },

    /// Replace the local profile with the server copy
    Sync,

    /// Upload a new profile photo
    Photo {
        /// Image file to upload
        path: PathBuf,
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
    match command {
        Commands::Login {
            email,
            password_stdin,
        } => login(&email, password_stdin).await,
        Commands::Register {
            email,
            name,
            industry,
            description,
            founded_year,
            services,
            password_stdin,
        } => {
            let mut wizard = RegistrationWizard::new();
            wizard.email = email;
            wizard.company.name = name;
            wizard.company.industry = industry;
            wizard.company.description = description;
            wizard.company.founded_year = founded_year;
            wizard.company.services = services;
            register(wizard, password_stdin).await
        }
        Commands::Logout => logout().await,
        Commands::Status { format } => status(format).await,
        Commands::Profile { command } => match command {
            ProfileCommands::Show { format } => show_profile(format).await,
            ProfileCommands::Edit {
                name,
                email,
                industry,
                description,
            } => edit_profile(name, email, industry, description).await,
            ProfileCommands::Sync => sync_profile().await,
            ProfileCommands::Photo { path } => upload_photo(&path).await,
        },
    }
}

async fn open_context() -> Result<AppContext> {
    let config = Config::load_or_default().context("Failed to load configuration")?;
    let ctx = AppContext::from_config(&config)
        .await
        .context("Failed to initialize Bizlink")?;
    Ok(ctx)
}

async fn open_session() -> Result<AppContext> {
    let config = Config::load_or_default().context("Failed to load configuration")?;
    Ok(AppContext::open_session(&config).await?)
}

/// Read one password, from stdin when asked to or when there is no terminal
fn read_password(
    lines: &mut impl Iterator<Item = io::Result<String>>,
    from_stdin: bool,
    prompt: &str,
) -> Result<String> {
    if from_stdin || !atty::is(atty::Stream::Stdin) {
        let line = lines
            .next()
            .transpose()
            .context("Failed to read password from stdin")?
            .unwrap_or_default();
        return Ok(line.trim_end_matches(['\r', '\n']).to_string());
    }

    rpassword::prompt_password(prompt).context("Failed to read password")
}

async fn login(email: &str, password_stdin: bool) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    let password = read_password(&mut lines, password_stdin, "Password: ")?;

    let mut ctx = open_context().await?;
    ctx.login(email, &password).await?;

    println!(
        "Logged in as {} ({})",
        ctx.state().company.name,
        ctx.state().session.email.as_deref().unwrap_or(email)
    );
    Ok(())
}

async fn register(mut wizard: RegistrationWizard, password_stdin: bool) -> Result<()> {
    {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();
        wizard.password = read_password(&mut lines, password_stdin, "Password: ")?;
        wizard.confirm_password = read_password(&mut lines, password_stdin, "Confirm password: ")?;
    }

    wizard.next()?;
    let submission = wizard.submit()?;

    let mut ctx = open_context().await?;
    ctx.register(
        &submission.email,
        &submission.password,
        &submission.confirm_password,
        Some(submission.company),
    )
    .await?;

    println!("Registered {}", ctx.state().company.name);
    Ok(())
}

async fn logout() -> Result<()> {
    let mut ctx = open_context().await?;
    ctx.logout().await?;
    println!("Logged out");
    Ok(())
}

async fn status(format: OutputFormat) -> Result<()> {
    let mut ctx = open_context().await?;
    let authenticated = ctx.restore_auth_state().await;
    let session = &ctx.state().session;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "authenticated": authenticated,
                "userId": session.user_id,
                "email": session.email,
                "company": authenticated.then(|| ctx.state().company.name.clone()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => {
            if authenticated {
                println!(
                    "Logged in as {} ({})",
                    ctx.state().company.name,
                    session.email.as_deref().unwrap_or("unknown email")
                );
            } else {
                println!("Not logged in");
            }
        }
    }

    Ok(())
}

async fn show_profile(format: OutputFormat) -> Result<()> {
    let ctx = open_session().await?;
    let company = &ctx.state().company;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(company)?);
        }
        OutputFormat::Text => {
            println!("Name:        {}", company.name);
            println!("Email:       {}", company.email);
            println!("Industry:    {}", company.industry);
            println!("Description: {}", company.description);
            if let Some(photo) = &company.profile_photo {
                println!("Photo:       {}", photo);
            }
        }
    }

    Ok(())
}

async fn edit_profile(
    name: Option<String>,
    email: Option<String>,
    industry: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let mut ctx = open_session().await?;

    let current = ctx.state().company.info();
    let info = CompanyInfo {
        name: name.unwrap_or(current.name),
        email: email.unwrap_or(current.email),
        industry: industry.unwrap_or(current.industry),
        description: description.unwrap_or(current.description),
    };

    ctx.save_profile(info).await?;
    println!("Profile updated");
    Ok(())
}

async fn sync_profile() -> Result<()> {
    let mut ctx = open_session().await?;
    ctx.sync_profile().await?;
    println!("Profile synced: {}", ctx.state().company.name);
    Ok(())
}

async fn upload_photo(path: &Path) -> Result<()> {
    let bytes = std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("photo.jpg")
        .to_string();

    let mut ctx = open_session().await?;

    print!("Uploading {}... ", filename);
    io::stdout().flush()?;
    ctx.upload_profile_photo(bytes, &filename).await?;
    println!("done");

    Ok(())
}
