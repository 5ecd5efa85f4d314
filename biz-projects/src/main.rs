//! biz-projects - Track partner projects on Bizlink

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use libbizlink::logging::LoggingConfig;
use libbizlink::{AppContext, BizlinkError, Config, Project, ProjectInput, ProjectStage};

#[derive(Parser)]
#[command(name = "biz-projects")]
#[command(about = "Track partner projects on Bizlink", long_about = None)]
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
    /// List projects
    List {
        /// Only show projects in this stage
        #[arg(short, long)]
        stage: Option<ProjectStage>,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one project
    Show {
        id: i64,

        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a project
    Create {
        #[arg(long)]
        name: String,

        /// Customer company name
        #[arg(long)]
        customer: String,

        /// Executor company name
        #[arg(long)]
        executor: String,

        #[arg(long, default_value = "")]
        description: String,

        #[arg(long, default_value = "planning")]
        stage: ProjectStage,

        #[arg(long, default_value = "active")]
        status: String,

        /// Planned function (repeatable)
        #[arg(long = "function")]
        functions: Vec<String>,

        #[arg(long, default_value = "")]
        expected_result: String,
    },

    /// Delete a project
    Delete { id: i64 },

    /// Move a project to another stage
    Stage {
        id: i64,

        /// planning, development, beta_test, alpha_test or production
        stage: ProjectStage,
    },

    /// Set the free-form status of a project
    Status { id: i64, status: String },

    /// Add a function to a project
    AddFunction { id: i64, function: String },

    /// Remove a function from a project
    RemoveFunction { id: i64, function: String },
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
        Commands::List { stage, format } => {
            ctx.fetch_projects().await?;
            let projects: Vec<&Project> = ctx
                .state()
                .projects
                .items
                .iter()
                .filter(|p| stage.map_or(true, |stage| p.stage == stage))
                .collect();
            print_projects(&projects, format)
        }
        Commands::Show { id, format } => {
            let project = ctx
                .services()
                .projects()
                .get(id)
                .await
                .map_err(BizlinkError::from)?;
            print_project(&project, format)
        }
        Commands::Create {
            name,
            customer,
            executor,
            description,
            stage,
            status,
            functions,
            expected_result,
        } => {
            let input = ProjectInput {
                name,
                status,
                description,
                stage,
                customer_company: customer,
                executor_company: executor,
                functions,
                expected_result,
            };
            let project = ctx.create_project(input).await?;
            println!("Created project {} ({})", project.id, project.name);
            Ok(())
        }
        Commands::Delete { id } => {
            ctx.delete_project(id).await?;
            println!("Deleted project {}", id);
            Ok(())
        }
        Commands::Stage { id, stage } => {
            let project = ctx.update_project_stage(id, stage).await?;
            println!("Project {} is now in {}", project.id, project.stage);
            Ok(())
        }
        Commands::Status { id, status } => {
            let project = ctx.update_project_status(id, &status).await?;
            println!("Project {} status: {}", project.id, project.status);
            Ok(())
        }
        Commands::AddFunction { id, function } => {
            let project = ctx.add_project_function(id, &function).await?;
            println!("Project {} has {} functions", project.id, project.functions.len());
            Ok(())
        }
        Commands::RemoveFunction { id, function } => {
            let project = ctx.remove_project_function(id, &function).await?;
            println!("Project {} has {} functions", project.id, project.functions.len());
            Ok(())
        }
    }
}

fn print_projects(projects: &[&Project], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(projects)?),
        OutputFormat::Text => {
            if projects.is_empty() {
                println!("No projects");
            }
            for project in projects {
                println!(
                    "[{}] {:<12} {}  ({} -> {})",
                    project.id,
                    project.stage.as_str(),
                    project.name,
                    project.customer_company,
                    project.executor_company
                );
            }
        }
    }

    Ok(())
}

fn print_project(project: &Project, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(project)?),
        OutputFormat::Text => {
            println!("{}", project.name);
            println!("Stage:     {}", project.stage);
            println!("Status:    {}", project.status);
            println!("Customer:  {}", project.customer_company);
            println!("Executor:  {}", project.executor_company);
            println!("Updated:   {}", project.updated_at.format("%Y-%m-%d %H:%M"));
            if !project.description.is_empty() {
                println!();
                println!("{}", project.description);
            }
            if !project.functions.is_empty() {
                println!();
                println!("Functions:");
                for function in &project.functions {
                    println!("  - {}", function);
                }
            }
            if !project.expected_result.is_empty() {
                println!();
                println!("Expected result: {}", project.expected_result);
            }
        }
    }

    Ok(())
}
