//! Recruit CLI
//!
//! Command-line front end for agency application forms.
//!
//! # Usage
//!
//! ```bash
//! recruit --agency ssc jobs list
//! recruit --agency ssc form show --job 4
//! recruit --agency ssc form validate --job 4 --values answers.json
//! recruit --agency ssc apply --job 4 --values answers.json \
//!     --file photo=./me.jpg --file 'documents[0].file=./degree.pdf' --signature sig.png
//! recruit applications get 12 --format json
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "recruit")]
#[command(author = "Recruit Portal")]
#[command(version)]
#[command(about = "Recruit Portal Command Line Interface", long_about = None)]
struct Cli {
    /// API base URL
    #[arg(long, env = "RECRUIT_API_URL")]
    api_url: Option<String>,

    /// Agency code
    #[arg(long, env = "RECRUIT_AGENCY")]
    agency: Option<String>,

    /// Output format
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect the agency
    Agency {
        #[command(subcommand)]
        action: AgencyCommands,
    },
    /// Browse job posts
    Jobs {
        #[command(subcommand)]
        action: JobCommands,
    },
    /// Inspect and check application forms
    Form {
        #[command(subcommand)]
        action: FormCommands,
    },
    /// Submit an application
    Apply {
        /// Job post id
        #[arg(long)]
        job: Option<u64>,
        /// Answers document (JSON)
        #[arg(long)]
        values: PathBuf,
        /// File upload as PATH=FILE, e.g. documents[0].file=./degree.pdf
        #[arg(long = "file")]
        files: Vec<String>,
        /// Signature image (PNG)
        #[arg(long)]
        signature: Option<PathBuf>,
    },
    /// Submitted applications
    Applications {
        #[command(subcommand)]
        action: ApplicationCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AgencyCommands {
    /// Show agency details
    Show,
}

#[derive(Subcommand)]
enum JobCommands {
    /// List open job posts
    List,
}

#[derive(Subcommand)]
enum FormCommands {
    /// Render the form
    Show {
        #[arg(long)]
        job: Option<u64>,
    },
    /// Check an answers document against the form
    Validate {
        #[arg(long)]
        job: Option<u64>,
        #[arg(long)]
        values: PathBuf,
    },
}

#[derive(Subcommand)]
enum ApplicationCommands {
    /// Get application details
    Get { id: u64 },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = config::Config::load(cli.profile.as_deref()).unwrap_or_default();
    init_tracing(config.log_level.as_deref().unwrap_or("warn"));

    let result = match cli.command {
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()).await,
        command => {
            let format = cli
                .format
                .or_else(|| config.default_format.as_deref().and_then(output::OutputFormat::parse))
                .unwrap_or(output::OutputFormat::Table);
            let api_url = cli.api_url.or(config.api_url);
            let agency = cli.agency.or(config.agency);
            match config::Config::load_client(cli.profile.as_deref()) {
                Ok(client) => {
                    let ctx = commands::Context::new(client, api_url, agency, format);
                    dispatch(command, &ctx).await
                }
                Err(e) => Err(e),
            }
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, ctx: &commands::Context) -> Result<(), String> {
    match command {
        Commands::Agency { action } => commands::agency::handle(action, ctx).await,
        Commands::Jobs { action } => commands::jobs::handle(action, ctx).await,
        Commands::Form { action } => commands::form::handle(action, ctx).await,
        Commands::Apply { job, values, files, signature } => {
            commands::apply::handle(commands::apply::ApplyArgs { job, values, files, signature }, ctx).await
        }
        Commands::Applications { action } => commands::applications::handle(action, ctx).await,
        Commands::Config { .. } => Ok(()),
    }
}
