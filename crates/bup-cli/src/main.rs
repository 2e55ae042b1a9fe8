//! bup - report and track campus facilities issues from the terminal

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bup")]
#[command(about = "Campus facilities issue reporter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List reported issues
    List {
        /// Filter by status (pending-review, scheduled, in-progress, completed, rejected)
        #[arg(short, long)]
        status: Option<String>,

        /// Filter by category
        #[arg(short, long)]
        category: Option<String>,

        /// Filter by priority (low, medium, high, urgent)
        #[arg(short, long)]
        priority: Option<String>,

        /// Search description, category and location
        #[arg(short, long)]
        query: Option<String>,

        /// Only issues that are not completed or rejected
        #[arg(long)]
        open: bool,
    },

    /// Show one issue
    Show {
        /// Issue ID
        id: String,
    },

    /// Report a new issue
    Submit {
        /// Facility category (electrical, plumbing, ...)
        #[arg(short, long)]
        category: String,

        /// Priority (low, medium, high, urgent)
        #[arg(short, long, default_value = "medium")]
        priority: String,

        #[arg(long)]
        building: Option<String>,

        #[arg(long)]
        floor: Option<String>,

        #[arg(long)]
        room: Option<String>,

        /// What is wrong
        #[arg(short, long)]
        description: Option<String>,

        /// Image to attach (repeatable)
        #[arg(short, long = "image")]
        images: Vec<std::path::PathBuf>,
    },

    /// Show issues assigned to you (technicians)
    Assigned,

    /// Dashboard counters and report series
    Stats,

    /// Email verification
    Otp {
        #[command(subcommand)]
        command: OtpCommands,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Show or set the theme preference
    Theme {
        #[command(subcommand)]
        command: Option<ThemeCommands>,
    },

    /// Ask the facilities assistant
    Chat {
        /// Message to send
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
    },

    /// Show or create configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum OtpCommands {
    /// Verify an emailed code and log in
    Verify {
        email: String,
        /// Six-digit code
        code: String,
    },
    /// Send a new code
    Resend { email: String },
}

#[derive(Subcommand)]
enum ThemeCommands {
    /// Show the stored preference and the resolved mode
    Show,
    /// Store a preference (light, dark, system)
    Set { preference: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file location
    Path,
    /// Write a commented default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.json;

    match cli.command {
        Commands::List {
            status,
            category,
            priority,
            query,
            open,
        } => {
            let filter = commands::build_filter(status, category, priority, query)?;
            commands::list(&commands::Client::open()?, filter, open, json).await
        }
        Commands::Show { id } => commands::show(&commands::Client::open()?, &id, json).await,
        Commands::Submit {
            category,
            priority,
            building,
            floor,
            room,
            description,
            images,
        } => {
            let draft = commands::build_draft(
                category,
                &priority,
                building,
                floor,
                room,
                description,
                &images,
            )?;
            commands::submit(&commands::Client::open()?, draft, json).await
        }
        Commands::Assigned => commands::assigned(&commands::Client::open()?, json).await,
        Commands::Stats => commands::stats(&commands::Client::open()?, json).await,
        Commands::Otp { command } => {
            let client = commands::Client::open()?;
            match command {
                OtpCommands::Verify { email, code } => {
                    commands::otp_verify(&client, &email, &code, json).await
                }
                OtpCommands::Resend { email } => commands::otp_resend(&client, &email).await,
            }
        }
        Commands::Logout => commands::logout(&commands::Client::open()?),
        Commands::Whoami => commands::whoami(&commands::Client::open()?, json),
        Commands::Theme { command } => {
            let storage = commands::open_storage()?;
            match command {
                Some(ThemeCommands::Show) | None => commands::theme_show(storage, json),
                Some(ThemeCommands::Set { preference }) => {
                    commands::theme_set(storage, &preference, json)
                }
            }
        }
        Commands::Chat { message } => {
            commands::chat(&commands::Client::open()?, &message.join(" "), json).await
        }
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(json),
            Some(ConfigCommands::Path) => commands::config_path(),
            Some(ConfigCommands::Init { force }) => commands::config_init(force),
        },
    }
}
