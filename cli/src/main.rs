use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dayreport_core::SessionConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;
mod transport;
mod util;

use commands::chat::ChatArgs;
use commands::report::ReportCommands;
use commands::rooms::RoomCommands;
use commands::team::TeamCommands;
use transport::{DEFAULT_API_URL, HttpBackend};
use util::{SessionFileListener, config_path, exit_error, restore_session_store};

#[derive(Parser)]
#[command(
    name = "dayreport",
    version,
    about = "dayreport CLI: talk through your workday, then generate the daily report"
)]
struct Cli {
    /// API base URL
    #[arg(long, env = "DAYREPORT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Seconds to wait for an assistant reply (0 waits forever)
    #[arg(long, env = "DAYREPORT_TURN_TIMEOUT_SECS", default_value_t = 60)]
    turn_timeout_secs: u64,

    /// Seconds to wait for report generation (0 waits forever)
    #[arg(long, env = "DAYREPORT_REPORT_TIMEOUT_SECS", default_value_t = 120)]
    report_timeout_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with username and password
    Login {
        #[arg(long)]
        username: String,
        /// Password (prefer the env var over the flag)
        #[arg(long, env = "DAYREPORT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in identity
    Whoami,
    /// Conversation management
    Rooms {
        #[command(subcommand)]
        command: RoomCommands,
    },
    /// Chat with the assistant in a conversation
    Chat(ChatArgs),
    /// Generate and read your reports
    Report {
        #[command(subcommand)]
        command: ReportCommands,
    },
    /// Team reports (leads and admins)
    Team {
        #[command(subcommand)]
        command: TeamCommands,
    },
}

fn timeout(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    // Structured JSON logs on stderr; stdout carries command output
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dayreport=warn,dayreport_core=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let session_file = config_path();
    let session = restore_session_store(&session_file, &cli.api_url);
    let mut backend = HttpBackend::new(&cli.api_url, session.clone())
        .unwrap_or_else(|e| {
            exit_error(&e.to_string(), Some("Check --api-url / DAYREPORT_API_URL."))
        });
    backend.subscribe(Arc::new(session.clone()));
    backend.subscribe(Arc::new(SessionFileListener { file: session_file }));

    let config = SessionConfig {
        turn_timeout: timeout(cli.turn_timeout_secs),
        report_timeout: timeout(cli.report_timeout_secs),
    };

    let result = match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&backend, &cli.api_url, &username, &password).await
        }
        Commands::Logout => commands::auth::logout(&backend),
        Commands::Whoami => commands::auth::whoami(&backend),
        Commands::Rooms { command } => commands::rooms::run(&backend, config, command).await,
        Commands::Chat(args) => commands::chat::run(&backend, config, args).await,
        Commands::Report { command } => commands::report::run(&backend, config, command).await,
        Commands::Team { command } => commands::team::run(&backend, command).await,
    };

    if let Err(e) = result {
        exit_error(&e.to_string(), None);
    }
}
