use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use fxbot::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Start the Telegram bot (reads the token from BOT_TOKEN)
    Run,
    /// Convert an amount once using the provider chain
    Convert {
        amount: String,
        from: String,
        to: String,
    },
    /// Query every provider and show what each one returns
    Probe {
        amount: String,
        from: String,
        to: String,
    },
}

impl From<Commands> for fxbot::AppCommand {
    fn from(cmd: Commands) -> fxbot::AppCommand {
        match cmd {
            Commands::Run => fxbot::AppCommand::Run,
            Commands::Convert { amount, from, to } => {
                fxbot::AppCommand::Convert { amount, from, to }
            }
            Commands::Probe { amount, from, to } => fxbot::AppCommand::Probe { amount, from, to },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => fxbot::cli::setup::setup(),
        Some(cmd) => fxbot::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
