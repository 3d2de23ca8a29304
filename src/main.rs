use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};

use slot_booker::config::Config;
use slot_booker::logging::init_logging;
use slot_booker::steps::{StepDefinition, load_steps};
use slot_booker::{GatewayClient, RunResult, StepExecutor, run_booking, session_name};

/// Slot Booker - book appointment slots through a chat bot
#[derive(Parser, Debug)]
#[command(
    name = "slot-booker",
    about = "Drives a chat bot through a scripted booking scenario and reports the result",
    after_help = "ENVIRONMENT VARIABLES (also read from .env):\n\
        API_ID, API_HASH       Chat API credentials\n\
        PHONE_NUMBER           Account phone number (+digits)\n\
        TG_PASSWORD            Two-factor password\n\
        TARGET_BOT             Username of the bot to drive\n\
        STEP_DELAY             Seconds between steps (default 1)\n\
        MAX_ATTEMPTS           Scenario attempts (default 1)\n\
        RESTART_DELAY          Seconds between attempts (default 1200)\n\
        STEPS_FILE             Scenario YAML (default steps.yaml)\n\
        GATEWAY_URL            Session gateway base URL\n\
        RUST_LOG / LOG_LEVEL   Log filter; LOG_FORMAT=json for JSON logs"
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the booking scenario (default)
    Run {
        /// Scenario file (overrides STEPS_FILE)
        #[arg(short, long)]
        steps: Option<PathBuf>,

        /// Print the run result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a scenario without connecting
    Validate {
        /// Scenario file (default: STEPS_FILE or steps.yaml)
        #[arg(short, long, env = "STEPS_FILE", default_value = "steps.yaml")]
        steps: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    init_logging();

    let args = Args::parse();
    let outcome = match args.command.unwrap_or(Commands::Run { steps: None, json: false }) {
        Commands::Run { steps, json } => {
            tokio::select! {
                result = run(steps, json) => result,
                _ = tokio::signal::ctrl_c() => {
                    info!("interrupted by user");
                    Ok(false)
                }
            }
        }
        Commands::Validate { steps } => validate(&steps),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(steps: Option<PathBuf>, json: bool) -> anyhow::Result<bool> {
    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(path) = steps {
        config.steps_file = path;
    }

    let client = GatewayClient::new(&config.gateway, session_name(&config.account.phone_number))
        .context("cannot build gateway client")?;
    let executor = StepExecutor::new(config.executor);

    let result = run_booking(&config, Arc::new(client), &executor).await?;
    report(&result, json)?;

    info!(
        success = result.success,
        attempts = result.attempts,
        "run finished {}",
        if result.success { "successfully" } else { "with errors" }
    );
    Ok(result.success)
}

fn report(result: &RunResult, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    if result.success {
        println!("Booked after {} attempt(s)", result.attempts);
        for (key, value) in result.booking.iter() {
            println!("  {key}: {value}");
        }
        if !result.notified {
            println!("  (confirmation message could not be delivered)");
        }
    } else {
        println!("Booking failed after {} attempt(s)", result.attempts);
        if let Some(err) = &result.error {
            println!("  Last failure: {err}");
        }
    }
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<bool> {
    let steps = load_steps(path)?;
    println!("{}: {} step(s)", path.display(), steps.len());
    for (i, step) in steps.iter().enumerate() {
        let kind = match step {
            StepDefinition::Command { .. } => "command",
            StepDefinition::Click { .. } => "click",
        };
        println!("  {}. [{}] {}", i + 1, kind, step.label());
    }
    Ok(true)
}
