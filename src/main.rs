use clap::{Parser, Subcommand};
use safety_governor::config::Config;
use safety_governor::safety::{SafetyError, SafetyMonitor, TradingMode, emergency_stop};
use safety_governor::watchdog::Watchdog;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = "Operator control surface for the trading safety governor.")]
struct Cli {
    /// Path to the YAML config. A missing file means built-in defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prints the current safety status as JSON.
    Status,
    /// Starts the bot (STOPPED or PAUSED -> RUNNING).
    Start,
    /// Pauses the bot.
    Pause { reason: String },
    /// Resumes a paused bot.
    Resume,
    /// Changes the trading mode: HYBRID, AUTO or NO_TRADE.
    Mode { mode: TradingMode },
    /// Activates the kill switch and pauses the bot.
    Kill { reason: String },
    /// Deactivates the kill switch. Trading stays paused until resumed.
    Unkill,
    /// Records the realised profit (negative for a loss) of a closed trade.
    Record {
        #[arg(allow_negative_numbers = true)]
        profit: f64,
    },
    /// Checks a candidate trade against the current mode and limits.
    Validate { score: f64, size: f64 },
    /// Reports a runtime error; the bot is paused.
    Error { message: String },
    /// Polls the status until Ctrl+C.
    Watch,
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load_or_default(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(config.app.log_level.as_deref());

    let monitor = match SafetyMonitor::from_config(&config) {
        Ok(m) => Arc::new(m),
        Err(e) => {
            error!(error = %e, "Failed to create safety monitor");
            return ExitCode::FAILURE;
        }
    };

    info!(config = %cli.config, app = %config.app.name, env = %config.app.env, "Safety governor initialized");

    match run_command(cli.command, &config, monitor).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

/// Executes one operator command. `Ok(false)` means the request was refused.
async fn run_command(
    command: Commands,
    config: &Config,
    monitor: Arc<SafetyMonitor>,
) -> Result<bool, SafetyError> {
    match command {
        Commands::Status => {
            print_status(&monitor);
            Ok(true)
        }
        Commands::Start => monitor.start(),
        Commands::Pause { reason } => monitor.pause(&reason).map(|_| true),
        Commands::Resume => monitor.resume(),
        Commands::Mode { mode } => monitor.set_mode(mode).map(|_| true),
        Commands::Kill { reason } => emergency_stop(&monitor, &reason).map(|_| true),
        Commands::Unkill => {
            monitor.kill_switch().deactivate()?;
            warn!("Kill switch cleared by operator; resume to continue trading");
            Ok(true)
        }
        Commands::Record { profit } => monitor.record_trade_result(profit).map(|_| true),
        Commands::Validate { score, size } => {
            let gate = monitor.can_trade();
            let check = monitor.validate_trade(score, size);
            match (&gate, &check) {
                (Ok(()), Ok(())) => println!("ALLOWED"),
                _ => {
                    if let Err(reason) = &gate {
                        println!("BLOCKED: {}", reason);
                    }
                    if let Err(reason) = &check {
                        println!("REJECTED: {}", reason);
                    }
                }
            }
            Ok(gate.is_ok() && check.is_ok())
        }
        Commands::Error { message } => monitor.error(&message).map(|_| true),
        Commands::Watch => {
            let watchdog = Arc::new(Watchdog::new(monitor, config.watch_interval()));

            let stopper = Arc::clone(&watchdog);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    stopper.stop().await;
                }
            });

            info!("Watching safety status (press Ctrl+C to stop)...");
            match watchdog.start().await {
                Ok(()) => Ok(true),
                Err(e) => {
                    error!(error = %e, "Watchdog error");
                    Ok(false)
                }
            }
        }
    }
}

fn print_status(monitor: &SafetyMonitor) {
    let status = monitor.get_status();
    match serde_json::to_string_pretty(&status) {
        Ok(json) => println!("{}", json),
        Err(e) => error!(error = %e, "Failed to serialize status"),
    }
}
