use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use scheduling_engine::temporal::parse_timezone;
use scheduling_engine::{
    upcoming_within, Appointment, AppointmentForm, Decision, EngineConfig, Validator,
    UPCOMING_ALERT_MINUTES,
};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "schedcheck", version, about = "Validate appointment bookings")]
struct Cli {
    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Local timezone of the user (IANA name); overrides configuration
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate an appointment form against existing appointments.
    ///
    /// Exits 0 when accepted and 1 when rejected.
    Validate {
        /// Request file ({"form": ..., "existing": [...]}); stdin when omitted or "-"
        input: Option<PathBuf>,
    },
    /// List appointments starting soon
    Upcoming {
        /// Appointments file (JSON array); stdin when omitted or "-"
        input: Option<PathBuf>,

        /// Reference instant (RFC 3339); defaults to now
        #[arg(long)]
        now: Option<String>,

        /// How many minutes ahead to look
        #[arg(long, default_value_t = UPCOMING_ALERT_MINUTES)]
        minutes: i64,
    },
}

#[derive(Deserialize)]
struct ValidateRequest {
    form: AppointmentForm,
    #[serde(default)]
    existing: Vec<Appointment>,
}

#[derive(Serialize)]
struct ValidateResponse {
    #[serde(flatten)]
    decision: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    storage: Option<StorageBounds>,
}

#[derive(Serialize)]
struct StorageBounds {
    start: String,
    end: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match EngineConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::from(2);
        }
    };
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.logger.level))
        .with_writer(io::stderr)
        .init();

    match run(&cli, &config) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli, config: &EngineConfig) -> Result<bool> {
    match &cli.command {
        Command::Validate { input } => {
            let validator = match &cli.timezone {
                Some(name) => Validator::new(parse_timezone(name)?),
                None => Validator::from_config(config),
            };
            let request: ValidateRequest = serde_json::from_str(&read_input(input.as_deref())?)
                .context("Failed to parse validation request")?;

            let decision = validator.validate(&request.form, &request.existing);
            let storage = decision
                .storage_bounds()
                .map(|(start, end)| StorageBounds { start, end });
            let accepted = decision.is_accepted();
            print_json(&ValidateResponse { decision, storage }, cli.pretty)?;
            Ok(accepted)
        }
        Command::Upcoming {
            input,
            now,
            minutes,
        } => {
            let now: DateTime<Utc> = match now {
                Some(text) => DateTime::parse_from_rfc3339(text)
                    .with_context(|| format!("Invalid --now: '{text}'"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let appointments: Vec<Appointment> =
                serde_json::from_str(&read_input(input.as_deref())?)
                    .context("Failed to parse appointments")?;

            print_json(&upcoming_within(&appointments, now, *minutes), cli.pretty)?;
            Ok(true)
        }
    }
}

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => std::fs::read_to_string(p)
            .with_context(|| format!("Failed to read file: {}", p.display())),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let output = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{output}");
    Ok(())
}
