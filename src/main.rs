mod camera;
mod catalog;
mod orbit;
mod web;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::process::ExitCode;

use crate::catalog::{Catalog, LoadReport};
use crate::orbit::parsing::parse_multi_tle;
use crate::orbit::{OrbitalElementSet, TrackedSatellite, TRACK_MINUTES};
use crate::web::config::MAX_TRACK_MINUTES;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "groundtrack")]
#[command(about = "Satellite ground tracks for the ground station console")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the ground track of every element set in a file as JSON
    Track {
        file: String,
        /// First sample instant (RFC 3339), defaults to now
        #[arg(long, value_parser = parse_instant)]
        at: Option<DateTime<Utc>>,
        /// Track length in minutes
        #[arg(long, default_value_t = TRACK_MINUTES)]
        minutes: u32,
    },
    /// Validate every element set in a file
    Check { file: String },
    /// Run the HTTP server
    Serve {
        #[arg(long, default_value = "config.yaml")]
        config: String,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Track { file, at, minutes } => track(&file, at, minutes),
        Commands::Check { file } => check(&file),
        Commands::Serve { config } => serve(&config),
    }
}

fn parse_instant(s: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| e.to_string())
}

fn read_file(path: &str) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(c) => Some(c),
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            None
        }
    }
}

fn track(path: &str, at: Option<DateTime<Utc>>, minutes: u32) -> ExitCode {
    if minutes == 0 || minutes > MAX_TRACK_MINUTES {
        eprintln!("--minutes must be between 1 and {}", MAX_TRACK_MINUTES);
        return ExitCode::FAILURE;
    }
    let Some(content) = read_file(path) else {
        return ExitCode::FAILURE;
    };
    let reference = at.unwrap_or_else(Utc::now);

    let mut tracks = Vec::new();
    for tle in parse_multi_tle(&content) {
        let tle = match tle {
            Ok(tle) => tle,
            Err(incomplete) => {
                eprintln!(
                    "Rejected {}: {}",
                    incomplete.name.as_deref().unwrap_or("(unnamed)"),
                    incomplete
                );
                continue;
            }
        };
        let label = tle.name.clone().unwrap_or_else(|| "(unnamed)".to_string());
        let result = OrbitalElementSet::from_tle(&tle)
            .and_then(|elements| TrackedSatellite::generate(&elements, reference, minutes));
        match result {
            Ok(tracked) => tracks.push(tracked),
            Err(e) => eprintln!("Rejected {}: {}", label, e),
        }
    }

    if tracks.is_empty() {
        eprintln!("No usable element sets in {}", path);
        return ExitCode::FAILURE;
    }

    match serde_json::to_string_pretty(&tracks) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Serialization error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check(path: &str) -> ExitCode {
    let Some(content) = read_file(path) else {
        return ExitCode::FAILURE;
    };

    let mut catalog = Catalog::in_memory();
    let report = catalog.ingest(path, &content);

    println!(
        "{} element sets valid, {} distinct satellites",
        report.loaded,
        catalog.len()
    );
    for entry in catalog.satellites() {
        let info = &entry.info;
        println!(
            "  {:>6}  {:<9} {:<24} epoch {}  period {:.1} min{}",
            info.norad_id,
            entry.elements.international_designator.as_deref().unwrap_or("-"),
            info.name,
            info.epoch.format("%Y-%m-%dT%H:%M:%SZ"),
            info.period_minutes,
            if entry.elements.is_deep_space() {
                "  (deep space)"
            } else {
                ""
            }
        );
    }

    if file_is_clean(&report) {
        return ExitCode::SUCCESS;
    }
    for rejected in &report.rejected {
        eprintln!(
            "Rejected {}: {}",
            rejected.name.as_deref().unwrap_or("(unnamed)"),
            rejected.reason
        );
    }
    if report.loaded == 0 && report.rejected.is_empty() {
        eprintln!("No element sets found in {}", path);
    }
    ExitCode::FAILURE
}

/// Every set in the file loaded, and there was at least one.
fn file_is_clean(report: &LoadReport) -> bool {
    report.rejected.is_empty() && report.loaded > 0
}

fn serve(path: &str) -> ExitCode {
    let config = match Config::from_file(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(web::run_server(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}
