use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use exit_value::error::ValuationError;
use exit_value::valuation::{ValuationRequest, ValuationSnapshot};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_CONFIG: i32 = 4;
const EXIT_INPUT: i32 = 5;
const EXIT_IO: i32 = 6;

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compute valuation snapshots for one or more request files
    Value {
        /// Request files (YAML, or JSON with a .json extension)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Override the skepticism exponent for every request
        #[arg(long)]
        alpha: Option<f64>,

        /// Print snapshots as JSON instead of a report
        #[arg(long)]
        json: bool,

        /// Directory to save snapshots to (defaults to snapshot_dir from config)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Earlier snapshot to chain from and compare against
        #[arg(long)]
        previous: Option<PathBuf>,
    },
    /// Validate the configuration and report every problem found
    Check,
    /// Compare two saved snapshots of the same company
    Diff {
        previous: PathBuf,
        current: PathBuf,

        /// Print the delta as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a default config file
    Init {
        /// Overwrite an existing file without asking
        #[arg(long)]
        force: bool,
    },
}

#[derive(Parser, Debug)]
#[command(name = "exit-value")]
#[command(about = "Business exit valuation from readiness assessments", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to config file (defaults to ~/.config/exit-value/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();
}

fn exit_code(error: &ValuationError) -> i32 {
    match error {
        ValuationError::InvalidConfig(_) => EXIT_CONFIG,
        ValuationError::InvalidInput(_) => EXIT_INPUT,
    }
}

fn print_errors(header: &str, errors: &[String]) {
    eprintln!("{}", header);
    for error in errors {
        eprintln!("  - {}", error);
    }
}

fn load_config_or_exit(path: Option<PathBuf>) -> exit_value::config::Config {
    let config = match exit_value::config::load_config(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {:#}", e);
            std::process::exit(EXIT_CONFIG);
        }
    };
    if let Err(errors) = exit_value::config::validate(&config) {
        print_errors("Config errors:", &errors);
        std::process::exit(EXIT_CONFIG);
    }
    config
}

fn load_snapshot_or_exit(path: &Path) -> ValuationSnapshot {
    match exit_value::store::load_snapshot(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Snapshot error: {:#}", e);
            std::process::exit(EXIT_IO);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Failed to serialize output: {}", e);
            std::process::exit(EXIT_IO);
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let start_time = Instant::now();

    match cli.command {
        Commands::Value {
            inputs,
            alpha,
            json,
            out,
            previous,
        } => {
            let config = load_config_or_exit(cli.config);

            let previous = previous.map(|path| load_snapshot_or_exit(&path));

            let mut requests: Vec<(ValuationRequest, Option<ValuationSnapshot>)> = Vec::new();
            for path in &inputs {
                let mut request = match exit_value::store::load_request(path) {
                    Ok(r) => r,
                    Err(e) => {
                        eprintln!("Input error: {:#}", e);
                        std::process::exit(EXIT_INPUT);
                    }
                };
                if alpha.is_some() {
                    request.alpha = alpha;
                }
                // Only chain to a previous snapshot of the same company.
                let chained = previous
                    .as_ref()
                    .filter(|p| p.company_id == request.company_id)
                    .cloned();
                requests.push((request, chained));
            }
            tracing::debug!(requests = requests.len(), "loaded requests");

            let results = exit_value::valuation::compute_batch(&requests, &config.engine);

            let mut snapshots = Vec::new();
            let mut failure = EXIT_SUCCESS;
            for (path, result) in inputs.iter().zip(results) {
                match result {
                    Ok(snapshot) => snapshots.push(snapshot),
                    Err(e) => {
                        print_errors(&format!("{}:", path.display()), &e.messages());
                        if failure == EXIT_SUCCESS {
                            failure = exit_code(&e);
                        }
                    }
                }
            }

            if let Some(dir) = out.or(config.snapshot_dir) {
                for snapshot in &snapshots {
                    let path = dir.join(exit_value::store::snapshot_file_name(snapshot));
                    if let Err(e) = exit_value::store::save_snapshot(&path, snapshot) {
                        eprintln!("Failed to save snapshot: {:#}", e);
                        std::process::exit(EXIT_IO);
                    }
                    eprintln!("Saved {}", path.display());
                }
            }

            if json {
                if snapshots.len() == 1 {
                    print_json(&snapshots[0]);
                } else {
                    print_json(&snapshots);
                }
            } else {
                let use_colors = exit_value::output::should_use_colors();
                if snapshots.len() == 1 || cli.verbose {
                    let reports: Vec<String> = snapshots
                        .iter()
                        .map(|s| exit_value::output::format_snapshot(s, use_colors, cli.verbose))
                        .collect();
                    println!("{}", reports.join("\n\n"));
                } else {
                    println!(
                        "{}",
                        exit_value::output::format_summary_table(&snapshots, use_colors)
                    );
                }

                if let Some(prev) = &previous {
                    for snapshot in snapshots.iter().filter(|s| s.company_id == prev.company_id) {
                        println!();
                        println!(
                            "{}",
                            exit_value::output::format_delta(&snapshot.delta_from(prev), use_colors)
                        );
                    }
                }
            }

            tracing::debug!(
                computed = snapshots.len(),
                elapsed = ?start_time.elapsed(),
                "done"
            );
            std::process::exit(failure);
        }
        Commands::Check => {
            let config = load_config_or_exit(cli.config);
            println!(
                "Configuration OK ({} industries, alpha {})",
                config.engine.industries.len(),
                config.engine.alpha
            );
        }
        Commands::Diff {
            previous,
            current,
            json,
        } => {
            let previous = load_snapshot_or_exit(&previous);
            let current = load_snapshot_or_exit(&current);
            if previous.company_id != current.company_id {
                eprintln!(
                    "Snapshots belong to different companies: '{}' and '{}'",
                    previous.company_id, current.company_id
                );
                std::process::exit(EXIT_INPUT);
            }

            let delta = current.delta_from(&previous);
            if json {
                print_json(&delta);
            } else {
                let use_colors = exit_value::output::should_use_colors();
                println!("{}", exit_value::output::format_delta(&delta, use_colors));
            }
        }
        Commands::Init { force } => {
            let path = match cli.config {
                Some(p) => p,
                None => match exit_value::config::get_config_path() {
                    Ok(p) => p,
                    Err(e) => {
                        eprintln!("Config error: {:#}", e);
                        std::process::exit(EXIT_CONFIG);
                    }
                },
            };
            match exit_value::config::write_default_config(&path, force) {
                Ok(true) => println!("Config written to {}", path.display()),
                Ok(false) => println!("Aborted."),
                Err(e) => {
                    eprintln!("Failed to write config: {:#}", e);
                    std::process::exit(EXIT_IO);
                }
            }
        }
    }

    std::process::exit(EXIT_SUCCESS);
}
