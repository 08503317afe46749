//! somix2mse CLI entry point.

use std::io::{self, IsTerminal, Write as _};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use somix2mse::config;
use somix2mse::pipeline;

/// Extract a SOMIX structural model (Grouping/Code/Data, ParentChild/Call/Access)
/// from a Python source tree and write it as an `.mse` file.
#[derive(Parser)]
#[command(name = "somix2mse")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Root directory of the Python source tree to analyze.
    #[arg(long)]
    base_path: Option<PathBuf>,

    /// Directory the `.mse` output file is written into (default: current directory).
    #[arg(long)]
    output_path: Option<PathBuf>,

    /// Optional key=value config file; CLI flags override its settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let file_config = match &cli.config {
        Some(path) => match config::load(path) {
            Ok(cfg) => cfg,
            Err(err) => {
                eprintln!("error: {err}");
                return ExitCode::from(1);
            }
        },
        None => config::Config::default(),
    };

    let base_path = match cli.base_path.or(file_config.base_path) {
        Some(path) => path,
        None => match prompt_for_base_path() {
            Some(path) => path,
            None => {
                eprintln!("error: no base path provided");
                return ExitCode::from(1);
            }
        },
    };

    let output_path = cli
        .output_path
        .or(file_config.output_path)
        .unwrap_or_else(|| PathBuf::from("."));

    if !base_path.is_dir() {
        eprintln!(
            "error: base path is not a readable directory: {}",
            base_path.display()
        );
        return ExitCode::from(1);
    }

    match pipeline::run(&base_path, &output_path) {
        Ok(report) => {
            println!(
                "wrote {} ({} groupings, {} code entities, {} data entities, {} iterations{}{})",
                report.output_path.display(),
                report.groupings,
                report.codes,
                report.datas,
                report.iterations,
                if report.converged { "" } else { " (iteration ceiling reached)" },
                if report.files_skipped > 0 {
                    format!(", {} files skipped", report.files_skipped)
                } else {
                    String::new()
                }
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(1)
        }
    }
}

/// Interactively ask for a base path when neither `--base-path` nor a
/// config file supplied one and stdin is a terminal; otherwise give up.
fn prompt_for_base_path() -> Option<PathBuf> {
    if !io::stdin().is_terminal() {
        return None;
    }
    print!("Base path to analyze: ");
    io::stdout().flush().ok()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line).ok()?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(PathBuf::from(trimmed))
    }
}
