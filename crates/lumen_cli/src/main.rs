//! Lumen CLI
//!
//! Simulate and check scroll-driven page behaviors on a virtual clock.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod page;

use config::{PageConfig, CONFIG_FILE, STARTER};

#[derive(Parser)]
#[command(name = "lumen")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Scroll-driven page behavior simulator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the page script and print every write
    Simulate {
        /// Directory containing lumen.toml, or the file itself
        #[arg(default_value = ".")]
        path: String,

        /// Print one JSON object per write
        #[arg(long)]
        json: bool,
    },

    /// Check a page description for errors
    Check {
        /// Directory containing lumen.toml, or the file itself
        #[arg(default_value = ".")]
        path: String,
    },

    /// Write a starter lumen.toml in the current directory
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Simulate { path, json } => cmd_simulate(&path, json),
        Commands::Check { path } => cmd_check(&path),
        Commands::Init => cmd_init(),
    }
}

fn load(path: &str) -> Result<PageConfig> {
    let path = PathBuf::from(path);
    if path.is_file() {
        PageConfig::load(&path)
    } else {
        PageConfig::load_from_dir(&path)
    }
}

fn cmd_simulate(path: &str, json: bool) -> Result<()> {
    let config = load(path)?;
    info!(
        "Simulating {} sections for {}ms",
        config.sections.len(),
        config.script.run_ms
    );

    let writes = page::simulate(&config)?;
    for write in &writes {
        if json {
            println!(
                "{}",
                serde_json::to_string(write).context("Failed to serialize write")?
            );
        } else {
            println!("{:>7}ms  {:<20} {}", write.at_ms, write.element, write.text);
        }
    }

    info!("{} writes", writes.len());
    Ok(())
}

fn cmd_check(path: &str) -> Result<()> {
    let config = load(path)?;

    let problems = config.problems();
    if !problems.is_empty() {
        for problem in &problems {
            tracing::error!("{}", problem);
        }
        anyhow::bail!("{} problem(s) found", problems.len());
    }

    info!(
        "Page OK: {} sections, {} scroll steps, {} clicks",
        config.sections.len(),
        config.script.scroll.len(),
        config.script.clicks.len()
    );
    Ok(())
}

fn cmd_init() -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config_path = cwd.join(CONFIG_FILE);

    if config_path.exists() {
        anyhow::bail!("This directory already contains a {}", CONFIG_FILE);
    }

    fs::write(&config_path, STARTER)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    info!("Created {}", config_path.display());
    info!("Run `lumen simulate` to replay it");
    Ok(())
}
