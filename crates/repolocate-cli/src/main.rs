//! Repolocate - find the local checkout of a repository
//!
//! Usage:
//!   repolocate resolve git@github.com:org/repo.git
//!   repolocate normalize https://github.com/Org/Repo.git
//!   repolocate cache list

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use repolocate_core::identifier::normalize;
use repolocate_core::resolver::{Resolution, ResolutionSource, Resolver};

#[derive(Parser)]
#[command(name = "repolocate")]
#[command(about = "Resolve repository references to local checkouts", long_about = None)]
struct Cli {
    /// Config file (default: <config dir>/repolocate/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Cache file (default: <state dir>/repolocate/cache.json)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a repository reference to a local path
    Resolve {
        /// SSH, HTTPS or bare host/owner/repo reference
        reference: String,
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Print the canonical identifier for a reference
    Normalize { reference: String },

    /// Inspect or edit the path cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// List cached repositories
    List {
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
    /// Remove one repository from the cache
    #[command(alias = "rm")]
    Forget { reference: String },
    /// Remove every cached repository
    Clear,
}

#[derive(Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    /// Human-readable output
    #[default]
    Table,
    /// Machine-readable JSON
    Json,
    /// Path only
    Plain,
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "repolocate=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize { reference } => match normalize(&reference) {
            Some(id) => {
                println!("{}", id);
                Ok(ExitCode::SUCCESS)
            }
            None => {
                eprintln!("Not a repository reference: {:?}", reference);
                Ok(ExitCode::FAILURE)
            }
        },
        Commands::Resolve { reference, format } => {
            let resolver = open_resolver(cli.config.as_deref(), cli.cache)?;
            match resolver.locate(&reference)? {
                Some(resolution) => {
                    print_resolution(&resolution, format)?;
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("Repository not found: {}", reference);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        Commands::Cache { command } => {
            let resolver = open_resolver(cli.config.as_deref(), cli.cache)?;
            run_cache(&resolver, command)
        }
    }
}

fn open_resolver(config: Option<&Path>, cache: Option<PathBuf>) -> Result<Resolver> {
    let resolver = Resolver::from_paths(config, cache)?;
    let settings = resolver.config();
    tracing::debug!(
        config = ?config,
        cache = %resolver.cache().cache_path().display(),
        search_paths = ?settings.search_paths,
        max_depth = settings.max_depth,
        "opened resolver"
    );
    Ok(resolver)
}

fn print_resolution(resolution: &Resolution, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(resolution)?),
        OutputFormat::Plain => println!("{}", resolution.path.display()),
        OutputFormat::Table => {
            let source = match resolution.source {
                ResolutionSource::Cache => "cache",
                ResolutionSource::Scan => "scan",
            };
            println!("{}", resolution.path.display());
            println!("  id:     {}", resolution.id);
            println!("  source: {}", source);
        }
    }
    Ok(())
}

fn run_cache(resolver: &Resolver, command: CacheCommands) -> Result<ExitCode> {
    let cache = resolver.cache();
    match command {
        CacheCommands::List { format } => {
            let entries = cache.entries();
            match format {
                OutputFormat::Json => {
                    let map: serde_json::Map<String, serde_json::Value> = entries
                        .into_iter()
                        .map(|(id, entry)| Ok((id.to_string(), serde_json::to_value(entry)?)))
                        .collect::<Result<_>>()?;
                    println!("{}", serde_json::to_string_pretty(&map)?);
                }
                OutputFormat::Plain => {
                    for (_, entry) in entries {
                        println!("{}", entry.path.display());
                    }
                }
                OutputFormat::Table => {
                    if entries.is_empty() {
                        println!("Cache is empty ({})", cache.cache_path().display());
                    }
                    for (id, entry) in entries {
                        println!(
                            "{}\n  path:      {}\n  last used: {}",
                            id,
                            entry.path.display(),
                            entry.last_used.to_rfc3339()
                        );
                    }
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        CacheCommands::Forget { reference } => {
            let Some(id) = normalize(&reference) else {
                eprintln!("Not a repository reference: {:?}", reference);
                return Ok(ExitCode::FAILURE);
            };
            if cache.evict(&id)? {
                println!("Forgot {}", id);
            } else {
                println!("{} was not cached", id);
            }
            Ok(ExitCode::SUCCESS)
        }
        CacheCommands::Clear => {
            cache.clear()?;
            println!("Cleared {}", cache.cache_path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
