//! pagecache
//!
//! Reports, warms and evicts kernel page cache residency for a file or a
//! directory tree.
//!
//! Supports:
//! - stats: report resident pages
//! - touch: fault every page into the cache
//! - evict: advise the kernel to drop cached pages

use anyhow::{Context, Result};
use clap::{ArgGroup, CommandFactory, Parser};
use std::path::Path;
use tracing_subscriber::EnvFilter;

use pagecache::{Aggregate, EvictionPrimitive, Operation, PageCache, Platform};

/// Command line configuration.
#[derive(Parser, Debug, Clone)]
#[command(name = "pagecache")]
#[command(about = "Manage your page cache: view, warm or evict file pages")]
#[command(group(ArgGroup::new("operation").args(["stats", "touch", "evict"])))]
pub struct Config {
    /// View page cache statistics for the specified file or directory
    #[arg(short, long, value_name = "PATH")]
    pub stats: Option<String>,

    /// Warm the page cache by touching all files in the specified path
    #[arg(short = 'w', long, short_alias = 't', value_name = "PATH")]
    pub touch: Option<String>,

    /// Evict file pages from the page cache for the specified path
    #[arg(short, long, value_name = "PATH")]
    pub evict: Option<String>,

    /// Eviction primitive to use instead of the detected one
    /// (byte-range-advisory, invalidate-sync)
    #[arg(long, value_name = "PRIMITIVE")]
    pub evict_with: Option<String>,

    /// Print detailed stats after every operation
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    fn operation(&self) -> Option<(Operation, &str)> {
        if let Some(path) = &self.stats {
            Some((Operation::Stats, path))
        } else if let Some(path) = &self.touch {
            Some((Operation::Touch, path))
        } else {
            self.evict.as_deref().map(|path| (Operation::Evict, path))
        }
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn print_report(aggregate: &Aggregate, path: &str) {
    match &aggregate.stats {
        Some(stats) => println!("{}", stats),
        None => println!("Page cache stats: nothing to report for {}", path),
    }
}

fn print_details(aggregate: &Aggregate, platform: &Platform) {
    if let Some(stats) = &aggregate.stats {
        println!("  File size: {}", format_bytes(stats.file_size()));
    }
    println!("  Page size: {}", format_bytes(platform.page_size() as u64));
    println!("  Files: {} ({} skipped)", aggregate.files, aggregate.skipped);
    println!("  Eviction primitive: {}", platform.eviction());
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let config = Config::parse();
    init_logging(config.verbose);

    let Some((operation, path)) = config.operation() else {
        Config::command().print_help()?;
        println!();
        return Ok(());
    };

    let platform = match &config.evict_with {
        Some(name) => Platform::with_eviction(name.parse::<EvictionPrimitive>()?),
        None => Platform::detect(),
    }
    .context("Failed to resolve page cache primitives")?;

    let cache = PageCache::new(platform);
    let aggregate = cache
        .run_detailed(Path::new(path), operation)
        .with_context(|| format!("Failed to {} {}", operation, path))?;

    match operation {
        Operation::Stats => print_report(&aggregate, path),
        Operation::Touch => println!("Cache warmed for files in {}", path),
        Operation::Evict => println!("Cache evicted for files in {}", path),
    }

    if config.verbose {
        if operation != Operation::Stats {
            print_report(&aggregate, path);
        }
        print_details(&aggregate, cache.platform());
    }

    Ok(())
}
