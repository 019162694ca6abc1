//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which inspects and cleans
//! the directory holding resolved-asset cache files.
//!
//! ## Subcommands
//!
//! - **`list`**: Display every cache file with the asset it belongs to
//! - **`clean`**: Remove cache files, optionally only those older than a duration

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

use asset_cache::cache::{self, CacheEntry, CACHE_EXTENSION};
use asset_cache::directive::DirectiveParser;
use asset_cache::filesystem::{DiskFS, FileSystem};
use asset_cache::path::cache_file_name;

use super::SourceArgs;

/// Manage the asset cache directory
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List cache files
    List(ListArgs),
    /// Remove cache files
    Clean(CleanArgs),
}

/// Arguments for the cache list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the cache clean command
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Show what would be deleted without actually deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Only delete entries older than the specified duration
    ///
    /// Duration format: number followed by unit (s, m, h, d, w)
    /// Examples: "30d", "7d", "1h", "30m", "2w"
    #[arg(long, value_name = "DURATION")]
    pub older_than: Option<String>,
}

/// One cache file on disk
#[derive(Debug, Clone)]
struct CacheFile {
    path: PathBuf,
    asset: Option<String>,
    dependencies: usize,
    size: u64,
    last_modified: Option<SystemTime>,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs) -> Result<()> {
    let settings = args.source.settings()?;
    let Some(temp_dir) = settings.temp_dir else {
        println!("Caching is disabled; there is no cache directory.");
        return Ok(());
    };

    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&temp_dir, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&temp_dir, clean_args),
    }
}

/// Execute the `cache list` command.
fn execute_list(temp_dir: &Path, args: ListArgs) -> Result<()> {
    let files = scan_cache_directory(temp_dir)?;

    if args.json {
        let entries: Vec<serde_json::Value> = files
            .iter()
            .map(|f| {
                json!({
                    "file": f.path.display().to_string(),
                    "asset": f.asset,
                    "dependencies": f.dependencies,
                    "size": f.size,
                    "last_modified": f.last_modified
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map(|d| d.as_secs()),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if files.is_empty() {
        println!("No cache files found in: {}", temp_dir.display());
        return Ok(());
    }

    println!("Cache files in {}:\n", temp_dir.display());
    println!("{:<40} {:>6} {:>12}", "ASSET", "DEPS", "SIZE");
    println!("{}", "-".repeat(60));
    for file in &files {
        println!(
            "{:<40} {:>6} {:>12}",
            file.asset.as_deref().unwrap_or("(unknown)"),
            file.dependencies,
            format_size(file.size)
        );
    }
    let total: u64 = files.iter().map(|f| f.size).sum();
    println!("\nTotal: {} cache files ({})", files.len(), format_size(total));

    Ok(())
}

/// Execute the `cache clean` command.
fn execute_clean(temp_dir: &Path, args: CleanArgs) -> Result<()> {
    let threshold = args
        .older_than
        .as_deref()
        .map(|s| {
            parse_duration(s).with_context(|| {
                format!("Invalid duration format: '{}'. Expected format: number followed by unit (s, m, h, d, w)", s)
            })
        })
        .transpose()?;

    if threshold.is_none() && !args.dry_run {
        let removed = cache::clear(&DiskFS, temp_dir)?;
        println!("🗑️  Removed {} cache files from {}", removed, temp_dir.display());
        return Ok(());
    }

    let now = SystemTime::now();
    let doomed: Vec<CacheFile> = scan_cache_directory(temp_dir)?
        .into_iter()
        .filter(|f| match (threshold, f.last_modified) {
            (None, _) => true,
            (Some(threshold), Some(modified)) => now
                .duration_since(modified)
                .map(|age| age >= threshold)
                .unwrap_or(false),
            (Some(_), None) => true,
        })
        .collect();

    if doomed.is_empty() {
        println!("No cache files match the specified criteria.");
        return Ok(());
    }

    for file in &doomed {
        println!("  {}", file.path.display());
    }

    if args.dry_run {
        println!("\n🔎 Dry run mode - {} cache files would be removed.", doomed.len());
        return Ok(());
    }

    for file in &doomed {
        DiskFS.remove_file(&file.path)?;
    }
    println!("\n🗑️  Removed {} cache files.", doomed.len());
    Ok(())
}

/// Parse a duration string into a Duration
///
/// Format: number followed by unit (s, m, h, d, w)
fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_str = duration_str.trim().to_lowercase();
    let split_idx = duration_str
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(duration_str.len());

    if split_idx == 0 {
        anyhow::bail!("Duration must start with a number");
    }

    let (number_str, unit_str) = duration_str.split_at(split_idx);
    let number: f64 = number_str
        .parse()
        .with_context(|| format!("Invalid number in duration: '{}'", number_str))?;

    let seconds = match unit_str {
        "s" => number,
        "m" => number * 60.0,
        "h" => number * 3600.0,
        "d" => number * 86400.0,
        "w" => number * 604800.0,
        _ => anyhow::bail!("Invalid duration unit: '{}'. Valid units: s, m, h, d, w", unit_str),
    };

    Ok(Duration::from_secs(seconds as u64))
}

/// Collect every cache file in `temp_dir` along with its header summary
fn scan_cache_directory(temp_dir: &Path) -> Result<Vec<CacheFile>> {
    if !temp_dir.exists() {
        return Ok(Vec::new());
    }

    let parser = DirectiveParser::new()?;
    let mut files = Vec::new();

    for entry in WalkDir::new(temp_dir).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().is_none_or(|e| e != CACHE_EXTENSION) {
            continue;
        }

        let metadata = entry.metadata()?;
        let (asset, dependencies) = match std::fs::read_to_string(path) {
            Ok(text) => {
                let header = CacheEntry::parse(&parser, &text);
                let name = entry.file_name().to_string_lossy();
                let asset = header
                    .references
                    .iter()
                    .find(|r| cache_file_name(&r.absolute) == name)
                    .or_else(|| header.references.last())
                    .map(|r| r.relative.clone());
                (asset, header.references.len())
            }
            Err(_) => (None, 0),
        };

        files.push(CacheFile {
            path: path.to_path_buf(),
            asset,
            dependencies,
            size: metadata.len(),
            last_modified: metadata.modified().ok(),
        });
    }

    Ok(files)
}

/// Format size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
