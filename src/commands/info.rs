//! # Info Command Implementation
//!
//! This module implements the `info` subcommand, which resolves a single
//! asset and reports what an HTTP layer would need to serve it: its
//! dependencies, its last-modified time and its ETag.
//!
//! This command may write the asset's cache file but never modifies sources.

use anyhow::Result;
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use asset_cache::asset::Asset;

use super::SourceArgs;

/// Show dependencies, timestamps and ETag of an asset
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Script or stylesheet file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Execute the `info` command.
pub fn execute(args: InfoArgs) -> Result<()> {
    let factory = args.source.factory()?;
    let mut asset = factory
        .resolve(&args.file)
        .map_err(|e| anyhow::anyhow!("Failed to resolve {}: {}", args.file.display(), e))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info_json(&mut asset)?)?);
    } else {
        print_info(&mut asset)?;
    }
    Ok(())
}

fn info_json(asset: &mut Asset) -> Result<serde_json::Value> {
    let last_modified = unix_seconds(asset.last_modified()?);
    let dependencies: Vec<String> = asset
        .dependencies()?
        .iter()
        .map(|p| p.display().to_string())
        .collect();
    let missing: Vec<String> = asset
        .includes()?
        .iter()
        .filter(|(_, child)| child.is_none())
        .map(|(key, _)| key.to_string())
        .collect();

    Ok(json!({
        "path": asset.path().display().to_string(),
        "relative_path": asset.relative_path(),
        "kind": format!("{:?}", asset.kind()).to_lowercase(),
        "from_cache": asset.is_from_cache(),
        "cache_file": asset.cache_path().map(|p| p.display().to_string()),
        "last_modified": last_modified,
        "etag": asset.etag()?,
        "dependencies": dependencies,
        "missing_includes": missing,
    }))
}

fn print_info(asset: &mut Asset) -> Result<()> {
    println!("📦 {}", asset.relative_path());
    println!("  Path: {}", asset.path().display());
    println!("  Kind: {:?}", asset.kind());
    println!("  From cache: {}", if asset.is_from_cache() { "yes" } else { "no" });
    match asset.cache_path() {
        Some(path) => println!("  Cache file: {}", path.display()),
        None => println!("  Cache file: (disabled)"),
    }
    println!("  Last modified: {}", unix_seconds(asset.last_modified()?));
    println!("  ETag: \"{}\"", asset.etag()?);

    let dependencies = asset.dependencies()?;
    println!("\n🔗 Dependencies ({}):", dependencies.len());
    for dependency in &dependencies {
        println!("  {}", dependency.display());
    }

    let missing: Vec<String> = asset
        .includes()?
        .iter()
        .filter(|(_, child)| child.is_none())
        .map(|(key, _)| key.to_string())
        .collect();
    if !missing.is_empty() {
        println!("\n⚠️  Missing includes ({}):", missing.len());
        for key in missing {
            println!("  {}", key);
        }
    }
    Ok(())
}

fn unix_seconds(time: std::time::SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}
