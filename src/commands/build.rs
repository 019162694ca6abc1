//! # Build Command Implementation
//!
//! This module implements the `build` subcommand, which resolves one or more
//! assets and prints their content or writes it to an output directory.
//!
//! Assets are resolved in parallel. A failing asset is reported and does not
//! stop the others; the command fails at the end if any asset failed.

use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::{Component, Path, PathBuf};

use asset_cache::asset::Asset;

use super::SourceArgs;

/// Resolve assets and print or write their content
#[derive(Args, Debug)]
pub struct BuildArgs {
    /// Script or stylesheet files to resolve
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Write each result to this directory instead of stdout, keeping its
    /// path under the site root
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Execute the `build` command.
pub fn execute(args: BuildArgs) -> Result<()> {
    let factory = args.source.factory()?;
    let site_root = factory.context().site_root.clone();

    if let Some(output) = &args.output {
        fs::create_dir_all(output)
            .with_context(|| format!("Failed to create output directory {}", output.display()))?;
    }

    let results = factory.resolve_all(&args.files);
    let mut failed = 0;

    for (path, result) in args.files.iter().zip(results) {
        let outcome = result
            .map_err(anyhow::Error::from)
            .and_then(|asset| emit(asset, path, &site_root, args.output.as_deref()));
        if let Err(e) = outcome {
            failed += 1;
            eprintln!("❌ {}: {:#}", path.display(), e);
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} assets failed to build", failed, args.files.len());
    }
    Ok(())
}

/// Where `asset` lands under `dir`: its site-relative path, or just its file
/// name when it lives outside the site root.
fn output_path(asset: &Asset, site_root: &Path, dir: &Path) -> Result<PathBuf> {
    if let Ok(relative) = asset.path().strip_prefix(site_root) {
        let plain = relative.components().all(|c| matches!(c, Component::Normal(_)));
        if plain && relative.file_name().is_some() {
            return Ok(dir.join(relative));
        }
    }
    let name = asset
        .path()
        .file_name()
        .with_context(|| format!("{} has no file name", asset.path().display()))?;
    Ok(dir.join(name))
}

fn emit(mut asset: Asset, source: &Path, site_root: &Path, output: Option<&Path>) -> Result<()> {
    match output {
        Some(dir) => {
            let target = output_path(&asset, site_root, dir)?;
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let content = asset.content()?;
            fs::write(&target, content)
                .with_context(|| format!("Failed to write {}", target.display()))?;
            let origin = if asset.is_from_cache() { "cached" } else { "built" };
            println!("✅ {} -> {} ({})", source.display(), target.display(), origin);
        }
        None => println!("{}", asset.content()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source(site: &Path, cache: &Path) -> SourceArgs {
        SourceArgs {
            site_root: Some(site.to_path_buf()),
            temp_dir: Some(cache.to_path_buf()),
            ..SourceArgs::default()
        }
    }

    #[test]
    fn test_build_writes_output() {
        let site = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::write(site.path().join("main.js"), "/*# include: lib.js */\nmain();").unwrap();
        fs::write(site.path().join("lib.js"), "lib();").unwrap();

        let args = BuildArgs {
            files: vec![site.path().join("main.js")],
            output: Some(out.path().to_path_buf()),
            source: source(site.path(), cache.path()),
        };
        execute(args).unwrap();

        let written = fs::read_to_string(out.path().join("main.js")).unwrap();
        assert_eq!(written, "lib();\nmain();");
    }

    #[test]
    fn test_build_reports_failures() {
        let site = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        fs::write(site.path().join("ok.js"), "ok();").unwrap();

        let args = BuildArgs {
            files: vec![site.path().join("ok.js"), site.path().join("missing.js")],
            output: Some(site.path().join("out")),
            source: source(site.path(), cache.path()),
        };
        let err = execute(args).unwrap_err();
        assert!(err.to_string().contains("1 of 2 assets failed"));
        assert!(site.path().join("out/ok.js").exists());
    }

    #[test]
    fn test_build_keeps_site_layout() {
        let site = TempDir::new().unwrap();
        let cache = TempDir::new().unwrap();
        let out = TempDir::new().unwrap();
        fs::create_dir_all(site.path().join("a")).unwrap();
        fs::create_dir_all(site.path().join("b")).unwrap();
        fs::write(site.path().join("a/main.js"), "a();").unwrap();
        fs::write(site.path().join("b/main.js"), "b();").unwrap();

        let args = BuildArgs {
            files: vec![site.path().join("a/main.js"), site.path().join("b/main.js")],
            output: Some(out.path().to_path_buf()),
            source: source(site.path(), cache.path()),
        };
        execute(args).unwrap();

        assert_eq!(fs::read_to_string(out.path().join("a/main.js")).unwrap(), "a();");
        assert_eq!(fs::read_to_string(out.path().join("b/main.js")).unwrap(), "b();");
        assert!(!out.path().join("main.js").exists());
    }
}
