//! # Tree Command Implementation
//!
//! This module implements the `tree` subcommand, which displays the include
//! tree of an asset in a hierarchical format.
//!
//! Includes appear in the order they are written; a file included from two
//! places appears under both. Includes whose target does not exist are
//! marked `(not found)`.

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};
use std::path::PathBuf;

use asset_cache::asset::IncludeNode;
use asset_cache::factory::AssetFactory;

use super::SourceArgs;

/// Display the include tree of an asset
#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Script or stylesheet file to inspect
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Maximum depth to display in the tree.
    ///
    /// If not specified, displays the full tree.
    /// Use 0 to show only the asset itself, 1 to show its direct includes, etc.
    #[arg(long, value_name = "NUM")]
    pub depth: Option<usize>,

    #[command(flatten)]
    pub source: SourceArgs,
}

/// Execute the `tree` command.
///
/// The include tree is only known after a full resolution, so this command
/// bypasses cache files.
pub fn execute(args: TreeArgs) -> Result<()> {
    let mut settings = args.source.settings()?;
    settings.temp_dir = None;
    let factory = AssetFactory::new(settings)?;
    let mut asset = factory
        .create(&args.file)
        .map_err(|e| anyhow::anyhow!("Failed to load {}: {}", args.file.display(), e))?;

    let include_tree = asset
        .include_tree()
        .map_err(|e| anyhow::anyhow!("Failed to resolve includes: {}", e))?;

    let tree_root = build_tree_node(&include_tree, args.depth.unwrap_or(usize::MAX), 0);
    print_tree(&tree_root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;

    Ok(())
}

/// Build a display node from an include node
fn build_tree_node(node: &IncludeNode, max_depth: usize, current_depth: usize) -> TreeNode {
    let label = if node.missing {
        format!("{} (not found)", node.relative_path)
    } else {
        node.relative_path.clone()
    };

    let children = if current_depth >= max_depth {
        Vec::new()
    } else {
        node.children
            .iter()
            .map(|child| build_tree_node(child, max_depth, current_depth + 1))
            .collect()
    };

    TreeNode { label, children }
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> std::borrow::Cow<'_, [Self::Child]> {
        std::borrow::Cow::Borrowed(&self.children)
    }
}
