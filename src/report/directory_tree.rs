// SPDX-License-Identifier: MPL-2.0
//! Chapter listing one or more directory trees.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::chapter::Chapter;
use super::html;
use super::reporter::Reporter;
use super::ReporterError;
use crate::config;

/// A node of a scanned directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File(String),
    SymbolicLink(String),
    Directory(String, Vec<TreeNode>),
}

impl TreeNode {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::File(name) | Self::SymbolicLink(name) | Self::Directory(name, _) => name,
        }
    }
}

/// Limits and toggles of a directory walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeOptions {
    /// Nodes at this depth or deeper are left out. The root is depth 0.
    pub max_depth: usize,
    /// Children listed per directory before a "N more file(s)" node.
    pub max_length: usize,
    pub include_hidden: bool,
    pub include_symlinks: bool,
}

impl Default for TreeOptions {
    fn default() -> Self {
        Self {
            max_depth: config::DEFAULT_DIRECTORY_TREE_DEPTH,
            max_length: config::DEFAULT_DIRECTORY_TREE_LENGTH,
            include_hidden: false,
            include_symlinks: false,
        }
    }
}

/// Walks `root` into a tree. Children are sorted by name.
pub fn scan_tree(root: &Path, options: TreeOptions) -> io::Result<TreeNode> {
    let name = root
        .file_name()
        .map_or_else(|| root.display().to_string(), |name| name.to_string_lossy().into_owned());
    scan_node(root, name, 0, options)?
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "root excluded by max depth"))
}

fn scan_node(
    path: &Path,
    name: String,
    depth: usize,
    options: TreeOptions,
) -> io::Result<Option<TreeNode>> {
    if depth >= options.max_depth {
        return Ok(None);
    }

    let file_type = fs::symlink_metadata(path)?.file_type();
    if file_type.is_symlink() {
        return Ok(options
            .include_symlinks
            .then(|| TreeNode::SymbolicLink(name)));
    }
    if !file_type.is_dir() {
        return Ok(Some(TreeNode::File(name)));
    }

    let mut entries: Vec<(String, PathBuf)> = fs::read_dir(path)?
        .filter_map(Result::ok)
        .map(|entry| (entry.file_name().to_string_lossy().into_owned(), entry.path()))
        .filter(|(name, _)| options.include_hidden || !name.starts_with('.'))
        .collect();
    entries.sort();

    let total = entries.len();
    let mut children = Vec::new();
    for (child_name, child_path) in entries.into_iter().take(options.max_length) {
        match scan_node(&child_path, child_name, depth + 1, options) {
            Ok(Some(node)) => children.push(node),
            Ok(None) => {}
            Err(err) => tracing::debug!(path = ?child_path, %err, "Skipping unreadable entry"),
        }
    }
    if total > options.max_length {
        children.push(TreeNode::File(format!(
            "{} more file(s)",
            total - options.max_length
        )));
    }

    Ok(Some(TreeNode::Directory(name, children)))
}

/// Renders a tree as indented text, like the `tree` command.
#[must_use]
pub fn render_tree(node: &TreeNode) -> String {
    let mut output = format!("{}\n", display_name(node));
    if let TreeNode::Directory(_, children) = node {
        render_children(children, "", &mut output);
    }
    output
}

fn render_children(children: &[TreeNode], indent: &str, output: &mut String) {
    for (index, child) in children.iter().enumerate() {
        let last = index + 1 == children.len();
        let (branch, extension) = if last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        output.push_str(indent);
        output.push_str(branch);
        output.push_str(&display_name(child));
        output.push('\n');
        if let TreeNode::Directory(_, grandchildren) = child {
            render_children(grandchildren, &format!("{indent}{extension}"), output);
        }
    }
}

fn display_name(node: &TreeNode) -> String {
    match node {
        TreeNode::Directory(name, _) => format!("{name}/"),
        TreeNode::SymbolicLink(name) => format!("{name}@"),
        TreeNode::File(name) => name.clone(),
    }
}

/// Lists the contents of one or more directories.
#[derive(Debug, Clone)]
pub struct DirectoryTreeReporter {
    title: String,
    roots: Vec<PathBuf>,
    options: TreeOptions,
}

impl DirectoryTreeReporter {
    #[must_use]
    pub fn new(roots: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            title: "Directory trees".to_string(),
            roots: roots.into_iter().map(Into::into).collect(),
            options: TreeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: TreeOptions) -> Self {
        self.options = options;
        self
    }
}

#[async_trait]
impl Reporter for DirectoryTreeReporter {
    async fn report(&self) -> Result<Chapter, ReporterError> {
        let roots = self.roots.clone();
        let options = self.options;
        let trees = tokio::task::spawn_blocking(move || {
            roots
                .iter()
                .map(|root| scan_tree(root, options))
                .collect::<io::Result<Vec<_>>>()
        })
        .await
        .map_err(|err| ReporterError::Unavailable(err.to_string()))??;

        let body: String = trees
            .iter()
            .map(|tree| {
                format!(
                    "<pre class=\"directory-tree\">{}</pre>\n",
                    html::escape(&render_tree(tree))
                )
            })
            .collect();
        Ok(Chapter::html(self.title.clone(), body))
    }
}
