//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;
use termtree::Tree;

use crate::application::services::TreeNode;
use crate::domain::Node;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print completed action (green label)
pub fn action(label: &str, msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print plain output (no color, for URLs and Markdown)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Icon, title and dimmed id.
pub fn node_label(node: &Node) -> String {
    format!("{} {}", node.label(), format!("({})", node.id()).dimmed())
}

/// One `ls` row: kind, id, title.
pub fn node_row(node: &Node) -> String {
    format!(
        "{:<12} {:<40} {}",
        node.kind().as_str().cyan(),
        node.id(),
        node.title
    )
}

/// Build a printable tree from expanded nodes.
///
/// Nodes cut off by the depth limit end in a dimmed ellipsis.
pub fn tree(root_label: String, nodes: &[TreeNode]) -> Tree<String> {
    Tree::new(root_label).with_leaves(nodes.iter().map(|t| tree(tree_label(t), &t.children)))
}

fn tree_label(t: &TreeNode) -> String {
    let label = node_label(&t.node);
    if t.expanded || t.node.is_leaf() {
        label
    } else {
        format!("{label} {}", "…".dimmed())
    }
}
