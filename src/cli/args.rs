//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::NodePath;

/// Browse Abstract organizations, projects, branches, files, pages and layers
#[derive(Parser, Debug)]
#[command(name = "abstract-explorer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// API token (skips secret store and prompt)
    #[arg(long, env = "ABSTRACT_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Node paths are slash-separated ids from the organization down,
/// e.g. `ORG/PROJECT/BRANCH/FILE/PAGE/LAYER`.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the hierarchy below a node as a tree
    Tree {
        /// Node path (default: all organizations)
        path: Option<NodePath>,
        /// Levels to expand
        #[arg(short = 'L', long, default_value_t = 1)]
        depth: usize,
    },

    /// List the children of a node
    Ls {
        /// Node path (default: all organizations)
        path: Option<NodePath>,
    },

    /// Open a node in the web app
    Web {
        /// Node path
        path: NodePath,
        /// Print the URL instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Open a node in the desktop app
    App {
        /// Node path
        path: NodePath,
        /// Print the URL instead of opening it
        #[arg(long)]
        print: bool,
    },

    /// Show descriptor, attributes and preview of a node as Markdown
    Details {
        /// Node path
        path: NodePath,
        /// Skip fetching the layer preview
        #[arg(long)]
        no_preview: bool,
    },

    /// Save the rendered preview of a layer
    Preview {
        /// Layer path
        path: NodePath,
        /// Target file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
    },

    /// Browse the hierarchy interactively (fzf)
    Browse {
        /// Start below this node
        path: Option<NodePath>,
    },

    /// Manage the stored API token
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenCommands {
    /// Save a token to the OS secret store (prompts if omitted)
    Set {
        /// Token value
        token: Option<String>,
    },

    /// Remove the token from the OS secret store
    Clear,

    /// Show where the token comes from
    Status,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        force: bool,
    },

    /// Show config paths
    Path,
}
