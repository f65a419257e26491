//! Command handlers

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use secrecy::SecretString;
use tracing::{debug, instrument};
use url::Url;

use crate::application::render_details;
use crate::application::services::HierarchyAdapter;
use crate::application::ApplicationError;
use crate::cli::args::{Cli, Commands, ConfigCommands, TokenCommands};
use crate::cli::output;
use crate::cli::{CliError, CliResult};
use crate::config::{global_config_path, Settings};
use crate::domain::{Node, NodePath};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::traits::SelectionItem;
use crate::infrastructure::InfraError;

const PARENT_ITEM: &str = "..";

pub async fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    // Commands that work without a valid configuration.
    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => return config_command(command),
        _ => {}
    }

    let container = ServiceContainer::new(Settings::load()?);

    match command {
        Commands::Token { command } => token_command(&container, cli.token.as_deref(), command),
        Commands::Tree { path, depth } => {
            let hierarchy = connect(&container, cli)?;
            tree(&hierarchy, path.as_ref(), *depth).await
        }
        Commands::Ls { path } => {
            let hierarchy = connect(&container, cli)?;
            ls(&hierarchy, path.as_ref()).await
        }
        Commands::Web { path, print } => {
            let hierarchy = connect(&container, cli)?;
            let node = resolve_node(&hierarchy, path).await?;
            let url = container.link_resolver()?.web_url_of(&node);
            open_link(&container, url, *print, "web")
        }
        Commands::App { path, print } => {
            let hierarchy = connect(&container, cli)?;
            let node = resolve_node(&hierarchy, path).await?;
            let url = container.link_resolver()?.app_url_of(&node);
            open_link(&container, url, *print, "app")
        }
        Commands::Details { path, no_preview } => {
            let hierarchy = connect(&container, cli)?;
            let node = resolve_node(&hierarchy, path).await?;
            details(&container, &hierarchy, &node, !*no_preview).await
        }
        Commands::Preview { path, output } => {
            let hierarchy = connect(&container, cli)?;
            let node = resolve_node(&hierarchy, path).await?;
            preview(&hierarchy, &node, output).await
        }
        Commands::Browse { path } => {
            let hierarchy = connect(&container, cli)?;
            browse(&container, &hierarchy, path.as_ref()).await
        }
        Commands::Completion { .. } | Commands::Config { .. } => Ok(()),
    }
}

/// Obtain the token once and build the hierarchy adapter with it.
fn connect(container: &ServiceContainer, cli: &Cli) -> CliResult<HierarchyAdapter> {
    let explicit = cli.token.clone().map(SecretString::from);
    let (token, source) = container.credential_service().obtain(explicit)?;
    debug!("connect: token source {:?}", source);
    Ok(container.hierarchy(&token)?)
}

async fn resolve_node(hierarchy: &HierarchyAdapter, path: &NodePath) -> CliResult<Node> {
    hierarchy
        .resolve(path)
        .await?
        .ok_or_else(|| CliError::Usage("a node path is required".into()))
}

#[instrument(skip(hierarchy))]
async fn tree(
    hierarchy: &HierarchyAdapter,
    path: Option<&NodePath>,
    depth: usize,
) -> CliResult<()> {
    let root = match path {
        Some(p) => hierarchy.resolve(p).await?,
        None => None,
    };
    let forest = hierarchy.expand(root.as_ref(), depth.max(1)).await?;
    let label = root
        .as_ref()
        .map(output::node_label)
        .unwrap_or_else(|| "Abstract".to_string());
    output::info(&output::tree(label, &forest));
    Ok(())
}

#[instrument(skip(hierarchy))]
async fn ls(hierarchy: &HierarchyAdapter, path: Option<&NodePath>) -> CliResult<()> {
    let parent = match path {
        Some(p) => hierarchy.resolve(p).await?,
        None => None,
    };
    for child in hierarchy.children(parent.as_ref()).await? {
        output::info(&output::node_row(&child));
    }
    Ok(())
}

/// Open or print a link; a node without a link is a no-op.
fn open_link(
    container: &ServiceContainer,
    url: Option<Url>,
    print: bool,
    what: &str,
) -> CliResult<()> {
    let Some(url) = url else {
        output::warning(&format!("no {what} link for this node"));
        return Ok(());
    };
    if print {
        output::info(&url);
    } else {
        container.opener.open(&url)?;
        output::action("Opened", &url);
    }
    Ok(())
}

#[instrument(skip(container, hierarchy, node), fields(node = %node.id()))]
async fn details(
    container: &ServiceContainer,
    hierarchy: &HierarchyAdapter,
    node: &Node,
    with_preview: bool,
) -> CliResult<()> {
    let descriptor = container.link_resolver()?.descriptor_of(node);
    let preview = if with_preview {
        hierarchy.preview(node).await?
    } else {
        None
    };
    output::info(&render_details(node, &descriptor, preview.as_deref()));
    Ok(())
}

#[instrument(skip(hierarchy, node), fields(node = %node.id()))]
async fn preview(
    hierarchy: &HierarchyAdapter,
    node: &Node,
    target: &std::path::Path,
) -> CliResult<()> {
    match hierarchy.preview(node).await? {
        Some(bytes) => {
            std::fs::write(target, &bytes)
                .map_err(|e| InfraError::io(format!("write {}", target.display()), e))?;
            output::success(&format!("{} bytes written to {}", bytes.len(), target.display()));
        }
        None => output::warning(&format!(
            "previews exist only for layers, not for a {}",
            node.kind()
        )),
    }
    Ok(())
}

/// Drill down with the selector until a layer is picked or the user aborts.
async fn browse(
    container: &ServiceContainer,
    hierarchy: &HierarchyAdapter,
    start: Option<&NodePath>,
) -> CliResult<()> {
    let mut trail = match start {
        Some(p) => hierarchy.resolve_trail(p).await?,
        None => Vec::new(),
    };

    loop {
        let children = hierarchy.children(trail.last()).await?;

        let mut items = Vec::with_capacity(children.len() + 1);
        if !trail.is_empty() {
            items.push(SelectionItem {
                display: PARENT_ITEM.to_string(),
                value: PARENT_ITEM.to_string(),
            });
        }
        items.extend(children.iter().enumerate().map(|(i, n)| SelectionItem {
            display: format!("{}  [{}]", n.label(), n.id()),
            value: i.to_string(),
        }));

        let prompt = match trail.last() {
            Some(n) => format!("{}> ", n.title),
            None => "organizations> ".to_string(),
        };
        let selector = container.selector.clone();
        let picked = tokio::task::block_in_place(|| selector.select_one(&items, &prompt))
            .map_err(CliError::Usage)?;

        let Some(item) = picked else {
            return Ok(());
        };
        if item.value == PARENT_ITEM {
            trail.pop();
            continue;
        }
        let Some(child) = item.value.parse::<usize>().ok().and_then(|i| children.get(i)) else {
            continue;
        };
        if child.is_leaf() {
            return details(container, hierarchy, child, true).await;
        }
        trail.push(child.clone());
    }
}

fn token_command(
    container: &ServiceContainer,
    explicit: Option<&str>,
    command: &TokenCommands,
) -> CliResult<()> {
    let service = container.credential_service();
    let keychain = &container.settings.keychain;
    match command {
        TokenCommands::Set { token } => {
            let value = match token {
                Some(t) => Some(t.clone()),
                None => container
                    .prompt
                    .ask("Enter API token")
                    .map_err(|e| InfraError::io("read API token", e))?,
            };
            let value = value
                .filter(|t| !t.trim().is_empty())
                .ok_or(ApplicationError::MissingCredential)?;
            service.save(&SecretString::from(value))?;
            output::success(&format!(
                "token saved (service {}, account {})",
                keychain.service, keychain.account
            ));
        }
        TokenCommands::Clear => {
            service.clear()?;
            output::success("token removed from secret store");
        }
        TokenCommands::Status => {
            if explicit.is_some() {
                output::action("Token", "supplied via --token / ABSTRACT_TOKEN");
            }
            if service.is_stored()? {
                output::action(
                    "Stored",
                    &format!("service {}, account {}", keychain.service, keychain.account),
                );
            } else {
                output::warning("no token in secret store");
            }
        }
    }
    Ok(())
}

fn config_command(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            output::header("Config file");
            match global_config_path() {
                Some(p) => {
                    let state = if p.exists() { "exists" } else { "missing" };
                    output::info(&format!("{} ({state})", p.display()));
                }
                None => output::warning("no config directory on this platform"),
            }
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("no config directory on this platform".into()))?;
            if path.exists() && !*force {
                return Err(CliError::Usage(format!(
                    "{} already exists, use --force to overwrite",
                    path.display()
                )));
            }
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir)
                    .map_err(|e| InfraError::io(format!("create {}", dir.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Created", &path.display());
        }
    }
    Ok(())
}
