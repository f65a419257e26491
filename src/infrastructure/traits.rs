//! I/O boundary traits for testability
//!
//! These traits abstract the remote service, process spawning, the OS secret
//! store and interactive input, allowing services to be tested with fakes.

use std::io;
use std::process::Output;
use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use url::Url;

use crate::domain::{LayerRecord, Record};
use crate::infrastructure::{InfraError, InfraResult, RemoteResult};

/// Parameters for listing the layers of one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerQuery<'a> {
    pub project_id: &'a str,
    pub branch_id: &'a str,
    pub file_id: &'a str,
    pub page_id: &'a str,
    pub limit: u32,
}

/// Identifies a layer at a specific revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewRef<'a> {
    pub project_id: &'a str,
    pub branch_id: &'a str,
    pub file_id: &'a str,
    pub page_id: &'a str,
    pub layer_id: &'a str,
    pub sha: &'a str,
}

/// Remote account and content service.
///
/// Every method is a single round-trip; implementations do not retry.
#[async_trait]
pub trait ResourceGraph: Send + Sync {
    async fn list_organizations(&self) -> RemoteResult<Vec<Record>>;

    /// Active projects of an organization; archived and deleted ones are left out.
    async fn list_projects(&self, organization_id: &str) -> RemoteResult<Vec<Record>>;

    /// Active branches of a project.
    async fn list_branches(&self, project_id: &str) -> RemoteResult<Vec<Record>>;

    async fn list_files(&self, project_id: &str, branch_id: &str) -> RemoteResult<Vec<Record>>;

    async fn list_pages(
        &self,
        project_id: &str,
        branch_id: &str,
        file_id: &str,
    ) -> RemoteResult<Vec<Record>>;

    async fn list_layers(&self, query: &LayerQuery<'_>) -> RemoteResult<Vec<LayerRecord>>;

    /// Raw bytes of the rendered layer.
    async fn fetch_preview(&self, layer: &PreviewRef<'_>) -> RemoteResult<Vec<u8>>;
}

/// External command runner abstraction.
pub trait CommandRunner: Send + Sync {
    /// Run a command with arguments.
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output>;

    /// Run a command with arguments, feeding `stdin` to it.
    fn run_with_stdin(&self, cmd: &str, args: &[&str], stdin: &str) -> io::Result<Output>;
}

/// Hands URLs to whatever the OS has registered for them.
pub trait UrlOpener: Send + Sync {
    fn open(&self, url: &Url) -> InfraResult<()>;
}

/// OS-level secret storage for the API token.
pub trait CredentialStore: Send + Sync {
    /// Stored token, `None` if nothing is stored.
    fn read(&self) -> io::Result<Option<SecretString>>;

    fn store(&self, token: &SecretString) -> io::Result<()>;

    fn clear(&self) -> io::Result<()>;
}

/// Interactive token entry.
pub trait TokenPrompt: Send + Sync {
    /// Ask for a token. Returns None if the user declines.
    fn ask(&self, prompt: &str) -> io::Result<Option<String>>;
}

/// Item for FZF-style selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionItem {
    /// Display text shown in selector
    pub display: String,
    /// Value handed back to the caller (e.g., node id)
    pub value: String,
}

/// Interactive FZF-style selector abstraction.
pub trait Selector: Send + Sync {
    /// Present items to user and return selected one.
    /// Returns None if user cancels (Esc/Ctrl-C).
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real command runner implementation.
#[derive(Debug, Default)]
pub struct RealCommandRunner;

impl CommandRunner for RealCommandRunner {
    fn run(&self, cmd: &str, args: &[&str]) -> io::Result<Output> {
        std::process::Command::new(cmd).args(args).output()
    }

    fn run_with_stdin(&self, cmd: &str, args: &[&str], stdin: &str) -> io::Result<Output> {
        use std::io::Write;
        use std::process::Stdio;

        let mut child = std::process::Command::new(cmd)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        if let Some(mut child_stdin) = child.stdin.take() {
            child_stdin.write_all(stdin.as_bytes())?;
        }

        child.wait_with_output()
    }
}

/// Opens URLs with the OS handler, or with a configured application.
///
/// The launcher is detached, so the call returns before the browser or app exits.
pub struct SystemOpener {
    app: Option<String>,
}

impl SystemOpener {
    pub fn new(app: Option<String>) -> Self {
        let app = app.map(|a| a.trim().to_string()).filter(|a| !a.is_empty());
        Self { app }
    }

    /// Configured application, `None` when the OS handler is used.
    pub fn app(&self) -> Option<&str> {
        self.app.as_deref()
    }
}

impl UrlOpener for SystemOpener {
    fn open(&self, url: &Url) -> InfraResult<()> {
        debug!("open: {} with {:?}", url, self.app);
        let result = match &self.app {
            Some(app) => open::with_detached(url.as_str(), app.as_str()),
            None => open::that_detached(url.as_str()),
        };
        result.map_err(|e| InfraError::Opener {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Secret store backed by the macOS keychain (`security`) or the
/// freedesktop secret service (`secret-tool`).
pub struct KeychainStore {
    cmd: Arc<dyn CommandRunner>,
    service: String,
    account: String,
}

impl KeychainStore {
    pub fn new(
        cmd: Arc<dyn CommandRunner>,
        service: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            cmd,
            service: service.into(),
            account: account.into(),
        }
    }

    fn check(output: Output, action: &str) -> io::Result<()> {
        if output.status.success() {
            Ok(())
        } else {
            Err(io::Error::new(
                io::ErrorKind::Other,
                format!(
                    "{action} failed ({}): {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ))
        }
    }
}

impl CredentialStore for KeychainStore {
    fn read(&self) -> io::Result<Option<SecretString>> {
        let output = if cfg!(target_os = "macos") {
            self.cmd.run(
                "security",
                &[
                    "find-generic-password",
                    "-a",
                    self.account.as_str(),
                    "-s",
                    self.service.as_str(),
                    "-w",
                ],
            )?
        } else {
            self.cmd.run(
                "secret-tool",
                &[
                    "lookup",
                    "service",
                    self.service.as_str(),
                    "account",
                    self.account.as_str(),
                ],
            )?
        };
        // Both tools exit non-zero when no matching entry exists.
        if !output.status.success() {
            return Ok(None);
        }
        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Ok((!token.is_empty()).then(|| SecretString::from(token)))
    }

    fn store(&self, token: &SecretString) -> io::Result<()> {
        let output = if cfg!(target_os = "macos") {
            // `security` accepts the password only as an argument, so it is
            // visible in the process list while this call runs.
            self.cmd.run(
                "security",
                &[
                    "add-generic-password",
                    "-U",
                    "-a",
                    self.account.as_str(),
                    "-s",
                    self.service.as_str(),
                    "-w",
                    token.expose_secret(),
                ],
            )?
        } else {
            self.cmd.run_with_stdin(
                "secret-tool",
                &[
                    "store",
                    "--label=Abstract API token",
                    "service",
                    self.service.as_str(),
                    "account",
                    self.account.as_str(),
                ],
                token.expose_secret(),
            )?
        };
        Self::check(output, "store token")
    }

    fn clear(&self) -> io::Result<()> {
        let output = if cfg!(target_os = "macos") {
            self.cmd.run(
                "security",
                &[
                    "delete-generic-password",
                    "-a",
                    self.account.as_str(),
                    "-s",
                    self.service.as_str(),
                ],
            )?
        } else {
            self.cmd.run(
                "secret-tool",
                &[
                    "clear",
                    "service",
                    self.service.as_str(),
                    "account",
                    self.account.as_str(),
                ],
            )?
        };
        Self::check(output, "clear token")
    }
}

/// Reads a token from the terminal without echoing it.
#[derive(Debug, Default)]
pub struct StdinPrompt;

impl TokenPrompt for StdinPrompt {
    fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        use std::io::IsTerminal;

        let term = console::Term::stderr();
        if !io::stdin().is_terminal() || !term.is_term() {
            return Ok(None);
        }
        term.write_str(&format!("{prompt}: "))?;
        let line = term.read_secure_line()?;
        let line = line.trim();
        Ok((!line.is_empty()).then(|| line.to_string()))
    }
}

/// Real selector implementation using skim (FZF-like).
#[derive(Debug, Default)]
pub struct SkimSelector;

impl Selector for SkimSelector {
    fn select_one(
        &self,
        items: &[SelectionItem],
        prompt: &str,
    ) -> Result<Option<SelectionItem>, String> {
        use skim::prelude::*;
        use std::io::Cursor;

        if items.is_empty() {
            return Ok(None);
        }

        let input = items
            .iter()
            .map(|i| i.display.as_str())
            .collect::<Vec<_>>()
            .join("\n");

        let options = SkimOptionsBuilder::default()
            .prompt(Some(prompt))
            .height(Some("60%"))
            .multi(false)
            .build()
            .map_err(|e| format!("failed to build skim options: {e}"))?;

        let items_arc = SkimItemReader::default().of_bufread(Cursor::new(input));

        match Skim::run_with(&options, Some(items_arc)) {
            Some(out) if out.is_abort => Ok(None),
            Some(out) => Ok(out.selected_items.first().and_then(|selected| {
                let display = selected.output().to_string();
                items.iter().find(|i| i.display == display).cloned()
            })),
            None => Ok(None),
        }
    }
}
