//! API token acquisition
//!
//! The token is looked up once per process: an explicit value wins, then the
//! OS secret store, then an interactive prompt.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt};
use crate::infrastructure::traits::{CredentialStore, TokenPrompt};

/// Where the token in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Explicit,
    Store,
    Prompt,
}

/// Service for obtaining and managing the API token.
pub struct CredentialService {
    store: Arc<dyn CredentialStore>,
    prompt: Arc<dyn TokenPrompt>,
    remember: bool,
}

impl CredentialService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        prompt: Arc<dyn TokenPrompt>,
        remember: bool,
    ) -> Self {
        Self {
            store,
            prompt,
            remember,
        }
    }

    /// Resolve the token to use for this process.
    ///
    /// Fails with `MissingCredential` when none is configured and the user
    /// declines to enter one.
    pub fn obtain(
        &self,
        explicit: Option<SecretString>,
    ) -> ApplicationResult<(SecretString, TokenSource)> {
        if let Some(token) = explicit.filter(|t| !t.expose_secret().trim().is_empty()) {
            debug!("obtain: using explicit token");
            return Ok((token, TokenSource::Explicit));
        }

        match self.store.read() {
            Ok(Some(token)) => {
                debug!("obtain: using token from secret store");
                return Ok((token, TokenSource::Store));
            }
            Ok(None) => debug!("obtain: no token in secret store"),
            // An unavailable store is not fatal, the prompt still works.
            Err(e) => debug!("obtain: secret store unavailable: {}", e),
        }

        let entered = self
            .prompt
            .ask("Enter API token")
            .with_action("read API token")?
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(ApplicationError::MissingCredential)?;
        let token = SecretString::from(entered);

        // A failed save leaves the entered token usable.
        if self.remember {
            match self.save(&token) {
                Ok(()) => info!("API token saved to secret store"),
                Err(e) => warn!("could not save API token: {e}"),
            }
        }
        Ok((token, TokenSource::Prompt))
    }

    pub fn save(&self, token: &SecretString) -> ApplicationResult<()> {
        self.store.store(token).with_action("store API token")
    }

    pub fn clear(&self) -> ApplicationResult<()> {
        self.store.clear().with_action("clear API token")
    }

    /// Whether the secret store currently holds a token.
    pub fn is_stored(&self) -> ApplicationResult<bool> {
        Ok(self.store.read().with_action("read API token")?.is_some())
    }
}
