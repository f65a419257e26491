//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::sync::Arc;

use secrecy::SecretString;

use crate::application::services::{CredentialService, HierarchyAdapter};
use crate::config::Settings;
use crate::domain::LinkResolver;
use crate::infrastructure::traits::{
    CommandRunner, CredentialStore, KeychainStore, RealCommandRunner, ResourceGraph, Selector,
    SkimSelector, StdinPrompt, SystemOpener, TokenPrompt, UrlOpener,
};
use crate::infrastructure::{AbstractApiClient, InfraResult};

/// Container holding the I/O implementations the services are built from.
///
/// The remote client is not part of the container: it needs the token, so
/// `hierarchy` creates it on request.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// URL launcher for open-in-web / open-in-app
    pub opener: Arc<dyn UrlOpener>,

    /// OS secret store
    pub credentials: Arc<dyn CredentialStore>,

    /// Interactive token entry
    pub prompt: Arc<dyn TokenPrompt>,

    /// Interactive list selection
    pub selector: Arc<dyn Selector>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        let cmd: Arc<dyn CommandRunner> = Arc::new(RealCommandRunner);
        let opener = Arc::new(SystemOpener::new(settings.opener.clone()));
        let credentials = Arc::new(KeychainStore::new(
            cmd,
            settings.keychain.service.clone(),
            settings.keychain.account.clone(),
        ));
        Self::with_deps(
            settings,
            opener,
            credentials,
            Arc::new(StdinPrompt),
            Arc::new(SkimSelector),
        )
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        opener: Arc<dyn UrlOpener>,
        credentials: Arc<dyn CredentialStore>,
        prompt: Arc<dyn TokenPrompt>,
        selector: Arc<dyn Selector>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            opener,
            credentials,
            prompt,
            selector,
        }
    }

    pub fn credential_service(&self) -> CredentialService {
        CredentialService::new(
            self.credentials.clone(),
            self.prompt.clone(),
            self.settings.remember_token,
        )
    }

    pub fn link_resolver(&self) -> InfraResult<LinkResolver> {
        Ok(LinkResolver::new(self.settings.link_settings()?))
    }

    /// Hierarchy adapter over the REST API, authenticated with `token`.
    pub fn hierarchy(&self, token: &SecretString) -> InfraResult<HierarchyAdapter> {
        let client = AbstractApiClient::new(&self.settings, token)?;
        Ok(self.hierarchy_with(Arc::new(client)))
    }

    /// Hierarchy adapter over an arbitrary resource graph.
    pub fn hierarchy_with(&self, graph: Arc<dyn ResourceGraph>) -> HierarchyAdapter {
        HierarchyAdapter::new(graph, self.settings.layer_page_limit)
    }
}
