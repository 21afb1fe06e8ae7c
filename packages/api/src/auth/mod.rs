//! Authentication: local passwords, federated OAuth logins, and the resolver
//! chain that turns a session into the caller's identity.

mod config;
mod github;
mod google;
pub mod password;
pub mod resolver;
pub mod routes;
pub mod session;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use store::models::FederatedProfile;
use thiserror::Error;

pub use config::{OAuthConfig, OAuthCredentials};
pub use github::GitHubOAuth;
pub use google::GoogleOAuth;
pub use password::{hash_password, verify_password, PasswordError};
pub use resolver::{CurrentUser, IdentityResolver, Resolution, ResolveIdentity};
pub use session::SESSION_USER_ID_KEY;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("invalid provider configuration: {0}")]
    Config(#[from] oauth2::url::ParseError),
    #[error("token exchange failed: {0}")]
    TokenExchange(String),
    #[error("provider request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Everything needed to send the browser to a provider and validate its return.
#[derive(Debug, Clone)]
pub struct AuthRequest {
    pub url: String,
    pub state: String,
    pub verifier: String,
}

#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn authorize(&self) -> AuthRequest;
    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<FederatedProfile, OAuthError>;
}

/// Token requests must not follow redirects.
fn http_client() -> Result<reqwest::Client, OAuthError> {
    Ok(reqwest::ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

/// Configured providers by name. Unconfigured providers are simply absent.
#[derive(Clone, Default)]
pub struct OAuthProviders {
    providers: BTreeMap<&'static str, Arc<dyn OAuthProvider>>,
}

impl OAuthProviders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, provider: impl OAuthProvider + 'static) -> Self {
        self.providers.insert(provider.name(), Arc::new(provider));
        self
    }

    /// Build the GitHub and Google providers for whichever credentials are present.
    pub fn from_credentials(
        redirect_base: &str,
        github: Option<&OAuthCredentials>,
        google: Option<&OAuthCredentials>,
    ) -> Result<Self, OAuthError> {
        let mut providers = Self::new();
        if let Some(credentials) = github {
            providers = providers.with(GitHubOAuth::new(OAuthConfig::github(credentials, redirect_base)?)?);
        }
        if let Some(credentials) = google {
            providers = providers.with(GoogleOAuth::new(OAuthConfig::google(credentials, redirect_base)?)?);
        }
        Ok(providers)
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn OAuthProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.providers.keys().copied()
    }
}
