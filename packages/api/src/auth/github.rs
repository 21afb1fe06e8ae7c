//! # GitHub OAuth 2.0
//!
//! Authorization Code flow with PKCE.
//!
//! 1. [`authorize`](OAuthProvider::authorize) builds the authorization URL with the
//!    `user:email` and `read:user` scopes and returns the CSRF state and PKCE verifier
//!    for the caller to keep in the session.
//! 2. [`exchange_code`](OAuthProvider::exchange_code) trades the code + verifier for an
//!    access token, then reads `api.github.com/user`. When the profile hides its email
//!    it falls back to `/user/emails` and picks the primary verified address (or none).

use async_trait::async_trait;
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, Scope, TokenResponse};
use serde::Deserialize;
use store::models::FederatedProfile;

use super::config::OAuthConfig;
use super::{AuthRequest, OAuthError, OAuthProvider};

const USER_AGENT: &str = "PetFamily";

/// GitHub user info from API.
#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: i64,
    login: String,
    email: Option<String>,
    name: Option<String>,
    avatar_url: Option<String>,
}

/// GitHub email info from API.
#[derive(Debug, Deserialize)]
struct GitHubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

pub struct GitHubOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GitHubOAuth {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            config,
            http: super::http_client()?,
        })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
    ) -> Result<T, OAuthError> {
        Ok(self
            .http
            .get(url)
            .bearer_auth(token)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

/// "Ada Lovelace" → ("Ada", "Lovelace"); a single word is a first name.
fn split_name(name: &str) -> (Option<String>, Option<String>) {
    let mut parts = name.trim().splitn(2, ' ');
    let first = parts.next().filter(|s| !s.is_empty()).map(str::to_string);
    let last = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    (first, last)
}

#[async_trait]
impl OAuthProvider for GitHubOAuth {
    fn name(&self) -> &'static str {
        "github"
    }

    fn authorize(&self) -> AuthRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, state) = self
            .config
            .client()
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("user:email".to_string()))
            .add_scope(Scope::new("read:user".to_string()))
            .set_pkce_challenge(challenge)
            .url();
        AuthRequest {
            url: url.to_string(),
            state: state.secret().clone(),
            verifier: verifier.secret().clone(),
        }
    }

    async fn exchange_code(&self, code: &str, verifier: &str) -> Result<FederatedProfile, OAuthError> {
        let token = self
            .config
            .client()
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(verifier.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;
        let access_token = token.access_token().secret();

        let user: GitHubUser = self.get_json("https://api.github.com/user", access_token).await?;

        let email = match user.email {
            Some(email) => Some(email),
            None => {
                let emails: Vec<GitHubEmail> = self
                    .get_json("https://api.github.com/user/emails", access_token)
                    .await?;
                emails
                    .into_iter()
                    .find(|e| e.primary && e.verified)
                    .map(|e| e.email)
            }
        };

        let (first_name, last_name) = split_name(user.name.as_deref().unwrap_or(&user.login));
        Ok(FederatedProfile {
            provider: self.name().to_string(),
            subject: user.id.to_string(),
            email: email.map(|e| e.to_lowercase()),
            first_name,
            last_name,
            profile_image_url: user.avatar_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::config::OAuthCredentials;

    #[test]
    fn test_split_name() {
        assert_eq!(
            split_name("Ada Lovelace"),
            (Some("Ada".to_string()), Some("Lovelace".to_string()))
        );
        assert_eq!(split_name("octocat"), (Some("octocat".to_string()), None));
        assert_eq!(split_name("  "), (None, None));
    }

    #[test]
    fn test_authorize_url_carries_pkce_and_state() {
        let credentials = OAuthCredentials {
            client_id: "client".into(),
            client_secret: "secret".into(),
        };
        let config = OAuthConfig::github(&credentials, "http://localhost:5000").unwrap();
        let oauth = GitHubOAuth::new(config).unwrap();
        let request = oauth.authorize();
        assert!(request.url.starts_with("https://github.com/login/oauth/authorize"));
        assert!(request.url.contains("code_challenge="));
        assert!(request.url.contains(&request.state));
        assert!(!request.verifier.is_empty());
    }
}
