//! # Google OAuth 2.0
//!
//! Same flow as [`super::github`], against Google's endpoints with the `openid`,
//! `email` and `profile` scopes. The profile comes from the v2 userinfo endpoint.

use async_trait::async_trait;
use oauth2::{AuthorizationCode, CsrfToken, PkceCodeChallenge, PkceCodeVerifier, Scope, TokenResponse};
use serde::Deserialize;
use store::models::FederatedProfile;

use super::config::OAuthConfig;
use super::{AuthRequest, OAuthError, OAuthProvider};

/// Google user info from API.
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

pub struct GoogleOAuth {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl GoogleOAuth {
    pub fn new(config: OAuthConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            config,
            http: super::http_client()?,
        })
    }
}

#[async_trait]
impl OAuthProvider for GoogleOAuth {
    fn name(&self) -> &'static str {
        "google"
    }

    fn authorize(&self) -> AuthRequest {
        let (challenge, verifier) = PkceCodeChallenge::new_random_sha256();
        let (url, state) = self
            .config
            .client()
            .authorize_url(CsrfToken::new_random)
            .add_scope(Scope::new("openid".to_string()))
            .add_scope(Scope::new("email".to_string()))
            .add_scope(Scope::new("profile".to_string()))
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

        let user: GoogleUser = self
            .http
            .get("https://www.googleapis.com/oauth2/v2/userinfo")
            .bearer_auth(token.access_token().secret())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(FederatedProfile {
            provider: self.name().to_string(),
            subject: user.id,
            email: user
                .email
                .filter(|_| user.verified_email)
                .map(|e| e.to_lowercase()),
            first_name: user.given_name,
            last_name: user.family_name,
            profile_image_url: user.picture,
        })
    }
}
