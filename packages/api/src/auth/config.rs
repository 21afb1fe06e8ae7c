//! OAuth provider configuration.

use oauth2::basic::BasicClient;
use oauth2::{AuthUrl, ClientId, ClientSecret, EndpointNotSet, EndpointSet, RedirectUrl, TokenUrl};

/// Client credentials for one provider, as read from settings.
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: String,
}

/// OAuth client type with auth URL and token URL set.
pub(crate) type ConfiguredClient = oauth2::Client<
    oauth2::basic::BasicErrorResponse,
    oauth2::basic::BasicTokenResponse,
    oauth2::basic::BasicTokenIntrospectionResponse,
    oauth2::StandardRevocableToken,
    oauth2::basic::BasicRevocationErrorResponse,
    EndpointSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointNotSet,
    EndpointSet,
>;

/// OAuth provider configuration.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub auth_url: AuthUrl,
    pub token_url: TokenUrl,
    pub redirect_url: RedirectUrl,
}

impl OAuthConfig {
    fn new(
        credentials: &OAuthCredentials,
        auth_url: &str,
        token_url: &str,
        redirect_base: &str,
        provider: &str,
    ) -> Result<Self, oauth2::url::ParseError> {
        let redirect = format!("{}/auth/{provider}/callback", redirect_base.trim_end_matches('/'));
        Ok(Self {
            client_id: ClientId::new(credentials.client_id.clone()),
            client_secret: ClientSecret::new(credentials.client_secret.clone()),
            auth_url: AuthUrl::new(auth_url.to_string())?,
            token_url: TokenUrl::new(token_url.to_string())?,
            redirect_url: RedirectUrl::new(redirect)?,
        })
    }

    pub fn github(
        credentials: &OAuthCredentials,
        redirect_base: &str,
    ) -> Result<Self, oauth2::url::ParseError> {
        Self::new(
            credentials,
            "https://github.com/login/oauth/authorize",
            "https://github.com/login/oauth/access_token",
            redirect_base,
            "github",
        )
    }

    pub fn google(
        credentials: &OAuthCredentials,
        redirect_base: &str,
    ) -> Result<Self, oauth2::url::ParseError> {
        Self::new(
            credentials,
            "https://accounts.google.com/o/oauth2/v2/auth",
            "https://oauth2.googleapis.com/token",
            redirect_base,
            "google",
        )
    }

    pub(crate) fn client(&self) -> ConfiguredClient {
        BasicClient::new(self.client_id.clone())
            .set_client_secret(self.client_secret.clone())
            .set_auth_uri(self.auth_url.clone())
            .set_token_uri(self.token_url.clone())
            .set_redirect_uri(self.redirect_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_url_per_provider() {
        let credentials = OAuthCredentials {
            client_id: "id".into(),
            client_secret: "secret".into(),
        };
        let github = OAuthConfig::github(&credentials, "http://localhost:5000/").unwrap();
        assert_eq!(
            github.redirect_url.url().as_str(),
            "http://localhost:5000/auth/github/callback"
        );
        let google = OAuthConfig::google(&credentials, "https://pets.example").unwrap();
        assert_eq!(
            google.redirect_url.url().as_str(),
            "https://pets.example/auth/google/callback"
        );
    }
}
