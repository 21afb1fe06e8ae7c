use std::collections::HashMap;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
pub struct Database {
    /// No URL means in-memory storage.
    pub url: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Deserialize)]
pub struct Session {
    pub secret: Option<String>,
    pub secure: bool,
    pub ttl_days: i64,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub upload_dir: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Provider {
    pub client_id: String,
    pub client_secret: String,
}

impl From<&Provider> for api::auth::OAuthCredentials {
    fn from(provider: &Provider) -> Self {
        Self {
            client_id: provider.client_id.clone(),
            client_secret: provider.client_secret.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuth {
    pub redirect_base: String,
    pub github: Option<Provider>,
    pub google: Option<Provider>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub database: Database,
    pub session: Session,
    pub storage: Storage,
    pub oauth: OAuth,
    pub log: Log,
}

/// Plain environment variables from older deployments, mapped onto settings keys.
const LEGACY_VARS: &[(&str, &str)] = &[
    ("DATABASE_URL", "database.url"),
    ("SESSION_SECRET", "session.secret"),
    ("PORT", "server.port"),
    ("UPLOAD_DIR", "storage.upload_dir"),
    ("AUTH_REDIRECT_BASE", "oauth.redirect_base"),
    ("GITHUB_CLIENT_ID", "oauth.github.client_id"),
    ("GITHUB_CLIENT_SECRET", "oauth.github.client_secret"),
    ("GOOGLE_CLIENT_ID", "oauth.google.client_id"),
    ("GOOGLE_CLIENT_SECRET", "oauth.google.client_secret"),
];

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        Self::load(Some("config.toml"), std::env::vars().collect())
    }

    /// Defaults, then the optional TOML file, then `PETFAMILY__SECTION__KEY`
    /// variables, then the legacy variables.
    pub(crate) fn load(file: Option<&str>, vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 5000)?
            .set_default("database.max_connections", 10)?
            .set_default("session.secure", false)?
            .set_default("session.ttl_days", 7)?
            .set_default("storage.upload_dir", "uploads")?
            .set_default("oauth.redirect_base", "http://localhost:5000")?
            .set_default("log.filter", "info,tower_http=debug")?;
        if let Some(file) = file {
            builder = builder.add_source(File::with_name(file).format(FileFormat::Toml).required(false));
        }
        builder = builder.add_source(
            Environment::with_prefix("PETFAMILY")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .source(Some(vars.clone())),
        );
        for (var, key) in LEGACY_VARS {
            let value = vars.get(*var).filter(|v| !v.trim().is_empty()).cloned();
            builder = builder.set_override_option(*key, value)?;
        }
        builder.build()?.try_deserialize()
    }
}
