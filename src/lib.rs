//! Studio CMS
//!
//! Admin data layer and JSON API for a studio marketing website:
//! - Ordered content collections (projects, services, testimonials, ...)
//! - Singleton company settings
//! - Workspace users synced from Clerk, with role mirroring
//! - Neo4j-backed record store, with an in-memory backend for development

pub mod api;
pub mod auth;
pub mod company;
pub mod content;
pub mod error;
pub mod identity;
pub mod seed;
pub mod store;
pub mod users;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{bail, Result};
use serde::Deserialize;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub store: StoreYamlConfig,
    pub neo4j: Neo4jYamlConfig,
    pub users: UsersYamlConfig,
    pub identity: IdentityConfig,
    /// Auth section. If absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Which record store backend to run against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Neo4j,
    /// Non-persistent; for local development and tests
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "neo4j" => Ok(StoreBackend::Neo4j),
            "memory" => Ok(StoreBackend::Memory),
            other => bail!("Unknown store backend '{}' (expected neo4j or memory)", other),
        }
    }
}

/// Store configuration section
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreYamlConfig {
    pub backend: StoreBackend,
}

/// Neo4j configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Neo4jYamlConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

impl Default for Neo4jYamlConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".into(),
            user: "neo4j".into(),
            password: "studio-cms".into(),
        }
    }
}

/// Users configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UsersYamlConfig {
    /// Address forced to admin on its first sync
    pub owner_email: String,
}

impl Default for UsersYamlConfig {
    fn default() -> Self {
        Self {
            owner_email: users::DEFAULT_OWNER_EMAIL.into(),
        }
    }
}

/// Identity provider (Clerk) configuration.
///
/// Without a `secret_key` role changes are saved locally only and
/// invitations are unavailable. Without a `webhook_secret` the webhook
/// endpoint refuses every delivery.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    pub secret_key: Option<String>,
    /// Backend API base URL (default: Clerk production)
    pub api_url: Option<String>,
    /// Svix signing secret (`whsec_...`)
    pub webhook_secret: Option<String>,
    /// Where invitation links land after sign-up
    pub invitation_redirect_url: Option<String>,
}

/// Session token verification settings
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 secret of the provider's JWT template
    pub jwt_secret: String,
    /// Optional domain restriction (e.g. "studio.dev")
    pub allowed_email_domain: Option<String>,
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_port: u16,
    pub store_backend: StoreBackend,
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub owner_email: String,
    pub identity: IdentityConfig,
    /// Auth config; None means deny-by-default (no auth section in YAML)
    pub auth_config: Option<AuthConfig>,
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Equivalent to from_yaml_and_env(None).
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let store_backend = match env_opt("STORE_BACKEND") {
            Some(raw) => raw.parse()?,
            None => yaml.store.backend,
        };

        let identity = IdentityConfig {
            secret_key: env_opt("CLERK_SECRET_KEY").or(yaml.identity.secret_key),
            api_url: env_opt("CLERK_API_URL").or(yaml.identity.api_url),
            webhook_secret: env_opt("CLERK_WEBHOOK_SECRET").or(yaml.identity.webhook_secret),
            invitation_redirect_url: yaml.identity.invitation_redirect_url,
        };

        let auth_config = match (env_opt("JWT_SECRET"), yaml.auth) {
            (Some(secret), Some(mut auth)) => {
                auth.jwt_secret = secret;
                Some(auth)
            }
            (Some(secret), None) => Some(AuthConfig {
                jwt_secret: secret,
                allowed_email_domain: None,
            }),
            (None, auth) => auth,
        };

        Ok(Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(yaml.server.port),
            store_backend,
            neo4j_uri: std::env::var("NEO4J_URI").unwrap_or(yaml.neo4j.uri),
            neo4j_user: std::env::var("NEO4J_USER").unwrap_or(yaml.neo4j.user),
            neo4j_password: std::env::var("NEO4J_PASSWORD").unwrap_or(yaml.neo4j.password),
            owner_email: env_opt("OWNER_EMAIL").unwrap_or(yaml.users.owner_email),
            identity,
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn store::RecordStore>,
    pub identity: Option<Arc<dyn identity::IdentityProvider>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Create new application state with all services initialized
    pub async fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn store::RecordStore> = match config.store_backend {
            StoreBackend::Neo4j => Arc::new(
                store::Neo4jRecordStore::new(
                    &config.neo4j_uri,
                    &config.neo4j_user,
                    &config.neo4j_password,
                )
                .await?,
            ),
            StoreBackend::Memory => {
                tracing::warn!("Using the in-memory record store; content is not persisted");
                Arc::new(store::MemoryRecordStore::new())
            }
        };

        let identity: Option<Arc<dyn identity::IdentityProvider>> =
            match config.identity.secret_key.as_deref() {
                Some(secret) => Some(Arc::new(identity::ClerkClient::new(
                    secret,
                    config.identity.api_url.clone(),
                ))),
                None => {
                    tracing::warn!("No Clerk secret key configured; role changes will not be mirrored");
                    None
                }
            };

        Ok(Self {
            store,
            identity,
            config: Arc::new(config),
        })
    }
}

/// Initialise state and serve the HTTP API until shutdown
pub async fn start_server(config: Config) -> Result<()> {
    let port = config.server_port;
    let state = AppState::new(config).await?;
    let server_state = api::handlers::ServerState::from_app_state(&state)?;
    if server_state.auth_config.is_none() {
        tracing::warn!("No auth section configured; admin routes will refuse every request");
    }
    let app = api::create_router(Arc::new(server_state));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Studio CMS listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
