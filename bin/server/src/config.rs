use std::env;
use std::time::Duration;

use postbox_core::{ModerationConfig, ModerationPolicy, StorageConfig, StorageType};
use postbox_core::moderation::config::DEFAULT_TIMEOUT_SECS;

/// Application configuration
#[derive(Clone)]
pub struct Settings {
    /// Gemini API key; moderation fails open without it
    pub gemini_api_key: Option<String>,

    /// Gemini model name (optional)
    pub gemini_model: Option<String>,

    /// Gemini base URL (optional)
    pub gemini_base_url: Option<String>,

    /// Upper bound on a single moderation call
    pub moderation_timeout_secs: u64,

    pub moderation_policy: ModerationPolicy,

    /// Explicit storage backend; inferred from the other settings when absent
    pub storage_backend: Option<StorageType>,

    pub neo4j_uri: Option<String>,
    pub neo4j_user: Option<String>,
    pub neo4j_password: Option<String>,
    pub neo4j_database: Option<String>,

    /// Directory of the embedded sled database
    pub sled_path: Option<String>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Settings {
    /// Load settings from environment variables
    pub fn load() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok(); // Load .env file if it exists

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let moderation_policy = match var("MODERATION_POLICY") {
            Some(policy) => policy.parse().map_err(anyhow::Error::msg)?,
            None => ModerationPolicy::default(),
        };

        let storage_backend = var("STORAGE_BACKEND")
            .map(|backend| backend.parse::<StorageType>())
            .transpose()
            .map_err(anyhow::Error::msg)?;

        let moderation_timeout_secs = match var("MODERATION_TIMEOUT_SECS") {
            Some(secs) => secs
                .parse()
                .map_err(|_| anyhow::anyhow!("MODERATION_TIMEOUT_SECS must be a whole number of seconds"))?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Settings {
            gemini_api_key: var("GEMINI_API_KEY"),
            gemini_model: var("GEMINI_MODEL"),
            gemini_base_url: var("GEMINI_BASE_URL"),
            moderation_timeout_secs,
            moderation_policy,
            storage_backend,
            neo4j_uri: var("NEO4J_URI"),
            neo4j_user: var("NEO4J_USER"),
            neo4j_password: var("NEO4J_PASSWORD"),
            neo4j_database: var("NEO4J_DATABASE"),
            sled_path: var("SLED_PATH"),
            host: var("HOST").unwrap_or_else(default_host),
            port: var("PORT")
                .map(|p| p.parse().unwrap_or(default_port()))
                .unwrap_or(default_port()),
        })
    }

    /// Get the server address as a string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn moderation_config(&self) -> ModerationConfig {
        ModerationConfig {
            api_key: self.gemini_api_key.clone(),
            model: self.gemini_model.clone(),
            base_url: self.gemini_base_url.clone(),
            timeout: Duration::from_secs(self.moderation_timeout_secs),
        }
    }

    /// Durable storage configuration, or `None` when no credential is present
    pub fn storage_config(&self) -> Option<StorageConfig> {
        let backend = self.storage_backend.or_else(|| {
            if self.neo4j_uri.is_some() {
                Some(StorageType::Neo4j)
            } else if self.sled_path.is_some() {
                Some(StorageType::Sled)
            } else {
                None
            }
        })?;

        match backend {
            StorageType::Neo4j => {
                let mut config = StorageConfig::neo4j(
                    self.neo4j_uri.clone()?,
                    self.neo4j_user.clone().unwrap_or_else(|| "neo4j".to_string()),
                    self.neo4j_password.clone().unwrap_or_default(),
                );
                if let Some(database) = &self.neo4j_database {
                    config = config.with_database(database.clone());
                }
                Some(config)
            }
            StorageType::Sled => Some(StorageConfig::sled(self.sled_path.clone()?)),
        }
    }
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("gemini_api_key", &self.gemini_api_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("moderation_timeout_secs", &self.moderation_timeout_secs)
            .field("moderation_policy", &self.moderation_policy)
            .field("storage_backend", &self.storage_backend)
            .field("neo4j_uri", &self.neo4j_uri)
            .field("sled_path", &self.sled_path)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> Result<Settings, anyhow::Error> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let settings = settings(&[]).unwrap();
        assert_eq!(settings.server_address(), "0.0.0.0:8000");
        assert_eq!(settings.moderation_policy, ModerationPolicy::Observe);
        assert!(settings.storage_config().is_none());

        let moderation = settings.moderation_config();
        assert!(!moderation.has_api_key());
        assert_eq!(moderation.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings = settings(&[("GEMINI_API_KEY", ""), ("NEO4J_URI", "  ")]).unwrap();
        assert!(settings.gemini_api_key.is_none());
        assert!(settings.storage_config().is_none());
    }

    #[test]
    fn test_neo4j_inferred_from_uri() {
        let settings = settings(&[
            ("NEO4J_URI", "bolt://db:7687"),
            ("NEO4J_PASSWORD", "secret"),
            ("NEO4J_DATABASE", "messages"),
        ])
        .unwrap();

        let config = settings.storage_config().unwrap();
        assert_eq!(config.storage_type, StorageType::Neo4j);
        assert_eq!(config.uri, "bolt://db:7687");
        assert_eq!(config.username.as_deref(), Some("neo4j"));
        assert_eq!(config.database.as_deref(), Some("messages"));
    }

    #[test]
    fn test_explicit_backend_wins() {
        let settings = settings(&[
            ("STORAGE_BACKEND", "sled"),
            ("NEO4J_URI", "bolt://db:7687"),
            ("SLED_PATH", "/var/lib/postbox"),
        ])
        .unwrap();

        let config = settings.storage_config().unwrap();
        assert_eq!(config.storage_type, StorageType::Sled);
        assert_eq!(config.uri, "/var/lib/postbox");
    }

    #[test]
    fn test_explicit_backend_without_credential_is_unconfigured() {
        let settings = settings(&[("STORAGE_BACKEND", "neo4j")]).unwrap();
        assert!(settings.storage_config().is_none());
    }

    #[test]
    fn test_invalid_values_are_errors() {
        assert!(settings(&[("MODERATION_POLICY", "block")]).is_err());
        assert!(settings(&[("STORAGE_BACKEND", "cosmos")]).is_err());
        assert!(settings(&[("MODERATION_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let settings = settings(&[("GEMINI_API_KEY", "super-secret")]).unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }
}
