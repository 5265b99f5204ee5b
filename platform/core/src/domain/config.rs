// Copyright (c) 2026 HUFS Cheongwon Team
// SPDX-License-Identifier: AGPL-3.0

// Platform Configuration Types
//
// Defines the configuration schema for a Cheongwon server, including:
// - Kubernetes-style manifest format (apiVersion/kind/metadata/spec)
// - HTTP bind settings
// - Storage backend selection (in-memory or PostgreSQL)
// - Institutional email certification credentials
// - Petition policy knobs and log level

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::policy::{SubmissionPolicy, MAX_SUBMISSION_INTERVAL_DAYS, PETITION_SUBMISSION_INTERVAL_DAYS};
use crate::domain::repository::{PostgresConfig, StorageBackend};

pub const API_VERSION: &str = "cheongwon/v1";
pub const KIND: &str = "PlatformConfig";

/// Top-level Kubernetes-style platform configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfigManifest {
    /// API version (must be "cheongwon/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "PlatformConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    pub spec: PlatformConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Deployment name, used in logs
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfigSpec {
    #[serde(default)]
    pub server: ServerConfig,

    /// Omitted means in-memory storage
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub certification: CertificationConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string (supports "env:VAR_NAME")
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificationConfig {
    /// Base URL of the UnivCert API
    #[serde(default = "default_univcert_url")]
    pub base_url: String,

    /// API key (supports "env:VAR_NAME" for environment variables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Institution name as registered with UnivCert
    #[serde(default = "default_org_name")]
    pub org_name: String,

    #[serde(default = "default_certification_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default = "default_submission_interval")]
    pub submission_interval_days: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    8080
}

fn default_max_connections() -> u32 {
    5
}

fn default_univcert_url() -> String {
    "https://univcert.com/api/v1".to_string()
}

fn default_org_name() -> String {
    "한국외국어대학교".to_string()
}

fn default_certification_timeout() -> u64 {
    10
}

fn default_submission_interval() -> i64 {
    PETITION_SUBMISSION_INTERVAL_DAYS
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for CertificationConfig {
    fn default() -> Self {
        Self {
            base_url: default_univcert_url(),
            api_key: None,
            org_name: default_org_name(),
            timeout_seconds: default_certification_timeout(),
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            submission_interval_days: default_submission_interval(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for PlatformConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "cheongwon".to_string(),
                version: Some("1.0.0".to_string()),
            },
            spec: PlatformConfigSpec::default(),
        }
    }
}

/// Resolve `env:VAR_NAME` indirection; other values pass through unchanged.
pub fn resolve_secret(value: &str) -> anyhow::Result<String> {
    match value.strip_prefix("env:") {
        Some(var) => std::env::var(var)
            .map_err(|_| anyhow::anyhow!("Environment variable '{}' is not set", var)),
        None => Ok(value.to_string()),
    }
}

impl PlatformConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to YAML file
    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. CHEONGWON_CONFIG_PATH environment variable
    /// 2. ./cheongwon-config.yaml (working directory)
    /// 3. ~/.cheongwon/config.yaml (user home)
    /// 4. /etc/cheongwon/config.yaml (system, Unix) or C:\ProgramData\Cheongwon\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("CHEONGWON_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./cheongwon-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".cheongwon").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/cheongwon/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Cheongwon\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails hard if missing or invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("CHEONGWON_DATABASE_URL") {
            if url.is_empty() {
                tracing::warn!("Ignoring empty CHEONGWON_DATABASE_URL");
            } else {
                tracing::info!("Environment override: CHEONGWON_DATABASE_URL");
                let max_connections = self
                    .spec
                    .database
                    .as_ref()
                    .map(|db| db.max_connections)
                    .unwrap_or_else(default_max_connections);
                self.spec.database = Some(DatabaseConfig { url, max_connections });
            }
        }

        if let Ok(key) = std::env::var("CHEONGWON_UNIVCERT_KEY") {
            tracing::info!("Environment override: CHEONGWON_UNIVCERT_KEY");
            self.spec.certification.api_key = Some(key);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion: '{}'. Must be '{}'",
                self.api_version,
                API_VERSION
            );
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.server.port == 0 {
            anyhow::bail!("spec.server.port cannot be 0");
        }

        if let Some(db) = &self.spec.database {
            if db.url.is_empty() {
                anyhow::bail!("spec.database.url cannot be empty");
            }
            if db.max_connections == 0 {
                anyhow::bail!("spec.database.max_connections must be at least 1");
            }
        }

        let cert = &self.spec.certification;
        url::Url::parse(&cert.base_url)
            .map_err(|e| anyhow::anyhow!("Invalid certification base_url '{}': {}", cert.base_url, e))?;
        if cert.org_name.is_empty() {
            anyhow::bail!("spec.certification.org_name cannot be empty");
        }

        let interval = self.spec.policy.submission_interval_days;
        if !(0..=MAX_SUBMISSION_INTERVAL_DAYS).contains(&interval) {
            anyhow::bail!(
                "spec.policy.submission_interval_days must be between 0 and {}, got {}",
                MAX_SUBMISSION_INTERVAL_DAYS,
                interval
            );
        }

        Ok(())
    }

    /// Storage backend selected by the `database` section
    pub fn storage_backend(&self) -> anyhow::Result<StorageBackend> {
        match &self.spec.database {
            None => Ok(StorageBackend::InMemory),
            Some(db) => Ok(StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: resolve_secret(&db.url)?,
                max_connections: db.max_connections,
            })),
        }
    }

    pub fn submission_policy(&self) -> SubmissionPolicy {
        SubmissionPolicy::new(self.spec.policy.submission_interval_days)
    }

    /// Resolved UnivCert API key, if one is configured.
    pub fn certification_key(&self) -> anyhow::Result<Option<String>> {
        self.spec
            .certification
            .api_key
            .as_deref()
            .map(resolve_secret)
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = PlatformConfigManifest::default();
        assert_eq!(manifest.api_version, "cheongwon/v1");
        assert_eq!(manifest.kind, "PlatformConfig");
        assert!(manifest.spec.database.is_none());
        assert_eq!(manifest.spec.policy.submission_interval_days, 7);
        assert!(manifest.validate().is_ok());
        assert!(matches!(manifest.storage_backend().unwrap(), StorageBackend::InMemory));
    }

    #[test]
    fn test_yaml_with_partial_spec() {
        let yaml = r#"
apiVersion: cheongwon/v1
kind: PlatformConfig
metadata:
  name: hufs-prod
spec:
  server:
    port: 9000
  database:
    url: postgres://cheongwon@localhost/cheongwon
  certification:
    api_key: plain-key
"#;
        let manifest = PlatformConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.spec.server.port, 9000);
        assert_eq!(manifest.spec.server.bind_address, "127.0.0.1");
        assert_eq!(manifest.spec.database.as_ref().unwrap().max_connections, 5);
        assert_eq!(manifest.spec.certification.org_name, "한국외국어대학교");
        assert_eq!(manifest.certification_key().unwrap().as_deref(), Some("plain-key"));

        match manifest.storage_backend().unwrap() {
            StorageBackend::PostgreSQL(pg) => {
                assert_eq!(pg.connection_string, "postgres://cheongwon@localhost/cheongwon")
            }
            StorageBackend::InMemory => panic!("expected PostgreSQL backend"),
        }
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cheongwon-config.yaml");

        let mut manifest = PlatformConfigManifest::default();
        manifest.metadata.name = "staging".to_string();
        manifest.spec.policy.submission_interval_days = 3;
        manifest.to_yaml_file(&path).unwrap();

        let loaded = PlatformConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.metadata.name, "staging");
        assert_eq!(loaded.submission_policy(), SubmissionPolicy::new(3));
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.yaml");
        assert!(PlatformConfigManifest::load_or_default(Some(missing)).is_err());
    }

    #[test]
    fn test_validation() {
        let mut manifest = PlatformConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "Deployment".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.certification.base_url = "not a url".to_string();
        assert!(manifest.validate().is_err());
        manifest.spec.certification.base_url = default_univcert_url();

        manifest.spec.policy.submission_interval_days = -1;
        assert!(manifest.validate().is_err());
        manifest.spec.policy.submission_interval_days = 7;

        manifest.spec.database = Some(DatabaseConfig {
            url: String::new(),
            max_connections: 5,
        });
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_submission_interval_bounds() {
        let mut manifest = PlatformConfigManifest::default();

        manifest.spec.policy.submission_interval_days = MAX_SUBMISSION_INTERVAL_DAYS;
        assert!(manifest.validate().is_ok());

        manifest.spec.policy.submission_interval_days = MAX_SUBMISSION_INTERVAL_DAYS + 1;
        assert!(manifest.validate().is_err());

        manifest.spec.policy.submission_interval_days = 100_000_000;
        assert!(manifest.validate().is_err());
        assert_eq!(
            manifest.submission_policy().interval(),
            chrono::Duration::days(MAX_SUBMISSION_INTERVAL_DAYS)
        );
    }

    #[test]
    fn test_resolve_secret_passthrough_and_missing_env() {
        assert_eq!(resolve_secret("literal").unwrap(), "literal");
        assert!(resolve_secret("env:CHEONGWON_TEST_SURELY_UNSET_VAR").is_err());
    }
}
