use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub provision: ProvisionConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    /// Upstream-tracked artifacts (cloned once, then updated)
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceConfig>,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    /// Additional generate-once artifacts (e.g. a database password file)
    #[serde(default, rename = "secret")]
    pub secrets: Vec<SecretConfig>,
    #[serde(default)]
    pub dumps: Option<DumpConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProvisionConfig {
    /// Packages that must be installed (order preserved)
    #[serde(default)]
    pub packages: Vec<String>,
    /// Services restarted after configuration, before dump import
    #[serde(default)]
    pub services: Vec<String>,
}

/// Network gate settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_probe_url")]
    pub probe_url: String,
    /// Probe attempts before the host counts as offline
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Timeout per probe attempt in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_probe_url() -> String {
    "http://detectportal.firefox.com/success.txt".to_string()
}

fn default_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            probe_url: default_probe_url(),
            attempts: default_attempts(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub name: String,
    /// Upstream location (git URL)
    pub source: String,
    /// Local checkout path
    pub dest: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TlsConfig {
    pub key_path: PathBuf,
    pub cert_path: PathBuf,
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_key_bits")]
    pub key_bits: u32,
}

fn default_subject() -> String {
    "/CN=wpdev.local".to_string()
}

fn default_days() -> u32 {
    3650
}

fn default_key_bits() -> u32 {
    2048
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretConfig {
    pub name: String,
    pub path: PathBuf,
    /// Length of the generated token in bytes
    #[serde(default = "default_token_bytes")]
    pub bytes: u32,
}

fn default_token_bytes() -> u32 {
    32
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Flat directory of .sql files; the file stem is the database name
    pub directory: PathBuf,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Self::load(&dir.join(".wpdev.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert!(config.provision.packages.is_empty());
        assert!(config.resources.is_empty());
        assert!(config.tls.is_none());
        assert!(config.dumps.is_none());
        assert_eq!(config.network.attempts, 3);
        assert_eq!(config.network.timeout_secs, 5);
    }

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(
            r#"
            [provision]
            packages = ["nginx", "php-fpm", "mysql-server"]
            services = ["nginx", "mysql"]

            [network]
            probe_url = "http://example.com/ping"
            attempts = 5
            timeout_secs = 2

            [[resource]]
            name = "wordpress"
            source = "https://github.com/WordPress/WordPress.git"
            dest = "/var/www/wordpress"

            [[resource]]
            name = "wp-cli"
            source = "https://github.com/wp-cli/wp-cli.git"
            dest = "/opt/wp-cli"

            [tls]
            key_path = "/etc/ssl/private/dev.key"
            cert_path = "/etc/ssl/certs/dev.crt"

            [[secret]]
            name = "db-password"
            path = "/root/.wpdev/db_password"

            [dumps]
            directory = "/srv/dumps"
            "#,
        )
        .unwrap();

        assert_eq!(config.provision.packages.len(), 3);
        assert_eq!(config.provision.services, vec!["nginx", "mysql"]);
        assert_eq!(config.network.attempts, 5);
        assert_eq!(config.resources.len(), 2);
        assert_eq!(config.resources[1].name, "wp-cli");

        let tls = config.tls.unwrap();
        assert_eq!(tls.subject, "/CN=wpdev.local");
        assert_eq!(tls.days, 3650);
        assert_eq!(tls.key_bits, 2048);

        assert_eq!(config.secrets.len(), 1);
        assert_eq!(config.secrets[0].bytes, 32);
        assert_eq!(
            config.dumps.unwrap().directory,
            PathBuf::from("/srv/dumps")
        );
    }

    #[test]
    fn test_invalid_toml_is_a_parse_error() {
        let result: Result<Config, _> = toml::from_str("provision = 42");
        assert!(result.is_err());
    }
}
