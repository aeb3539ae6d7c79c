use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use config::{ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use redact::Secret;
use redact::serde::redact_secret;
use serde::{Deserialize, Serialize};

use crate::model::DEFAULT_TABLE;

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Serve from a file through DataFusion instead of postgres.
    pub source: Option<SourceConfig>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct HttpConfig {
    #[serde(default = "default_address")]
    pub address: SocketAddr,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            address: default_address(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DatabaseConfig {
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password", serialize_with = "redact_secret")]
    pub password: Secret<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_table")]
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig {
            user: default_user(),
            password: default_password(),
            host: default_host(),
            port: default_port(),
            name: default_name(),
            table: default_table(),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SourceConfig {
    Csv { path: PathBuf },
    Parquet { path: PathBuf },
}

fn default_address() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8501))
}

fn default_user() -> String {
    "postgres".to_string()
}

fn default_password() -> Secret<String> {
    Secret::new(String::new())
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    5432
}

fn default_name() -> String {
    "securecheck_db".to_string()
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

impl Config {
    /// Layers `./securecheck.toml`, `/etc/securecheck/securecheck.toml`, the
    /// optional `path` and `SECURECHECK_*` environment variables, later
    /// sources winning. Nested keys use `__`, e.g. `SECURECHECK_DATABASE__HOST`.
    pub fn new(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder()
            .add_source(File::with_name("./securecheck.toml").required(false))
            .add_source(File::with_name("/etc/securecheck/securecheck.toml").required(false));
        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }
        let builder = builder.add_source(
            Environment::with_prefix("SECURECHECK")
                .prefix_separator("_")
                .separator("__"),
        );
        Self::from_builder(builder)
    }

    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }
}
