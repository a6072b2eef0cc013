//! Hosts file schema (hosts.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::host::HostId;
use crate::identifier::Granularity;
use crate::report::OBJECT_NAME_FIELD;

fn default_port() -> u16 {
    5432
}

fn default_max_concurrency() -> usize {
    8
}

fn default_excluded_schemas() -> Vec<String> {
    vec!["information_schema".to_string(), "pg_catalog".to_string()]
}

/// Connection descriptor for one host
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Display label; defaults to `host:port/dbname`
    #[serde(default)]
    pub name: Option<String>,

    /// Hostname or IP address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Login user
    pub user: String,

    /// Inline password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable holding the password
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Database to inventory
    pub dbname: String,

    /// Connect over TLS
    #[serde(default)]
    pub tls: bool,

    /// Connection timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_secs: Option<u64>,

    /// `application_name` reported to the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
}

impl HostConfig {
    /// Create a descriptor with defaults for everything optional
    pub fn new(host: impl Into<String>, user: impl Into<String>, dbname: impl Into<String>) -> Self {
        Self {
            name: None,
            host: host.into(),
            port: default_port(),
            user: user.into(),
            password: None,
            password_env: None,
            dbname: dbname.into(),
            tls: false,
            connect_timeout_secs: None,
            application_name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Stable identity used as report column and map key
    pub fn id(&self) -> HostId {
        match &self.name {
            Some(name) => HostId::new(name.clone()),
            None => HostId::new(format!("{}:{}/{}", self.host, self.port, self.dbname)),
        }
    }

    /// Resolve the password from the inline value or `password_env`
    pub fn resolve_password(&self) -> Result<Option<String>, ConfigError> {
        if let Some(password) = &self.password {
            return Ok(Some(password.clone()));
        }

        match &self.password_env {
            Some(var) => std::env::var(var).map(Some).map_err(|_| ConfigError::MissingPassword {
                host: self.id().to_string(),
                var: var.clone(),
            }),
            None => Ok(None),
        }
    }
}

// Hand-written so passwords never reach logs
impl fmt::Debug for HostConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostConfig")
            .field("name", &self.name)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("password_env", &self.password_env)
            .field("dbname", &self.dbname)
            .field("tls", &self.tls)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("application_name", &self.application_name)
            .finish()
    }
}

/// Main hosts file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostsFile {
    /// Baseline host label; defaults to the first configured host
    #[serde(default)]
    pub baseline: Option<String>,

    /// Comparison level
    #[serde(default)]
    pub granularity: Granularity,

    /// Schemas skipped on every host
    #[serde(default = "default_excluded_schemas")]
    pub exclude_schemas: Vec<String>,

    /// Upper bound on hosts surveyed at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-host fetch timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Hosts to inventory, in report column order
    #[serde(default)]
    pub hosts: Vec<HostConfig>,
}

impl Default for HostsFile {
    fn default() -> Self {
        Self {
            baseline: None,
            granularity: Granularity::default(),
            exclude_schemas: default_excluded_schemas(),
            max_concurrency: default_max_concurrency(),
            timeout_secs: None,
            hosts: Vec::new(),
        }
    }
}

impl HostsFile {
    /// Load and validate a hosts file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate a hosts file from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let file: HostsFile = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        file.validate()?;
        Ok(file)
    }

    /// Check structural invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hosts.is_empty() {
            return Err(ConfigError::NoHosts);
        }

        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid("max_concurrency must be at least 1".to_string()));
        }

        let mut seen = HashSet::new();
        for host in &self.hosts {
            let id = host.id();
            if id.as_str() == OBJECT_NAME_FIELD {
                return Err(ConfigError::ReservedHostName(id.to_string()));
            }
            if !seen.insert(id.clone()) {
                return Err(ConfigError::DuplicateHost(id.to_string()));
            }
        }

        if let Some(baseline) = &self.baseline {
            self.find_host(baseline)?;
        }

        Ok(())
    }

    /// Host identities in configured order
    pub fn host_ids(&self) -> Vec<HostId> {
        self.hosts.iter().map(HostConfig::id).collect()
    }

    /// Resolve the baseline host
    ///
    /// An explicit `requested` label wins over the file's `baseline`; with
    /// neither, the first configured host is used.
    pub fn baseline_id(&self, requested: Option<&str>) -> Result<HostId, ConfigError> {
        match requested.or(self.baseline.as_deref()) {
            Some(label) => self.find_host(label),
            None => self.hosts.first().map(HostConfig::id).ok_or(ConfigError::NoHosts),
        }
    }

    fn find_host(&self, label: &str) -> Result<HostId, ConfigError> {
        self.hosts
            .iter()
            .map(HostConfig::id)
            .find(|id| id.as_str() == label)
            .ok_or_else(|| ConfigError::UnknownBaseline(label.to_string()))
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No hosts configured")]
    NoHosts,

    #[error("Host '{0}' is configured more than once")]
    DuplicateHost(String),

    #[error("Baseline '{0}' is not a configured host")]
    UnknownBaseline(String),

    #[error("Host label '{0}' is reserved for the report's identifier column")]
    ReservedHostName(String),

    #[error("Password for host '{host}' expected in environment variable {var}")]
    MissingPassword { host: String, var: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
