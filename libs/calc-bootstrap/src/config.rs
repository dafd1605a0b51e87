//! Layered application configuration.
//!
//! Precedence, lowest to highest:
//! 1. built-in defaults
//! 2. YAML file passed with `--config`
//! 3. environment variables `CALC__<SECTION>__<KEY>` (e.g. `CALC__SERVER__LISTEN_ADDR`)
//! 4. CLI overrides ([`CliArgs`])
//!
//! Module sections live under `modules.<name>.config` and are deserialized on
//! demand by the owning module with [`AppConfig::module_config_or_default`].

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use anyhow::Context;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::logging::LoggingConfig;

/// Prefix for environment overrides; nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "CALC__";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:50051";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("module '{module}' config must be an object")]
    InvalidModuleStructure { module: String },
    #[error("invalid config for module '{module}': {source}")]
    InvalidConfig {
        module: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address the gRPC server binds, `host:port`. Port 0 picks a free port.
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub endpoint: String,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    #[serde(with = "humantime_serde")]
    pub rpc_timeout: Duration,
    pub max_retries: u32,
    /// Delay between two requests of a streamed call.
    #[serde(with = "humantime_serde")]
    pub stream_pacing: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_owned(),
            connect_timeout: Duration::from_secs(10),
            rpc_timeout: Duration::from_secs(30),
            max_retries: 3,
            stream_pacing: Duration::from_secs(1),
        }
    }
}

/// Root configuration shared by both binaries.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
    /// Raw per-module sections: `modules.<name> = { config: {...} }`.
    pub modules: BTreeMap<String, serde_json::Value>,
}

/// Command-line values that take precedence over every other layer.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    pub listen_addr: Option<String>,
    pub endpoint: Option<String>,
    pub stream_pacing: Option<Duration>,
    /// `-v` info, `-vv` debug, `-vvv` trace. Zero keeps the configured level.
    pub verbose: u8,
}

impl AppConfig {
    /// Load defaults, then the optional YAML file, then `CALC__*` variables.
    ///
    /// # Errors
    /// Returns an error if `path` is given but is not a file, or if any layer
    /// contains values that do not fit the schema.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(path) = path {
            if !path.is_file() {
                anyhow::bail!("config file does not exist: {}", path.display());
            }
            figment = figment.merge(Yaml::file(path));
        }

        figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("failed to load configuration")
    }

    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(addr) = &args.listen_addr {
            self.server.listen_addr.clone_from(addr);
        }
        if let Some(endpoint) = &args.endpoint {
            self.client.endpoint.clone_from(endpoint);
        }
        if let Some(pacing) = args.stream_pacing {
            self.client.stream_pacing = pacing;
        }
        let level = match args.verbose {
            0 => return,
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        self.logging.level = level.to_owned();
    }

    /// Deserialize `modules.<module>.config`, falling back to `T::default()`
    /// when the module or its `config` section is absent.
    ///
    /// # Errors
    /// Returns [`ConfigError`] if the module entry is not an object or the
    /// section does not match `T`.
    pub fn module_config_or_default<T: DeserializeOwned + Default>(
        &self,
        module: &str,
    ) -> Result<T, ConfigError> {
        let Some(raw) = self.modules.get(module) else {
            return Ok(T::default());
        };

        let obj = raw
            .as_object()
            .ok_or_else(|| ConfigError::InvalidModuleStructure {
                module: module.to_owned(),
            })?;

        let Some(section) = obj.get("config") else {
            return Ok(T::default());
        };

        serde_json::from_value(section.clone()).map_err(|source| ConfigError::InvalidConfig {
            module: module.to_owned(),
            source,
        })
    }

    /// Render the effective configuration as YAML.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_yaml(&self) -> anyhow::Result<String> {
        serde_saphyr::to_string(self).context("failed to render configuration as YAML")
    }
}

/// Serde adapter for `Duration` fields written as humantime strings ("250ms", "1m 30s").
pub mod humantime_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de};

    /// # Errors
    /// Propagates serializer errors.
    #[allow(clippy::trivially_copy_pass_by_ref)]
    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(&humantime::format_duration(*value))
    }

    /// # Errors
    /// Fails when the string is not a valid humantime duration.
    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let raw = String::deserialize(d)?;
        humantime::parse_duration(&raw).map_err(de::Error::custom)
    }
}
