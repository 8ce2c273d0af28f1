//! Gateway configuration.
//!
//! Loads adapter credentials from a TOML file with support for environment
//! variable expansion in string values. Variables use `$VAR` or `${VAR}`
//! syntax; a `.env` file in the working directory is read first.
//!
//! # Example Configuration
//!
//! ```toml
//! [gateways.nmi]
//! test = true
//! credentials = { security_key = "$NMI_SECURITY_KEY" }
//!
//! [gateways.moneris]
//! test = true
//! application_id = "my-store/1.0"
//! timeout_secs = 30
//! credentials = { store_id = "store1", api_token = "${MONERIS_API_TOKEN}" }
//! ```
//!
//! # Environment Variables
//!
//! - `CARDGATE_CONFIG` - Path to the configuration file (default: `cardgate.toml`)
//! - Credential values referenced by `$VAR` in the file

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "CARDGATE_CONFIG";

/// Configuration file used when [`CONFIG_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "cardgate.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that failed.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A gateway section is missing.
    #[error("no configuration for gateway {0:?}")]
    MissingGateway(String),
}

/// Top-level configuration: one entry per adapter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewaysConfig {
    /// Adapter entries keyed by adapter name (`nmi`, `stripe`, `moneris`).
    #[serde(default)]
    pub gateways: BTreeMap<String, GatewayConfigEntry>,
}

/// Configuration for a single adapter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfigEntry {
    /// Use the processor's sandbox environment.
    #[serde(default)]
    pub test: bool,

    /// Identifier of the integrating application, sent by adapters that
    /// support one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_id: Option<String>,

    /// Adapter-specific credential fields.
    #[serde(default)]
    pub credentials: Credentials,

    /// Request timeout for the HTTP transport.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

impl GatewayConfigEntry {
    /// The request timeout, if configured.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Credential fields whose values never appear in `Debug` output.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials(BTreeMap<String, String>);

impl Credentials {
    /// Creates credentials from `(field, value)` pairs.
    #[must_use]
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// Returns a non-empty field value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Config`](crate::GatewayError::Config) if the
    /// field is missing or empty.
    pub fn require(&self, field: &str) -> Result<&str, crate::GatewayError> {
        self.get(field)
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| crate::GatewayError::config(format!("missing credential `{field}`")))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.0.keys().map(|k| (k, crate::scrub::FILTERED)))
            .finish()
    }
}

impl GatewaysConfig {
    /// Loads configuration from the path given by `CARDGATE_CONFIG`,
    /// falling back to `cardgate.toml` in the current directory.
    ///
    /// A `.env` file, if present, is loaded into the process environment
    /// before expansion.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        Self::load_from(&path)
    }

    /// Loads configuration from a specific file path.
    ///
    /// A missing file yields the default (empty) configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let content = if Path::new(path).exists() {
            std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.to_owned(),
                source,
            })?
        } else {
            String::new()
        };
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text, expanding environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(&expand_env_vars(content))?)
    }

    /// Returns the entry for a gateway.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingGateway`] if there is no such section.
    pub fn gateway(&self, name: &str) -> Result<&GatewayConfigEntry, ConfigError> {
        self.gateways
            .get(name)
            .ok_or_else(|| ConfigError::MissingGateway(name.to_owned()))
    }
}

/// Expands `$VAR` and `${VAR}` patterns in a string from environment variables.
///
/// Unresolved variables are left as-is.
fn expand_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let braced = chars.next_if_eq(&'{').is_some();
        let mut name = String::new();
        let mut closed = false;
        while let Some(&c) = chars.peek() {
            if braced && c == '}' {
                chars.next();
                closed = true;
                break;
            }
            if !braced && !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            name.push(c);
            chars.next();
        }

        let resolved = (!name.is_empty() && (closed || !braced))
            .then(|| std::env::var(&name).ok())
            .flatten();
        match resolved {
            Some(value) => result.push_str(&value),
            None => {
                result.push('$');
                if braced {
                    result.push('{');
                }
                result.push_str(&name);
                if closed {
                    result.push('}');
                }
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: tests in this module use variable names no other test reads.
        unsafe {
            std::env::set_var("CARDGATE_TEST_KEY", "secret-1");
        }
        assert_eq!(expand_env_vars("key = \"$CARDGATE_TEST_KEY\""), "key = \"secret-1\"");
        assert_eq!(expand_env_vars("${CARDGATE_TEST_KEY}/x"), "secret-1/x");
        assert_eq!(
            expand_env_vars("$CARDGATE_TEST_UNSET_VAR and ${CARDGATE_TEST_UNSET_VAR}"),
            "$CARDGATE_TEST_UNSET_VAR and ${CARDGATE_TEST_UNSET_VAR}"
        );
        assert_eq!(expand_env_vars("cost: $ 5"), "cost: $ 5");
        assert_eq!(expand_env_vars("${CARDGATE_TEST_KEY"), "${CARDGATE_TEST_KEY");
    }

    #[test]
    fn test_from_toml() {
        // SAFETY: see test_expand_env_vars.
        unsafe {
            std::env::set_var("CARDGATE_TEST_NMI_KEY", "6457Thfj624V5r7WUwc5v6a68Zsd6YEm");
        }
        let config = GatewaysConfig::from_toml(
            r#"
            [gateways.nmi]
            test = true
            credentials = { security_key = "$CARDGATE_TEST_NMI_KEY" }

            [gateways.moneris]
            application_id = "shop/2.1"
            timeout_secs = 15
            credentials = { store_id = "store1", api_token = "yesguy" }
            "#,
        )
        .unwrap();

        let nmi = config.gateway("nmi").unwrap();
        assert!(nmi.test);
        assert_eq!(
            nmi.credentials.require("security_key").unwrap(),
            "6457Thfj624V5r7WUwc5v6a68Zsd6YEm"
        );
        assert!(nmi.timeout().is_none());

        let moneris = config.gateway("moneris").unwrap();
        assert!(!moneris.test);
        assert_eq!(moneris.application_id.as_deref(), Some("shop/2.1"));
        assert_eq!(moneris.credentials.require("api_token").unwrap(), "yesguy");
        assert_eq!(moneris.timeout(), Some(Duration::from_secs(15)));

        assert!(matches!(
            config.gateway("stripe"),
            Err(ConfigError::MissingGateway(_))
        ));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = GatewaysConfig::load_from("/nonexistent/cardgate.toml").unwrap();
        assert!(config.gateways.is_empty());
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        assert!(matches!(
            GatewaysConfig::from_toml("[gateways.nmi\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_credentials_debug_redacts_values() {
        let credentials = Credentials::from_pairs([("login", "demo"), ("password", "hunter2")]);
        let debug = format!("{credentials:?}");
        assert!(debug.contains("login"));
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("demo"));
        assert!(credentials.require("password").is_ok());
        assert!(credentials.require("api_key").is_err());
        assert!(Credentials::from_pairs([("api_key", "  ")]).require("api_key").is_err());
    }
}
