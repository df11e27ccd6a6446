//! Server configuration

use std::path::PathBuf;

use fhir_bundle::{EntryPolicy, LoadOptions, PolicyParseError, ValuePolicy};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    InvalidPolicy {
        var: &'static str,
        #[source]
        source: PolicyParseError,
    },
}

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub bundle_path: PathBuf,
    pub bind_address: String,
    pub cors_origins: Vec<String>,
    pub extension_values: ValuePolicy,
    pub invalid_entries: EntryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bundle_path: PathBuf::from("data_json/bundle.json"),
            bind_address: "0.0.0.0:8080".to_string(),
            cors_origins: vec!["*".to_string()],
            extension_values: ValuePolicy::default(),
            invalid_entries: EntryPolicy::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through `lookup`; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let cors_origins = match lookup("CORS_ORIGINS") {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            None => defaults.cors_origins,
        };

        Ok(Self {
            bundle_path: lookup("BUNDLE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.bundle_path),
            bind_address: lookup("BIND_ADDRESS").unwrap_or(defaults.bind_address),
            cors_origins,
            extension_values: policy(&lookup, "EXTENSION_VALUE_POLICY")?
                .unwrap_or(defaults.extension_values),
            invalid_entries: policy(&lookup, "INVALID_ENTRY_POLICY")?
                .unwrap_or(defaults.invalid_entries),
        })
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            extension_values: self.extension_values,
            invalid_entries: self.invalid_entries,
        }
    }
}

fn policy<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr<Err = PolicyParseError>,
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .map(|raw| raw.parse())
        .transpose()
        .map_err(|source| ConfigError::InvalidPolicy { var, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.bundle_path, PathBuf::from("data_json/bundle.json"));
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.cors_origins, vec!["*"]);
        assert_eq!(config.extension_values, ValuePolicy::Strict);
        assert_eq!(config.invalid_entries, EntryPolicy::Reject);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("BUNDLE_PATH", "/srv/bundle.json"),
            ("CORS_ORIGINS", "http://a.test, http://b.test,"),
            ("EXTENSION_VALUE_POLICY", "first-populated"),
            ("INVALID_ENTRY_POLICY", "SKIP"),
        ]))
        .unwrap();

        assert_eq!(config.bundle_path, PathBuf::from("/srv/bundle.json"));
        assert_eq!(config.cors_origins, vec!["http://a.test", "http://b.test"]);

        let options = config.load_options();
        assert_eq!(options.extension_values, ValuePolicy::FirstPopulated);
        assert_eq!(options.invalid_entries, EntryPolicy::Skip);
    }

    #[test]
    fn test_invalid_policy_is_an_error() {
        let err = Config::from_lookup(lookup(&[("INVALID_ENTRY_POLICY", "ignore")])).unwrap_err();
        let ConfigError::InvalidPolicy { var, .. } = err;
        assert_eq!(var, "INVALID_ENTRY_POLICY");
    }
}
