//! View configuration and process-level cache settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Reserved enum mapping method: map constants by their declared name.
pub const DEFAULT_ENUM_MAPPING_METHOD: &str = "name";

/// Default descriptor cache expiry, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 60;

/// Environment variable overriding the descriptor cache expiry.
pub const CACHE_TTL_ENV: &str = "MAPVIEW_DESCRIPTOR_CACHE_TTL_SECS";

/// Options carried by every view and propagated to the views nested in it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Forbid setters, adders and removers.
    pub immutable: bool,
    /// Read absent collection attributes as empty collections.
    pub null_safe_collection: bool,
    /// Attribute compared by `equals`; canonical form comparison when unset.
    pub identifier_field: Option<String>,
    /// Property used to map stored scalars to enum constants.
    pub enum_mapping_method: String,
    /// Read absent optional attributes as `Optional.empty` instead of null.
    pub map_null_to_optional_absent: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            immutable: false,
            null_safe_collection: false,
            identifier_field: None,
            enum_mapping_method: DEFAULT_ENUM_MAPPING_METHOD.to_string(),
            map_null_to_optional_absent: false,
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    pub fn with_null_safe_collection(mut self, null_safe_collection: bool) -> Self {
        self.null_safe_collection = null_safe_collection;
        self
    }

    pub fn with_identifier_field(mut self, field: impl Into<String>) -> Self {
        self.identifier_field = Some(field.into());
        self
    }

    pub fn without_identifier_field(mut self) -> Self {
        self.identifier_field = None;
        self
    }

    pub fn with_enum_mapping_method(mut self, method: impl Into<String>) -> Self {
        self.enum_mapping_method = method.into();
        self
    }

    pub fn with_map_null_to_optional_absent(mut self, enabled: bool) -> Self {
        self.map_null_to_optional_absent = enabled;
        self
    }
}

/// Descriptor cache settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Idle time after which a cached type table expires.
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: DEFAULT_CACHE_TTL_SECS,
        }
    }
}

impl CacheSettings {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            ttl_secs: ttl.as_secs(),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Read settings from [`CACHE_TTL_ENV`], falling back to the defaults.
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(CACHE_TTL_ENV).ok().as_deref())
    }

    fn from_env_value(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => Self::default(),
            Some(raw) => match raw.parse::<u64>() {
                Ok(ttl_secs) => Self { ttl_secs },
                Err(err) => {
                    warn!(
                        var = CACHE_TTL_ENV,
                        value = raw,
                        error = %err,
                        "invalid descriptor cache ttl, using default"
                    );
                    Self::default()
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(!config.immutable);
        assert!(!config.null_safe_collection);
        assert_eq!(config.identifier_field, None);
        assert_eq!(config.enum_mapping_method, "name");
        assert!(!config.map_null_to_optional_absent);
    }

    #[test]
    fn test_config_deserializes_camel_case_with_defaults() {
        let config: Config = serde_json::from_value(json!({
            "immutable": true,
            "identifierField": "id",
            "enumMappingMethod": "ordinal"
        }))
        .unwrap();

        assert_eq!(
            config,
            Config::new()
                .with_immutable(true)
                .with_identifier_field("id")
                .with_enum_mapping_method("ordinal")
        );
    }

    #[test]
    fn test_cache_settings_from_env_value() {
        assert_eq!(CacheSettings::from_env_value(None).ttl_secs, 60);
        assert_eq!(CacheSettings::from_env_value(Some("5")).ttl_secs, 5);
        assert_eq!(CacheSettings::from_env_value(Some(" 7 ")).ttl_secs, 7);
        assert_eq!(CacheSettings::from_env_value(Some("soon")).ttl_secs, 60);
        assert_eq!(
            CacheSettings::with_ttl(Duration::from_secs(3)).ttl(),
            Duration::from_secs(3)
        );
    }
}
