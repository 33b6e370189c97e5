//! Sync Configuration
//!
//! Configuration for the access backend connection, the monitored site and
//! the refresh cycle. Supports loading from environment variables with the
//! `ACCESS_API_` and `PRESENCE_` prefixes; the site layout can also come from
//! a JSON file named by `PRESENCE_SITE_FILE`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use presence_core::{FieldMapping, StatusPolicy, ZoneClassification};

use crate::error::{ConfigError, ConfigResult};

/// Environment variable holding the bearer token; rewritten on re-authentication
pub const TOKEN_ENV_KEY: &str = "ACCESS_API_TOKEN";

/// Longest event window accepted, in days
pub const MAX_LOOKBACK_DAYS: u32 = 3660;

/// Access backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessApiConfig {
    /// Base URL, e.g. `https://access.example.org`
    pub base_url: String,
    /// Login for the credential exchange
    pub login: String,
    /// Password for the credential exchange
    #[serde(skip_serializing)]
    pub password: String,
    /// Bearer token from the last successful exchange, may be empty
    #[serde(skip_serializing)]
    pub token: String,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl AccessApiConfig {
    pub fn new(base_url: &str, login: &str, password: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            login: login.to_string(),
            password: password.to_string(),
            token: String::new(),
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_token(mut self, token: &str) -> Self {
        self.token = token.to_string();
        self
    }

    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - ACCESS_API_URL: backend base URL (required)
    /// - ACCESS_API_LOGIN: login (required)
    /// - ACCESS_API_PASSWORD: password (required)
    /// - ACCESS_API_TOKEN: current bearer token (optional)
    /// - ACCESS_API_TIMEOUT_SECS: request timeout in seconds
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            base_url: env::var("ACCESS_API_URL").unwrap_or_default(),
            login: env::var("ACCESS_API_LOGIN").unwrap_or_default(),
            password: env::var("ACCESS_API_PASSWORD").unwrap_or_default(),
            token: env::var(TOKEN_ENV_KEY).unwrap_or_default(),
            timeout_secs: env_parse("ACCESS_API_TIMEOUT_SECS")?.unwrap_or_else(default_timeout),
        };
        config.validate()?;
        Ok(config)
    }

    /// Credentials must be present for the process to start
    pub fn validate(&self) -> ConfigResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Missing("ACCESS_API_URL".to_string()));
        }
        if self.login.trim().is_empty() {
            return Err(ConfigError::Missing("ACCESS_API_LOGIN".to_string()));
        }
        if self.password.is_empty() {
            return Err(ConfigError::Missing("ACCESS_API_PASSWORD".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::invalid(
                "ACCESS_API_URL",
                format!("expected an http(s) URL, got '{}'", self.base_url),
            ));
        }
        Ok(())
    }
}

/// Layout of the monitored site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Organizational division whose members are tracked
    pub division_id: i64,
    /// Zone ids passed to the events endpoint
    pub zone_ids: Vec<u32>,
    /// Group key (as used by consumers) to group label (as stored on records)
    pub groups: BTreeMap<String, String>,
    /// Zone names classified as entry/exit
    pub zones: ZoneClassification,
    /// Attribute names carrying group and location
    pub fields: FieldMapping,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let groups: BTreeMap<String, String> = [
            ("obch1", "Общежитие №1"),
            ("obch2", "Общежитие №2"),
        ]
        .into_iter()
        .map(|(key, label)| (key.to_string(), label.to_string()))
        .collect();

        let zones = ZoneClassification::new(groups.values().cloned(), ["Неконтролируемая территория"]);

        Self {
            division_id: 5,
            zone_ids: vec![1, 2],
            groups,
            zones,
            fields: FieldMapping::new("Общежитие", "№ комнаты"),
        }
    }
}

impl SiteConfig {
    /// Load a site description from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let site_error = |message: String| ConfigError::SiteFile {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| site_error(e.to_string()))?;
        let site: Self = serde_json::from_str(&raw).map_err(|e| site_error(e.to_string()))?;
        site.validate()?;
        Ok(site)
    }

    /// Default site, or the file named by PRESENCE_SITE_FILE, with
    /// PRESENCE_DIVISION_ID and PRESENCE_ZONE_IDS applied on top
    pub fn from_env() -> ConfigResult<Self> {
        let mut site = match env::var("PRESENCE_SITE_FILE") {
            Ok(path) if !path.trim().is_empty() => Self::from_file(path.trim())?,
            _ => Self::default(),
        };

        if let Some(division_id) = env_parse("PRESENCE_DIVISION_ID")? {
            site.division_id = division_id;
        }
        if let Ok(raw) = env::var("PRESENCE_ZONE_IDS") {
            site.zone_ids = parse_zone_ids(&raw)?;
        }

        site.validate()?;
        Ok(site)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.groups.is_empty() {
            return Err(ConfigError::invalid("groups", "at least one group is required"));
        }
        if self.zone_ids.is_empty() {
            return Err(ConfigError::invalid("zone_ids", "at least one zone id is required"));
        }
        Ok(())
    }

    /// Group label for a consumer-facing key
    pub fn group_label(&self, key: &str) -> Option<&str> {
        self.groups.get(key).map(String::as_str)
    }

    /// Zone ids in the form the events endpoint expects
    pub fn zone_ids_param(&self) -> String {
        self.zone_ids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Refresh cycle tuning and local file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Trailing event window in days
    pub lookback_days: u32,
    /// Maximum event rows requested per refresh
    pub event_row_cap: u32,
    /// Person details fetched concurrently per batch
    pub batch_size: usize,
    /// Refresh period in seconds
    pub refresh_interval_secs: u64,
    /// Durable snapshot file
    pub snapshot_path: PathBuf,
    /// File the bearer token is persisted into
    pub env_file: PathBuf,
    /// Handling of persons without a new event
    pub status_policy: StatusPolicy,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            lookback_days: 14,
            event_row_cap: 32_000,
            batch_size: 256,
            refresh_interval_secs: 300,
            snapshot_path: PathBuf::from("students.db.json"),
            env_file: PathBuf::from(".env"),
            status_policy: StatusPolicy::ResetEachCycle,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables
    ///
    /// Environment variables:
    /// - PRESENCE_LOOKBACK_DAYS
    /// - PRESENCE_EVENT_ROW_CAP
    /// - PRESENCE_BATCH_SIZE
    /// - PRESENCE_REFRESH_INTERVAL_SECS
    /// - PRESENCE_SNAPSHOT_PATH
    /// - PRESENCE_ENV_FILE
    /// - PRESENCE_STATUS_POLICY (`reset` or `retain`)
    pub fn from_env() -> ConfigResult<Self> {
        let defaults = Self::default();

        let status_policy = match env::var("PRESENCE_STATUS_POLICY") {
            Ok(raw) => raw
                .parse::<StatusPolicy>()
                .map_err(|e| ConfigError::invalid("PRESENCE_STATUS_POLICY", e.to_string()))?,
            Err(_) => defaults.status_policy,
        };

        let config = Self {
            lookback_days: env_parse("PRESENCE_LOOKBACK_DAYS")?.unwrap_or(defaults.lookback_days),
            event_row_cap: env_parse("PRESENCE_EVENT_ROW_CAP")?.unwrap_or(defaults.event_row_cap),
            batch_size: env_parse("PRESENCE_BATCH_SIZE")?.unwrap_or(defaults.batch_size),
            refresh_interval_secs: env_parse("PRESENCE_REFRESH_INTERVAL_SECS")?
                .unwrap_or(defaults.refresh_interval_secs),
            snapshot_path: env::var("PRESENCE_SNAPSHOT_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.snapshot_path),
            env_file: env::var("PRESENCE_ENV_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.env_file),
            status_policy,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.lookback_days == 0 || self.lookback_days > MAX_LOOKBACK_DAYS {
            return Err(ConfigError::invalid(
                "PRESENCE_LOOKBACK_DAYS",
                format!("must be between 1 and {}", MAX_LOOKBACK_DAYS),
            ));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::invalid("PRESENCE_BATCH_SIZE", "must be at least 1"));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::invalid(
                "PRESENCE_REFRESH_INTERVAL_SECS",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Complete service configuration
#[derive(Debug, Clone)]
pub struct PresenceConfig {
    pub api: AccessApiConfig,
    pub site: SiteConfig,
    pub sync: SyncConfig,
}

impl PresenceConfig {
    pub fn from_env() -> ConfigResult<Self> {
        Ok(Self {
            api: AccessApiConfig::from_env()?,
            site: SiteConfig::from_env()?,
            sync: SyncConfig::from_env()?,
        })
    }
}

/// Parse a comma separated zone id list such as `1, 2`
pub fn parse_zone_ids(raw: &str) -> ConfigResult<Vec<u32>> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u32>().map_err(|e| {
                ConfigError::invalid("PRESENCE_ZONE_IDS", format!("'{}': {}", part, e))
            })
        })
        .collect()
}

fn env_parse<T>(key: &str) -> ConfigResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::invalid(key, e.to_string())),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use presence_core::PresenceStatus;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_site() {
        let site = SiteConfig::default();
        assert_eq!(site.division_id, 5);
        assert_eq!(site.zone_ids_param(), "1, 2");
        assert_eq!(site.group_label("obch1"), Some("Общежитие №1"));
        assert_eq!(site.group_label("moroz"), None);
        assert_eq!(
            site.zones.classify_zone("Общежитие №2"),
            PresenceStatus::Present
        );
        assert_eq!(
            site.zones.classify_zone("Неконтролируемая территория"),
            PresenceStatus::Absent
        );
    }

    #[test]
    fn test_default_sync() {
        let sync = SyncConfig::default();
        assert_eq!(sync.lookback_days, 14);
        assert_eq!(sync.event_row_cap, 32_000);
        assert_eq!(sync.batch_size, 256);
        assert_eq!(sync.refresh_interval_secs, 300);
        assert_eq!(sync.status_policy, StatusPolicy::ResetEachCycle);
        assert!(sync.validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_are_fatal() {
        let config = AccessApiConfig::new("https://access.local", "", "secret");
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("ACCESS_API_LOGIN".to_string()))
        );

        let config = AccessApiConfig::new("", "admin", "secret");
        assert_eq!(
            config.validate(),
            Err(ConfigError::Missing("ACCESS_API_URL".to_string()))
        );

        let config = AccessApiConfig::new("access.local", "admin", "secret");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));

        assert!(AccessApiConfig::new("https://access.local", "admin", "secret")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_lookback_bounds() {
        let huge = SyncConfig {
            lookback_days: 4_000_000_000,
            ..SyncConfig::default()
        };
        assert!(matches!(
            huge.validate(),
            Err(ConfigError::Invalid { ref key, .. }) if key == "PRESENCE_LOOKBACK_DAYS"
        ));

        let zero = SyncConfig {
            lookback_days: 0,
            ..SyncConfig::default()
        };
        assert!(zero.validate().is_err());

        let longest = SyncConfig {
            lookback_days: MAX_LOOKBACK_DAYS,
            ..SyncConfig::default()
        };
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_parse_zone_ids() {
        assert_eq!(parse_zone_ids("1, 2,3").unwrap(), vec![1, 2, 3]);
        assert_eq!(parse_zone_ids("4,").unwrap(), vec![4]);
        assert!(parse_zone_ids("1, two").is_err());
    }

    #[test]
    fn test_site_from_file() {
        let site = SiteConfig {
            division_id: 12,
            zone_ids: vec![7],
            groups: BTreeMap::from([("north".to_string(), "North Hall".to_string())]),
            zones: ZoneClassification::new(["North Hall"], ["Street"]),
            fields: FieldMapping::new("Hall", "Room"),
        };

        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", serde_json::to_string(&site).unwrap()).unwrap();

        let loaded = SiteConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, site);
    }

    #[test]
    fn test_site_file_errors() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert!(matches!(
            SiteConfig::from_file(file.path()),
            Err(ConfigError::SiteFile { .. })
        ));
    }
}
