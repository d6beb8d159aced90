use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use gtfs_structure_2::{WindowLimit, WindowPolicy, DEFAULT_MAX_WINDOW_DAYS};
use serde::Deserialize;

pub const MAX_WINDOW_DAYS_VAR: &str = "SERVICE_DAYS_MAX_WINDOW_DAYS";
pub const WINDOW_POLICY_VAR: &str = "SERVICE_DAYS_WINDOW_POLICY";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Configuration {
    /// Feed directory or zip archive holding calendar.txt and calendar_dates.txt
    pub feed_path: Option<PathBuf>,
    /// SQLite database receiving the service days, `:memory:` for a throwaway one
    pub database_path: String,
    pub max_window_days: u32,
    #[serde(deserialize_with = "deserialize_policy")]
    pub window_policy: WindowPolicy,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            feed_path: None,
            database_path: "service_days.db".to_string(),
            max_window_days: DEFAULT_MAX_WINDOW_DAYS,
            window_policy: WindowPolicy::default(),
        }
    }
}

fn deserialize_policy<'de, D>(deserializer: D) -> Result<WindowPolicy, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}

impl Configuration {
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        let config: Configuration = serde_json::from_str(json).context("Parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Read configuration {}", path.display()))?;
        Self::from_json_str(&json)
    }

    /// Environment variables win over the file
    pub fn apply_overrides<F>(mut self, var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(days) = var(MAX_WINDOW_DAYS_VAR) {
            self.max_window_days = days
                .parse()
                .with_context(|| format!("{MAX_WINDOW_DAYS_VAR}={days} is not a day count"))?;
        }
        if let Some(policy) = var(WINDOW_POLICY_VAR) {
            self.window_policy = policy.parse().map_err(anyhow::Error::msg)?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn with_env_overrides(self) -> anyhow::Result<Self> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.max_window_days == 0 {
            bail!("max_window_days must be at least 1");
        }
        Ok(())
    }

    pub fn window_limit(&self) -> WindowLimit {
        WindowLimit::new(self.max_window_days, self.window_policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Configuration::from_json_str("{}").unwrap();
        assert_eq!(Configuration::default(), config);
        assert_eq!(WindowLimit::default(), config.window_limit());
    }

    #[test]
    fn from_json() {
        let config = Configuration::from_json_str(
            r#"{"feed_path": "feeds/ttc", "database_path": ":memory:", "max_window_days": 400, "window_policy": "truncate"}"#,
        )
        .unwrap();
        assert_eq!(Some(PathBuf::from("feeds/ttc")), config.feed_path);
        assert_eq!(":memory:", config.database_path);
        assert_eq!(
            WindowLimit::new(400, WindowPolicy::Truncate),
            config.window_limit()
        );
    }

    #[test]
    fn invalid_json() {
        assert!(Configuration::from_json_str(r#"{"window_policy": "clip"}"#).is_err());
        assert!(Configuration::from_json_str(r#"{"max_window_days": 0}"#).is_err());
        assert!(Configuration::from_json_str(r#"{"max_window": 10}"#).is_err());
    }

    #[test]
    fn overrides() {
        let config = Configuration::default()
            .apply_overrides(|name| match name {
                MAX_WINDOW_DAYS_VAR => Some("30".to_string()),
                WINDOW_POLICY_VAR => Some("truncate".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(30, config.max_window_days);
        assert_eq!(WindowPolicy::Truncate, config.window_policy);

        let result = Configuration::default().apply_overrides(|name| match name {
            MAX_WINDOW_DAYS_VAR => Some("forever".to_string()),
            _ => None,
        });
        assert!(result.is_err());
    }
}
