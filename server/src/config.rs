use serde::Deserialize;
use std::path::Path;
use tracing::info;

/// Top-level configuration, loaded from tempo.toml.
#[derive(Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseSection,
    pub sweep: SweepSection,
}

#[derive(Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "sqlite:tempo.db?mode=rwc".into(),
        }
    }
}

#[derive(Deserialize)]
#[serde(default)]
pub struct SweepSection {
    /// Minutes between periodic sanitization sweeps.
    pub interval_minutes: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self {
            interval_minutes: 60,
        }
    }
}

impl AppConfig {
    /// Load config from a TOML file. Falls back to defaults if the file
    /// doesn't exist. Environment variables override TOML values.
    pub fn load(path: &str) -> Self {
        let mut config = if Path::new(path).exists() {
            let contents = std::fs::read_to_string(path)
                .unwrap_or_else(|e| panic!("failed to read config file {}: {}", path, e));
            toml::from_str(&contents)
                .unwrap_or_else(|e| panic!("failed to parse config file {}: {}", path, e))
        } else {
            info!("No config file found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_overrides();
        config
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = std::env::var("SWEEP_INTERVAL_MINUTES")
            && let Ok(minutes) = v.parse()
        {
            self.sweep.interval_minutes = minutes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.database.url, "sqlite:tempo.db?mode=rwc");
        assert_eq!(config.sweep.interval_minutes, 60);
    }

    #[test]
    fn test_parse_partial_toml() {
        let config: AppConfig = toml::from_str(
            "[database]\nurl = \"sqlite::memory:\"\n",
        )
        .unwrap();
        assert_eq!(config.database.url, "sqlite::memory:");
        // Unspecified sections keep their defaults
        assert_eq!(config.sweep.interval_minutes, 60);
    }

    #[test]
    fn test_parse_sweep_section() {
        let config: AppConfig = toml::from_str("[sweep]\ninterval_minutes = 5\n").unwrap();
        assert_eq!(config.sweep.interval_minutes, 5);
    }
}
