//! Layered configuration: defaults, then `studio.ron`, then environment and flags.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context};
use serde::Deserialize;
use studio_core::{ChatHistoryMode, Settings, DEFAULT_API_BASE, DEFAULT_POLL_INTERVAL};
use studio_engine::{ApiSettings, EngineConfig};
use studio_logging::{studio_info, LogDestination};

const DEFAULT_CONFIG_FILE: &str = "studio.ron";
const DEFAULT_LOG_FILE: &str = "studio.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ChatHistorySetting {
    LatestTurn,
    FullHistory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum LogSetting {
    Terminal,
    File,
    Both,
}

/// Contents of the RON config file. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct FileConfig {
    pub api_base: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub transfer_timeout_secs: Option<u64>,
    pub max_download_bytes: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub chat_history: Option<ChatHistorySetting>,
    pub log_destination: Option<LogSetting>,
    pub log_file: Option<PathBuf>,
}

/// Values given on the command line (or through `STUDIO_API_BASE`).
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub api_base: Option<String>,
    pub poll_interval_secs: Option<u64>,
    pub output_dir: Option<PathBuf>,
    pub full_history: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AppConfig {
    pub api: ApiSettings,
    pub poll_interval: Duration,
    pub output_dir: PathBuf,
    pub chat_history: ChatHistoryMode,
    pub log_destination: LogDestination,
}

impl AppConfig {
    /// Reads `explicit` (which must exist) or `./studio.ron` (if present) and
    /// applies `overrides` on top.
    pub fn load(explicit: Option<&Path>, overrides: Overrides) -> anyhow::Result<Self> {
        let file = match explicit {
            Some(path) => read_file_config(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.is_file() {
                    read_file_config(default_path)?
                } else {
                    FileConfig::default()
                }
            }
        };
        Self::resolve(file, overrides)
    }

    pub fn resolve(file: FileConfig, overrides: Overrides) -> anyhow::Result<Self> {
        let defaults = ApiSettings::default();
        let secs = |value: Option<u64>, fallback: Duration| {
            value.map(Duration::from_secs).unwrap_or(fallback)
        };

        let api_base = overrides
            .api_base
            .or(file.api_base)
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());
        ensure!(!api_base.trim().is_empty(), "api_base must not be empty");

        let poll_interval = secs(
            overrides.poll_interval_secs.or(file.poll_interval_secs),
            DEFAULT_POLL_INTERVAL,
        );
        ensure!(!poll_interval.is_zero(), "poll interval must be at least one second");

        let chat_history = if overrides.full_history {
            ChatHistoryMode::FullHistory
        } else {
            match file.chat_history {
                Some(ChatHistorySetting::FullHistory) => ChatHistoryMode::FullHistory,
                Some(ChatHistorySetting::LatestTurn) | None => ChatHistoryMode::LatestTurn,
            }
        };

        let log_file = file
            .log_file
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE));
        let log_destination = match file.log_destination {
            Some(LogSetting::File) => LogDestination::File(log_file),
            Some(LogSetting::Both) => LogDestination::Both(log_file),
            Some(LogSetting::Terminal) | None => LogDestination::Terminal,
        };

        Ok(Self {
            api: ApiSettings {
                base_url: api_base.trim().to_string(),
                connect_timeout: secs(file.connect_timeout_secs, defaults.connect_timeout),
                request_timeout: secs(file.request_timeout_secs, defaults.request_timeout),
                transfer_timeout: secs(file.transfer_timeout_secs, defaults.transfer_timeout),
                max_download_bytes: file
                    .max_download_bytes
                    .unwrap_or(defaults.max_download_bytes),
            },
            poll_interval,
            output_dir: overrides
                .output_dir
                .or(file.output_dir)
                .unwrap_or_else(|| PathBuf::from("output")),
            chat_history,
            log_destination,
        })
    }

    pub fn core_settings(&self) -> Settings {
        Settings {
            api_base: self.api.base_url.clone(),
            poll_interval: self.poll_interval,
            chat_history: self.chat_history,
        }
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            api: self.api.clone(),
            output_dir: self.output_dir.clone(),
            preview_dir: None,
        }
    }

    pub fn log_summary(&self) {
        studio_info!(
            "Config: api_base={} poll_interval={:?} output_dir={:?} chat_history={:?}",
            self.api.base_url,
            self.poll_interval,
            self.output_dir,
            self.chat_history
        );
    }
}

fn read_file_config(path: &Path) -> anyhow::Result<FileConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = AppConfig::resolve(FileConfig::default(), Overrides::default()).unwrap();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_secs(5));
        assert_eq!(config.api.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.api.request_timeout, Duration::from_secs(60));
        assert_eq!(config.api.transfer_timeout, Duration::from_secs(600));
        assert_eq!(config.output_dir, PathBuf::from("output"));
        assert_eq!(config.chat_history, ChatHistoryMode::LatestTurn);
        assert_eq!(config.log_destination, LogDestination::Terminal);
    }

    #[test]
    fn ron_file_is_parsed() {
        let text = r#"(
            api_base: Some("http://gpu-box:9000/"),
            poll_interval_secs: Some(2),
            chat_history: Some(full_history),
            log_destination: Some(both),
        )"#;
        let file: FileConfig = ron::from_str(text).unwrap();
        let config = AppConfig::resolve(file, Overrides::default()).unwrap();
        assert_eq!(config.api.base_url, "http://gpu-box:9000/");
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.chat_history, ChatHistoryMode::FullHistory);
        assert_eq!(
            config.log_destination,
            LogDestination::Both(PathBuf::from("studio.log"))
        );
    }

    #[test]
    fn flags_override_file() {
        let file = FileConfig {
            api_base: Some("http://from-file".to_string()),
            poll_interval_secs: Some(9),
            output_dir: Some(PathBuf::from("file-out")),
            ..FileConfig::default()
        };
        let overrides = Overrides {
            api_base: Some("http://from-flag".to_string()),
            poll_interval_secs: None,
            output_dir: Some(PathBuf::from("flag-out")),
            full_history: true,
        };
        let config = AppConfig::resolve(file, overrides).unwrap();
        assert_eq!(config.api.base_url, "http://from-flag");
        assert_eq!(config.poll_interval, Duration::from_secs(9));
        assert_eq!(config.output_dir, PathBuf::from("flag-out"));
        assert_eq!(config.chat_history, ChatHistoryMode::FullHistory);
    }

    #[test]
    fn zero_poll_interval_is_rejected() {
        let overrides = Overrides {
            poll_interval_secs: Some(0),
            ..Overrides::default()
        };
        assert!(AppConfig::resolve(FileConfig::default(), overrides).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(ron::from_str::<FileConfig>("(api_bse: None)").is_err());
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = AppConfig::load(Some(&dir.path().join("nope.ron")), Overrides::default())
            .unwrap_err();
        assert!(err.to_string().contains("reading config file"));
    }
}
