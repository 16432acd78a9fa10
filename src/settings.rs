use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConsoleError;

const SETTINGS_VERSION: u32 = 1;

fn default_version() -> u32 {
    SETTINGS_VERSION
}

fn default_prompt() -> String {
    "%".to_string()
}

fn default_greeting() -> String {
    "Type 'help' to see available commands.".to_string()
}

fn default_analytics_timeout_ms() -> Option<u64> {
    // Host gives up on its own after 10s; leave room for its error reply.
    Some(12_000)
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Console settings stored as `settings.json` in the app config directory.
/// Missing fields take their defaults, so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-bindings", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts-bindings", ts(export))]
pub struct ConsoleSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Prompt symbol drawn before the input.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// First transcript entry of a session. Empty disables it.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    /// Caller-side deadline for `analytics`. `None` waits forever.
    #[serde(default = "default_analytics_timeout_ms")]
    pub analytics_timeout_ms: Option<u64>,
    /// Deadline for every other bridged command. `None` waits forever.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
    /// Let bridged commands also accept the host's `error` reply and show it.
    /// Off by default: an unanswered request then stays pending until its deadline.
    #[serde(default)]
    pub surface_host_errors: bool,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            prompt: default_prompt(),
            greeting: default_greeting(),
            analytics_timeout_ms: default_analytics_timeout_ms(),
            request_timeout_ms: None,
            surface_host_errors: false,
            log_level: default_log_level(),
        }
    }
}

impl ConsoleSettings {
    pub fn analytics_timeout(&self) -> Option<Duration> {
        self.analytics_timeout_ms.map(Duration::from_millis)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Load settings from the app config directory. A missing file yields defaults;
/// an unreadable one is an error so a typo is not silently ignored.
pub fn load_settings(app_config_dir: &Path) -> Result<ConsoleSettings, ConsoleError> {
    let path = crate::paths::settings_path(app_config_dir);
    if !path.exists() {
        return Ok(ConsoleSettings::default());
    }
    let data = fs::read_to_string(&path)?;
    serde_json::from_str(&data).map_err(|e| ConsoleError::Settings {
        message: format!("{}: {e}", path.display()),
    })
}

/// Save settings to the app config directory.
pub fn save_settings(
    app_config_dir: &Path,
    settings: &ConsoleSettings,
) -> Result<(), ConsoleError> {
    fs::create_dir_all(app_config_dir)?;
    let json = serde_json::to_string_pretty(settings).map_err(|e| ConsoleError::Settings {
        message: e.to_string(),
    })?;
    atomic_write(&crate::paths::settings_path(app_config_dir), json.as_bytes())
}

/// Write to a `.tmp` sibling, fsync, then rename over the target.
fn atomic_write(path: &Path, data: &[u8]) -> Result<(), ConsoleError> {
    let mut tmp_name = OsString::from(path.file_name().unwrap_or_default());
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_round_trip() {
        let dir = std::env::temp_dir().join("canvas_console_test_settings");
        let _ = fs::remove_dir_all(&dir);

        let mut settings = ConsoleSettings::default();
        settings.prompt = ">".into();
        settings.surface_host_errors = true;
        settings.request_timeout_ms = Some(500);
        save_settings(&dir, &settings).unwrap();

        let loaded = load_settings(&dir).unwrap();
        assert_eq!(loaded, settings);
        assert_eq!(loaded.request_timeout(), Some(Duration::from_millis(500)));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_returns_defaults() {
        let dir = std::env::temp_dir().join("canvas_console_test_no_settings");
        let _ = fs::remove_dir_all(&dir);
        let loaded = load_settings(&dir).unwrap();
        assert_eq!(loaded, ConsoleSettings::default());
        assert_eq!(loaded.analytics_timeout(), Some(Duration::from_secs(12)));
        assert_eq!(loaded.request_timeout(), None);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = std::env::temp_dir().join("canvas_console_test_partial_settings");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            crate::paths::settings_path(&dir),
            r#"{ "prompt": "$", "analytics_timeout_ms": null }"#,
        )
        .unwrap();

        let loaded = load_settings(&dir).unwrap();
        assert_eq!(loaded.prompt, "$");
        assert_eq!(loaded.analytics_timeout(), None);
        assert_eq!(loaded.greeting, "Type 'help' to see available commands.");
        assert!(!loaded.surface_host_errors);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = std::env::temp_dir().join("canvas_console_test_bad_settings");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(crate::paths::settings_path(&dir), "{ not json").unwrap();

        assert!(matches!(
            load_settings(&dir),
            Err(ConsoleError::Settings { .. })
        ));

        let _ = fs::remove_dir_all(&dir);
    }
}
