use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then environment
/// variables (prefix `WAVETUNE__`), over struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("WAVETUNE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let base = url::Url::parse(&self.api.base_url)
            .map_err(|e| format!("api.base_url is not a valid URL: {e}"))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err("api.base_url must be http or https".to_string());
        }
        if !(0.0..=1.0).contains(&self.audio.initial_volume) {
            return Err("audio.initial_volume must be within [0, 1]".to_string());
        }
        if !(self.audio.filter_q > 0.0) {
            return Err("audio.filter_q must be > 0".to_string());
        }
        if self.audio.tick_ms == 0 {
            return Err("audio.tick_ms must be >= 1".to_string());
        }
        if self.waveform.buckets == 0 {
            return Err("waveform.buckets must be >= 1".to_string());
        }
        Ok(())
    }

    /// Download directory, falling back to the platform default.
    pub fn download_dir(&self) -> PathBuf {
        self.download
            .dir
            .clone()
            .unwrap_or_else(default_download_dir)
    }

    /// Log file path, falling back to the XDG state directory.
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log.file.clone().or_else(default_log_path)
    }
}

/// Resolve the config path from `WAVETUNE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("WAVETUNE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").map(PathBuf::from)
}

/// Compute the default config path under `$XDG_CONFIG_HOME/wavetune/config.toml`
/// or `~/.config/wavetune/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        home_dir().map(|h| h.join(".config"))
    };

    config_home.map(|d| d.join("wavetune").join("config.toml"))
}

/// `$XDG_DOWNLOAD_DIR`, else `~/Downloads`, else the working directory.
pub fn default_download_dir() -> PathBuf {
    if let Some(xdg) = env::var_os("XDG_DOWNLOAD_DIR") {
        return PathBuf::from(xdg);
    }
    home_dir()
        .map(|h| h.join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// `$XDG_STATE_HOME/wavetune/wavetune.log` or `~/.local/state/wavetune/wavetune.log`.
pub fn default_log_path() -> Option<PathBuf> {
    let state_home = if let Some(xdg) = env::var_os("XDG_STATE_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        home_dir().map(|h| h.join(".local").join("state"))
    };

    state_home.map(|d| d.join("wavetune").join("wavetune.log"))
}
