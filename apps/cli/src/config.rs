use std::{collections::HashMap, fs, time::Duration};

use anyhow::Context;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub poll_interval_ms: u64,
    pub download_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8080".into(),
            poll_interval_ms: 1000,
            download_dir: ".".into(),
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Defaults, overridden by `cryptoflow.toml` in the working directory,
/// overridden by `CRYPTOFLOW_*` environment variables.
pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("cryptoflow.toml") {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings);

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(raw) {
        if let Some(v) = file_cfg.get("server_url").and_then(|v| v.as_str()) {
            settings.server_url = v.to_string();
        }
        if let Some(v) = file_cfg.get("poll_interval_ms").and_then(|v| v.as_integer()) {
            if v > 0 {
                settings.poll_interval_ms = v as u64;
            }
        }
        if let Some(v) = file_cfg.get("download_dir").and_then(|v| v.as_str()) {
            settings.download_dir = v.to_string();
        }
    }
}

fn apply_env(settings: &mut Settings) {
    if let Ok(v) = std::env::var("CRYPTOFLOW_SERVER_URL") {
        settings.server_url = v;
    }
    if let Ok(v) = std::env::var("CRYPTOFLOW_POLL_INTERVAL_MS") {
        if let Ok(ms) = v.parse::<u64>() {
            if ms > 0 {
                settings.poll_interval_ms = ms;
            }
        }
    }
    if let Ok(v) = std::env::var("CRYPTOFLOW_DOWNLOAD_DIR") {
        settings.download_dir = v;
    }
}

pub fn validate(settings: &Settings) -> anyhow::Result<()> {
    let parsed = url::Url::parse(&settings.server_url)
        .with_context(|| format!("invalid server_url '{}'", settings.server_url))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        anyhow::bail!(
            "server_url must use http or https, got '{}'",
            parsed.scheme()
        );
    }
    Ok(())
}
