use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub downloads_path: String,
    pub uploads_path: String,
    pub lock_path: String,
    pub per_page: u32,
    pub lock_refresh_ms: i64,
    pub lock_title: String,
    pub timestamp_format: String,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:8000".into(),
            downloads_path: "/api/v1/downloads".into(),
            uploads_path: "/api/v1/uploads".into(),
            lock_path: "/api/v1/locks/sync_seedbox".into(),
            per_page: 20,
            lock_refresh_ms: 30_000,
            lock_title: "Seedbox sync".into(),
            timestamp_format: "%Y-%m-%d %H:%M:%S".into(),
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    downloads_path: Option<String>,
    uploads_path: Option<String>,
    lock_path: Option<String>,
    per_page: Option<u32>,
    lock_refresh_ms: Option<i64>,
    lock_title: Option<String>,
    timestamp_format: Option<String>,
    request_timeout_secs: Option<u64>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicitly requested file must exist; the implicit `dashboard.toml` in
/// the working directory is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if required || err.kind() != std::io::ErrorKind::NotFound => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()));
        }
        Err(_) => {}
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    validate(&settings)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.server_url {
        settings.server_url = v;
    }
    if let Some(v) = file_cfg.downloads_path {
        settings.downloads_path = v;
    }
    if let Some(v) = file_cfg.uploads_path {
        settings.uploads_path = v;
    }
    if let Some(v) = file_cfg.lock_path {
        settings.lock_path = v;
    }
    if let Some(v) = file_cfg.per_page {
        settings.per_page = v;
    }
    if let Some(v) = file_cfg.lock_refresh_ms {
        settings.lock_refresh_ms = v;
    }
    if let Some(v) = file_cfg.lock_title {
        settings.lock_title = v;
    }
    if let Some(v) = file_cfg.timestamp_format {
        settings.timestamp_format = v;
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = v;
    }
}

/// `DASHBOARD_*` variables win over their `APP__*` aliases.
pub(crate) fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    let var = |name: &str| lookup(&format!("DASHBOARD_{name}")).or_else(|| lookup(&format!("APP__{name}")));

    if let Some(v) = var("SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("DOWNLOADS_PATH") {
        settings.downloads_path = v;
    }
    if let Some(v) = var("UPLOADS_PATH") {
        settings.uploads_path = v;
    }
    if let Some(v) = var("LOCK_PATH") {
        settings.lock_path = v;
    }
    if let Some(v) = var("PER_PAGE") {
        settings.per_page = v
            .parse()
            .with_context(|| format!("invalid per-page value '{v}'"))?;
    }
    if let Some(v) = var("LOCK_REFRESH_MS") {
        settings.lock_refresh_ms = v
            .parse()
            .with_context(|| format!("invalid lock refresh interval '{v}'"))?;
    }
    if let Some(v) = var("LOCK_TITLE") {
        settings.lock_title = v;
    }
    if let Some(v) = var("TIMESTAMP_FORMAT") {
        settings.timestamp_format = v;
    }
    if let Some(v) = var("REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = v
            .parse()
            .with_context(|| format!("invalid request timeout '{v}'"))?;
    }
    Ok(())
}

fn validate(settings: &Settings) -> anyhow::Result<()> {
    if settings.server_url.trim().is_empty() {
        bail!("server_url must not be empty");
    }
    if settings.per_page == 0 {
        bail!("per_page must be positive");
    }
    if settings.request_timeout_secs == 0 {
        bail!("request_timeout_secs must be positive");
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
