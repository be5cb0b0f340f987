use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use config::{Config, Environment, File, Map};
use serde::Deserialize;

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_DATABASE_URL: &str = "sqlite://./data/hospital.db";
const DEFAULT_INFERENCE_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub database_url: String,
    #[serde(default)]
    pub inference_url: Option<String>,
    pub inference_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: DEFAULT_BIND.into(),
            database_url: DEFAULT_DATABASE_URL.into(),
            inference_url: None,
            inference_timeout_secs: DEFAULT_INFERENCE_TIMEOUT_SECS,
        }
    }
}

/// Reads `server.toml` (optional) and `APP__*` variables, then lets the
/// unprefixed `SERVER_BIND`, `DATABASE_URL` and `INFERENCE_URL` fill in
/// anything the prefixed variables left unset.
pub fn load_settings() -> anyhow::Result<Settings> {
    let env: Map<String, String> = std::env::vars().collect();
    load_settings_from("server.toml", env)
}

pub(crate) fn load_settings_from(
    file: &str,
    env: Map<String, String>,
) -> anyhow::Result<Settings> {
    let defaults = Settings::default();
    let raw = Config::builder()
        .set_default("server_bind", defaults.server_bind)?
        .set_default("database_url", defaults.database_url)?
        .set_default("inference_timeout_secs", defaults.inference_timeout_secs)?
        .add_source(File::with_name(file).required(false))
        .add_source(
            Environment::with_prefix("APP")
                .separator("__")
                .source(Some(env.clone())),
        )
        .build()
        .context("failed to assemble server settings")?;

    let mut settings: Settings = raw
        .try_deserialize()
        .context("invalid server settings")?;
    apply_legacy_env(&mut settings, &env);

    if settings
        .inference_url
        .as_deref()
        .is_some_and(|url| url.trim().is_empty())
    {
        settings.inference_url = None;
    }
    Ok(settings)
}

fn apply_legacy_env(settings: &mut Settings, env: &Map<String, String>) {
    let legacy = |plain: &str, scoped: &str| {
        if env.contains_key(scoped) {
            None
        } else {
            env.get(plain).cloned()
        }
    };

    if let Some(v) = legacy("SERVER_BIND", "APP__SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = legacy("DATABASE_URL", "APP__DATABASE_URL") {
        settings.database_url = v;
    }
    if let Some(v) = legacy("INFERENCE_URL", "APP__INFERENCE_URL") {
        settings.inference_url = Some(v);
    }
}

pub fn prepare_database_url(raw_database_url: &str) -> anyhow::Result<String> {
    let database_url = normalize_database_url(raw_database_url);
    ensure_parent_dir_exists(&database_url)?;
    Ok(database_url)
}

pub(crate) fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return DEFAULT_DATABASE_URL.to_string();
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    let path = raw_database_url
        .strip_prefix("sqlite:")
        .unwrap_or(raw_database_url)
        .replace('\\', "/");
    format!("sqlite://{path}")
}

fn ensure_parent_dir_exists(database_url: &str) -> anyhow::Result<()> {
    let Some(parent) = sqlite_path(database_url)
        .as_deref()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
    else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(&parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.starts_with("sqlite::memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
