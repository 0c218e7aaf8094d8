//! Command-line arguments for the f1desk server.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::{Path, PathBuf};

use clap::Parser;

use f1desk_core::config::F1DeskConfig;

/// f1desk - chat backend answering F1 student visa questions.
#[derive(Parser, Debug, Default)]
#[command(name = "f1desk", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,

    /// Address to bind the HTTP server to.
    #[arg(long = "host")]
    pub host: Option<String>,

    /// HTTP server port.
    #[arg(short = 'p', long = "port")]
    pub port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level")]
    pub log_level: Option<String>,

    /// Storage backend: memory or sqlite.
    #[arg(short = 's', long = "storage")]
    pub storage: Option<String>,
}

impl CliArgs {
    /// Priority: --config flag > F1DESK_CONFIG env var > ~/.f1desk/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        self.resolve_config_path_with(|key| std::env::var(key).ok())
    }

    fn resolve_config_path_with<F>(&self, lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Some(p) = lookup("F1DESK_CONFIG").filter(|p| !p.trim().is_empty()) {
            return PathBuf::from(p);
        }
        default_config_path(&lookup)
    }

    /// Log level to use when RUST_LOG is not set.
    pub fn resolve_log_level(&self, config_level: &str) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config_level.to_string())
    }

    /// Write flag values over the loaded configuration.
    pub fn apply_to(&self, config: &mut F1DeskConfig) {
        if let Some(ref host) = self.host {
            config.general.host = host.clone();
        }
        if let Some(port) = self.port {
            config.general.port = port;
        }
        if let Some(ref level) = self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(ref backend) = self.storage {
            config.storage.backend = backend.to_lowercase();
        }
    }
}

fn home_dir<F>(lookup: &F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    #[cfg(target_os = "windows")]
    let home = lookup("USERPROFILE");
    #[cfg(not(target_os = "windows"))]
    let home = lookup("HOME");
    home.filter(|h| !h.is_empty()).map(PathBuf::from)
}

fn default_config_path<F>(lookup: &F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    match home_dir(lookup) {
        Some(home) => home.join(".f1desk").join("config.toml"),
        None => PathBuf::from("config.toml"),
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    expand_home_with(path, |key| std::env::var(key).ok())
}

fn expand_home_with<F>(path: &str, lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    let rest = path
        .strip_prefix("~/")
        .or_else(|| path.strip_prefix("~\\"));
    match (rest, home_dir(&lookup)) {
        (Some(rest), Some(home)) => home.join(rest),
        (None, Some(home)) if path == "~" => home,
        _ => Path::new(path).to_path_buf(),
    }
}
