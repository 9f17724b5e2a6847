/// `load_config` module: builds the [`SiteConfig`] from an optional static YAML file plus the
/// process environment.
///
/// # Responsibilities
/// - Load env files (`--env-file`, then `.env.local`, then `.env`); values already in the
///   process environment always win.
/// - Read content values (name, bio, links, asset URLs) from the environment. Each key is
///   looked up as `NEXT_PUBLIC_<KEY>` first and `<KEY>` second.
/// - Parse the optional YAML file for build settings and CV naming, and validate them.
///
/// # Errors
/// All errors use `anyhow::Error` and are surfaced at the CLI boundary. Missing content values
/// are never errors; they default or are omitted.
///
/// Example YAML:
///
/// ```yaml
/// build:
///   public_dir: ./public
///   concurrency: 4
///   timeout_secs: 30
/// cv:
///   file_name: jane-doe-cv.pdf
///   display_name: Resume
/// ```
use anyhow::{Context, Result};
use biolink_core::config::SiteConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

pub const ENV_PREFIX: &str = "NEXT_PUBLIC_";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub build: BuildSection,
    pub cv: CvSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildSection {
    pub public_dir: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CvSection {
    pub file_name: Option<String>,
    pub display_name: Option<String>,
}

/// Looks a content key up in the process environment, prefixed form first.
pub fn env_lookup(key: &str) -> Option<String> {
    [format!("{ENV_PREFIX}{key}"), key.to_string()]
        .into_iter()
        .filter_map(|name| std::env::var(name).ok())
        .find(|value| !value.trim().is_empty())
}

/// Loads env files and the optional YAML file, and returns the merged config.
pub fn load_config(config_path: Option<&Path>, env_file: Option<&Path>) -> Result<SiteConfig> {
    load_env_files(env_file)?;

    let file_config = match config_path {
        Some(path) => read_file_config(path)?,
        None => {
            debug!("No config file given, using default build settings");
            FileConfig::default()
        }
    };

    let mut config = SiteConfig::from_lookup(env_lookup);
    apply_file_config(&mut config, file_config)?;
    config.trace_loaded();
    Ok(config)
}

fn load_env_files(env_file: Option<&Path>) -> Result<()> {
    if let Some(path) = env_file {
        dotenvy::from_path(path)
            .with_context(|| format!("Failed to load env file {}", path.display()))?;
        info!(env_file = %path.display(), "Loaded env file");
    }
    // Only the working directory; parent directories are never searched.
    for default in [".env.local", ".env"] {
        match dotenvy::from_path(Path::new(default)) {
            Ok(()) => info!(env_file = default, "Loaded env file"),
            Err(e) if e.not_found() => debug!(env_file = default, "No env file"),
            Err(e) => warn!(error = %e, env_file = default, "Env file could not be fully parsed, values after the bad line are ignored"),
        }
    }
    Ok(())
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    info!(config_path = ?path, "Loading configuration from file");

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to read config file");
            return Err(anyhow::anyhow!("Failed to read config file {:?}: {}", path, e));
        }
    };

    match serde_yaml::from_str::<Option<FileConfig>>(&content) {
        Ok(conf) => {
            info!(config_path = ?path, "Parsed config YAML successfully");
            Ok(conf.unwrap_or_default())
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path, "Failed to parse config YAML");
            Err(anyhow::anyhow!("Failed to parse config YAML: {e}"))
        }
    }
}

fn apply_file_config(config: &mut SiteConfig, file: FileConfig) -> Result<()> {
    if let Some(public_dir) = file.build.public_dir {
        config.build.public_dir = public_dir;
    }
    if let Some(concurrency) = file.build.concurrency {
        if concurrency == 0 {
            warn!("build.concurrency is 0, using 1");
        }
        config.build.concurrency = concurrency.max(1);
    }
    if let Some(timeout_secs) = file.build.timeout_secs {
        if timeout_secs == 0 {
            anyhow::bail!("build.timeout_secs must be greater than 0");
        }
        config.build.timeout_secs = timeout_secs;
    }
    if let Some(file_name) = file.cv.file_name.filter(|f| !f.trim().is_empty()) {
        config.cv.file_name = file_name;
    }
    if let Some(display_name) = file.cv.display_name.filter(|d| !d.trim().is_empty()) {
        config.cv.display_name = display_name;
    }
    Ok(())
}
