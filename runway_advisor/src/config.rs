use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use tracing::{debug, info, warn};

use crate::{catalog::RunwayCatalog, error::ApplicationResult};

const BUNDLED_CONFIG: &str = include_str!("../config.toml");

pub(crate) fn runway_advisor_project_dir() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "runway_advisor")
}

/// Where the rolling log files go.
pub(crate) fn log_directory() -> Option<PathBuf> {
    runway_advisor_project_dir().map(|dirs| dirs.data_local_dir().join("logs"))
}

#[derive(Debug)]
pub(crate) struct AdvisorConfig {
    config: Configurable,
    config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct Configurable {
    runway_provider_url: String,
    runway_provider_token: Option<String>,
    metar_url: String,
    request_timeout_ms: u64,
    metar_retries: u32,
    max_metar_age_minutes: i64,
    catalog_path: Option<PathBuf>,
}

/// User settings that survive `--clean-config`.
#[skip_serializing_none]
#[derive(Debug, Default, Serialize, Deserialize)]
struct KeptSettings {
    runway_provider_token: Option<String>,
    catalog_path: Option<PathBuf>,
}

impl AdvisorConfig {
    pub fn load(clean_config: bool) -> ApplicationResult<Self> {
        let config_file_path = match runway_advisor_project_dir() {
            Some(dirs) => Some(setup_configuration(dirs.config_dir(), clean_config)?),
            None => {
                warn!("No home directory found, using the bundled configuration");
                None
            }
        };
        let config = read_configurable(config_file_path.as_deref())?;
        Ok(Self {
            config,
            config_file_path,
        })
    }

    pub fn config_file_path(&self) -> Option<&Path> {
        self.config_file_path.as_deref()
    }

    pub fn runway_provider_url(&self) -> &str {
        &self.config.runway_provider_url
    }

    pub fn runway_provider_token(&self) -> Option<String> {
        self.config
            .runway_provider_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
    }

    pub fn metar_url(&self) -> &str {
        &self.config.metar_url
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    pub fn metar_retries(&self) -> u32 {
        self.config.metar_retries
    }

    pub fn max_metar_age_minutes(&self) -> i64 {
        self.config.max_metar_age_minutes
    }

    pub fn load_catalog(&self) -> ApplicationResult<RunwayCatalog> {
        match &self.config.catalog_path {
            Some(path) => RunwayCatalog::from_path(path),
            None => RunwayCatalog::bundled(),
        }
    }
}

/// Bundled defaults, then the user file, then `RUNWAY_ADVISOR_*` variables.
fn read_configurable(user_file: Option<&Path>) -> Result<Configurable, ConfigError> {
    let mut builder =
        Config::builder().add_source(File::from_str(BUNDLED_CONFIG, FileFormat::Toml));
    if let Some(path) = user_file {
        builder = builder.add_source(File::from(path).required(false));
    }
    builder
        .add_source(Environment::with_prefix("RUNWAY_ADVISOR").try_parsing(true))
        .build()?
        .try_deserialize()
}

fn setup_configuration(config_dir: &Path, clean_config: bool) -> ApplicationResult<PathBuf> {
    let config_file = config_dir.join("config.toml");
    if !config_file.exists() {
        fs::create_dir_all(config_dir)?;
        fs::write(&config_file, BUNDLED_CONFIG)?;
        info!(?config_file, "Created config file");
    } else if clean_config {
        let kept: KeptSettings = Config::builder()
            .add_source(File::from(config_file.as_path()))
            .build()?
            .try_deserialize()?;
        let kept = toml::to_string(&kept)?;
        let raw_config_file = if kept.is_empty() {
            Cow::Borrowed(BUNDLED_CONFIG)
        } else {
            Cow::Owned(format!("{kept}\n{BUNDLED_CONFIG}"))
        };
        fs::write(&config_file, raw_config_file.as_bytes())?;
        info!(?config_file, "Config file reset to defaults");
    } else {
        debug!(?config_file, "Using existing config file");
    }
    Ok(config_file)
}
