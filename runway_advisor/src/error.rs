use std::io;

use config::ConfigError;
use thiserror::Error;
use tokio::task::JoinError;

pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Error regarding config: {0}")]
    ConfigError(#[from] ConfigError),
    #[error("System input/output error: {0}")]
    IoError(#[from] io::Error),
    #[error("Error with reqwest: {0}")]
    ReqwestError(#[from] reqwest::Error),
    #[error("Failed to parse METAR: {0}")]
    MetarParseError(#[from] nom::error::Error<String>),
    #[error("Failed to read runway catalog: {0}")]
    CatalogFormatError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    ConfigWriteError(#[from] toml::ser::Error),
    #[error("Invalid runway catalog: {0}")]
    InvalidCatalog(String),
    #[error("Invalid airport data url {0}")]
    InvalidProviderUrl(String),
    #[error("Invalid airport identifier '{0}': expected 4 letters or digits")]
    InvalidAirportId(String),
    #[error("No METAR available for {0}")]
    NoMetar(String),
    #[error("Failed to write JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to render report: {0}")]
    TemplateError(#[from] askama::Error),
    #[error("Join error: {0}")]
    AsyncJoinError(#[from] JoinError),
}
