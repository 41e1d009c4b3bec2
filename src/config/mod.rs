//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

pub use cli::{CacheArgs, CacheCommand, CliArgs, Command, DispatchArgs, Overrides};

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "ikarus";
const DEFAULT_CACHE_DIRECTORY: &str = "cache";
const DEFAULT_CACHE_MIN_LIFETIME_SECS: u64 = 0;
const DEFAULT_CACHE_MAX_LIFETIME_SECS: u64 = 0;
const DEFAULT_DATABASE_URL: &str = "postgres://localhost/ikarus";
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 8;
const DEFAULT_PACKAGE_ID: i64 = 1;
const DEFAULT_CONTROLLER: &str = "Index";
const DEFAULT_CONTROLLER_DIRECTORY: &str = "lib/controllers";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid log level `{0}`")]
    InvalidLogLevel(String),
    #[error("invalid request parameter `{0}`: expected `key=value`")]
    InvalidParameter(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub directory: PathBuf,
    pub min_lifetime: u64,
    pub max_lifetime: u64,
}

#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub package_id: i64,
    pub default_controller: String,
    pub default_controller_directory: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub cache: CacheSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    pub dispatch: DispatchSettings,
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    cache: Option<FileCacheSettings>,
    database: Option<FileDatabaseSettings>,
    logging: Option<FileLoggingSettings>,
    dispatch: Option<FileDispatchSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FileCacheSettings {
    directory: Option<PathBuf>,
    min_lifetime_seconds: Option<u64>,
    max_lifetime_seconds: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct FileDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
struct FileLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct FileDispatchSettings {
    package_id: Option<i64>,
    default_controller: Option<String>,
    default_controller_directory: Option<String>,
}

/// Parse CLI arguments and build settings with layered precedence.
pub fn load_with_cli() -> Result<(CliArgs, Settings), ConfigError> {
    let cli_args = CliArgs::parse();
    let file = load_file_settings(cli_args.config_file.as_deref())?;
    let overrides = cli_args
        .command
        .as_ref()
        .map(Command::overrides)
        .cloned()
        .unwrap_or_default();
    let settings = build_settings(file, &overrides)?;
    Ok((cli_args, settings))
}

fn load_file_settings(config_file: Option<&std::path::Path>) -> Result<FileSettings, ConfigError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path.to_path_buf()));
    }
    let loaded = builder
        .add_source(Environment::with_prefix("IKARUS").separator("__"))
        .build()?;
    Ok(loaded.try_deserialize()?)
}

fn build_settings(file: FileSettings, overrides: &Overrides) -> Result<Settings, ConfigError> {
    let file_cache = file.cache.unwrap_or_default();
    let file_database = file.database.unwrap_or_default();
    let file_logging = file.logging.unwrap_or_default();
    let file_dispatch = file.dispatch.unwrap_or_default();

    let level_raw = overrides
        .log_level
        .clone()
        .or(file_logging.level)
        .unwrap_or_else(|| "info".to_string());
    let level = LevelFilter::from_str(&level_raw)
        .map_err(|_| ConfigError::InvalidLogLevel(level_raw.clone()))?;
    let format = match overrides.log_json.or(file_logging.json).unwrap_or(false) {
        true => LogFormat::Json,
        false => LogFormat::Compact,
    };

    Ok(Settings {
        cache: CacheSettings {
            directory: overrides
                .cache_directory
                .clone()
                .or(file_cache.directory)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIRECTORY)),
            min_lifetime: file_cache
                .min_lifetime_seconds
                .unwrap_or(DEFAULT_CACHE_MIN_LIFETIME_SECS),
            max_lifetime: overrides
                .cache_max_lifetime_seconds
                .or(file_cache.max_lifetime_seconds)
                .unwrap_or(DEFAULT_CACHE_MAX_LIFETIME_SECS),
        },
        database: DatabaseSettings {
            url: overrides
                .database_url
                .clone()
                .or(file_database.url)
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            max_connections: file_database
                .max_connections
                .unwrap_or(DEFAULT_DATABASE_MAX_CONNECTIONS),
        },
        logging: LoggingSettings { level, format },
        dispatch: DispatchSettings {
            package_id: overrides
                .dispatch_package_id
                .or(file_dispatch.package_id)
                .unwrap_or(DEFAULT_PACKAGE_ID),
            default_controller: overrides
                .dispatch_default_controller
                .clone()
                .or(file_dispatch.default_controller)
                .unwrap_or_else(|| DEFAULT_CONTROLLER.to_string()),
            default_controller_directory: overrides
                .dispatch_default_controller_directory
                .clone()
                .or(file_dispatch.default_controller_directory)
                .unwrap_or_else(|| DEFAULT_CONTROLLER_DIRECTORY.to_string()),
        },
    })
}

/// Parse `key=value` request parameters supplied on the command line.
pub fn parse_parameters(raw: &[String]) -> Result<Vec<(String, String)>, ConfigError> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.is_empty())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .ok_or_else(|| ConfigError::InvalidParameter(pair.clone()))
        })
        .collect()
}
