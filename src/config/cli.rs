use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the Ikarus binary.
#[derive(Debug, Parser)]
#[command(name = "ikarus", version, about = "Ikarus application kernel")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "IKARUS_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Resolve a request-parameter set against the cached dispatch tables.
    Dispatch(DispatchArgs),
    /// Cache maintenance.
    #[command(subcommand)]
    Cache(CacheCommand),
}

impl Command {
    pub fn overrides(&self) -> &Overrides {
        match self {
            Command::Dispatch(args) => &args.overrides,
            Command::Cache(CacheCommand::Warm(args)) | Command::Cache(CacheCommand::Clear(args)) => {
                &args.overrides
            }
        }
    }
}

#[derive(Debug, Args, Clone)]
pub struct DispatchArgs {
    #[command(flatten)]
    pub overrides: Overrides,

    /// Application abbreviation the request belongs to.
    #[arg(long, default_value = "core")]
    pub application: String,

    /// Request parameters as `key=value` pairs.
    #[arg(value_name = "KEY=VALUE")]
    pub parameters: Vec<String>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum CacheCommand {
    /// Force-build every registered resource.
    Warm(CacheArgs),
    /// Delete all cache artifacts.
    Clear(CacheArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct CacheArgs {
    #[command(flatten)]
    pub overrides: Overrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the database connection URL.
    #[arg(long = "database-url", value_name = "URL")]
    pub database_url: Option<String>,

    /// Override the cache artifact directory.
    #[arg(long = "cache-directory", value_name = "PATH", value_hint = ValueHint::DirPath)]
    pub cache_directory: Option<PathBuf>,

    /// Override the cache max lifetime in seconds (0 = unconstrained).
    #[arg(long = "cache-max-lifetime-seconds", value_name = "SECONDS")]
    pub cache_max_lifetime_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the active package scope.
    #[arg(long = "dispatch-package-id", value_name = "ID")]
    pub dispatch_package_id: Option<i64>,

    /// Override the default controller name.
    #[arg(long = "dispatch-default-controller", value_name = "NAME")]
    pub dispatch_default_controller: Option<String>,

    /// Override the default controller directory.
    #[arg(long = "dispatch-default-controller-directory", value_name = "DIR")]
    pub dispatch_default_controller_directory: Option<String>,
}
