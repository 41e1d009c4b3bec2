use std::process;
use std::sync::Arc;

use ikarus::{
    application::{AppError, Kernel},
    config::{self, CacheCommand, Command},
    dispatch::{ControllerRegistry, Request},
    events::ListenerRegistry,
    infra::{db::PostgresStore, telemetry},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;
    telemetry::init(&settings.logging)?;

    let Some(command) = cli_args.command else {
        info!("no command supplied; try `ikarus dispatch` or `ikarus cache warm`");
        return Ok(());
    };

    let store = PostgresStore::connect(&settings.database.url, settings.database.max_connections)
        .await
        .map(Arc::new)?;
    let kernel = Kernel::new(
        settings,
        store,
        ControllerRegistry::new(),
        ListenerRegistry::new(),
    )?;

    match command {
        Command::Dispatch(args) => {
            let mut request = Request::new(args.application.clone());
            for (key, value) in config::parse_parameters(&args.parameters)? {
                request = request.with_parameter(key, value);
            }
            let resolution = kernel.resolve(&request).await?;
            info!(
                controller = %resolution.controller_name,
                directory = %resolution.controller_directory,
                path = ?resolution.path,
                "request resolved"
            );
            Ok(())
        }
        Command::Cache(CacheCommand::Warm(_)) => {
            kernel.warm_cache().await?;
            info!("cache warmed");
            Ok(())
        }
        Command::Cache(CacheCommand::Clear(_)) => {
            let removed = kernel.clear_cache().await?;
            info!(removed, "cache cleared");
            Ok(())
        }
    }
}
