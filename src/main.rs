//! Demonstration service wiring configuration, logging and access logging.
//!
//! ```text
//! ConfigStore (defaults < service.{toml,yaml,json} < flags)
//!     → LoggerFactory::new_logger(log-level, log-output)
//!     → Router + AccessLog (access-log, access-log-basic-auth)
//!     → axum::serve with graceful shutdown
//! ```

use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;

use service_glue::{AccessLog, ConfigStore, LoadMode, LoggerFactory};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ConfigStore::new().with_load_mode(LoadMode::Lenient);
    config.register("bind-address", "127.0.0.1", "address to listen on");
    config.register("port", 8080, "port to listen on");
    config.register("log-level", "info", "minimum log level (trace, debug, info, warn, error)");
    config.register("log-output", "stderr", "log destination: stdout, stderr or a file path");
    config.register("access-log", "stdout", "access log destination: stdout, stderr or a file path");
    config.register("access-log-basic-auth", false, "log the Basic-Auth user of each request");
    config.set_config_name("service");
    config.add_search_paths(["/etc/service-glue"]);
    config.bind_flags();

    // Missing config file is fine here: defaults and flags still apply.
    let load_error = config.read_config().err();
    if load_error.is_some() {
        config.handle_info_flags();
    }

    let logger = LoggerFactory::new_logger(
        &config.get_string("log-level"),
        &[config.get_string("log-output")],
    );
    logger.install_global()?;

    tracing::info!("service-glue v0.1.0 starting");
    match (&load_error, config.config_file()) {
        (Some(err), _) => tracing::warn!(error = %err, "Running without a config file"),
        (None, Some(path)) => tracing::info!(path = %path.display(), "Configuration loaded"),
        (None, None) => {}
    }

    let app = Router::new()
        .route("/", get(index))
        .route("/health", get(health));
    let app = AccessLog::open(&config.get_string("access-log"))?
        .attribute_basic_auth_user(config.get_bool("access-log-basic-auth"))
        .wrap(app);

    let port = u16::try_from(config.get_int("port"))?;
    let address = format!("{}:{}", config.get_string("bind-address"), port);
    let listener = TcpListener::bind(&address).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        "Listening for connections"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn index() -> &'static str {
    "service-glue\n"
}

async fn health() -> &'static str {
    "ok\n"
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
