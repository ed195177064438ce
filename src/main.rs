//! # Document Metadata Service Main Driver
//!
//! ## Purpose
//! Main entry point for the document metadata server. Orchestrates
//! initialization of all system components and starts the web server for
//! handling document requests.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files, command line arguments, environment variables
//! - **Output**: Running web server with document API endpoints
//!
//! ## Architecture Flow
//! 1. Parse command line arguments and load configuration
//! 2. Initialize logging and tracing
//! 3. Open the document store and build the service
//! 4. Start the web API server
//! 5. Handle shutdown signals gracefully, flushing pending writes

use clap::{Arg, Command};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use docmeta_service::{
    api::ApiServer,
    config::Config,
    errors::{DocumentError, Result},
    identity::IdentityResolver,
    service::DocumentService,
    storage::DocumentStore,
    AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let matches = Command::new("docmeta-server")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Document Platform Team")
        .about("Document-metadata CRUD microservice with predicate search")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("config.toml"),
        )
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .value_name("PORT")
                .help("Server port")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("check-health")
                .long("check-health")
                .help("Run health checks and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    // Load configuration
    let config_path = matches.get_one::<String>("config").unwrap();
    let mut config = Config::from_file(config_path)?;

    // Override port if specified
    if let Some(port) = matches.get_one::<u16>("port") {
        config.server.port = *port;
    }

    let config = Arc::new(config);

    // Initialize logging
    init_logging(&config)?;

    info!("Starting Document Metadata Service v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", config_path);

    // Initialize application components
    let app_state = initialize_components(config.clone())?;

    // Run health checks if requested
    if matches.get_flag("check-health") {
        app_state.service.health_check()?;
        info!("All health checks passed!");
        return Ok(());
    }

    // Start the API server
    let server = ApiServer::new(app_state.clone());
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.run().await {
            error!("Server error: {}", e);
        }
    });

    info!(
        "Document Metadata Service started on {}:{}",
        config.server.host, config.server.port
    );

    // Wait for shutdown signal
    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = server_handle => {
            warn!("Server stopped unexpectedly");
        }
    }

    // Graceful shutdown
    shutdown_components(&app_state)?;
    info!("Document Metadata Service shut down successfully");

    Ok(())
}

/// Initialize logging and tracing
fn init_logging(config: &Config) -> Result<()> {
    let log_level: tracing::Level =
        config
            .logging
            .level
            .parse()
            .map_err(|_| DocumentError::Config {
                message: format!("Invalid log level: {}", config.logging.level),
            })?;
    let filter = tracing_subscriber::filter::LevelFilter::from_level(log_level);

    if config.logging.json_format {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .json()
                    .with_filter(filter),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_filter(filter),
            )
            .init();
    }

    info!("Logging initialized with level: {}", config.logging.level);
    Ok(())
}

/// Initialize all application components
fn initialize_components(config: Arc<Config>) -> Result<AppState> {
    info!("Initializing application components...");

    info!("Opening document store...");
    let store = Arc::new(DocumentStore::open(&config.storage)?);

    let service = Arc::new(DocumentService::new(store, config.query.clone()));
    let identity = Arc::new(IdentityResolver::new(&config.auth));

    // Verify storage health before accepting traffic
    service.health_check()?;
    info!("Document store is healthy");

    let app_state = AppState {
        config,
        service,
        identity,
    };

    info!("All components initialized successfully");
    Ok(app_state)
}

/// Gracefully shutdown all components
fn shutdown_components(app_state: &AppState) -> Result<()> {
    info!("Shutting down components...");
    app_state.service.flush()?;
    info!("All components shut down successfully");
    Ok(())
}
