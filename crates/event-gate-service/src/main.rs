//! # Event-Gate Service
//!
//! Binary entry point for the Event-Gate HTTP service.
//!
//! This executable:
//! - Loads configuration from environment and files
//! - Initializes logging
//! - Builds the token verifier and queue client
//! - Starts the HTTP server from event-gate-api

use event_gate_api::{start_server, QueueProviderKind, ServiceConfig, ServiceError};
use event_gate_core::{EntraIdTokenVerifier, QueueEventProcessor};
use event_gate_queue::{AzureStorageConfig, ProviderConfig, QueueClientFactory, QueueName};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "event_gate_service=info,event_gate_api=info,event_gate_core=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Event-Gate Service");

    // -------------------------------------------------------------------------
    // Load configuration
    //
    // Sources (applied in order; later sources override earlier ones):
    //  1. /etc/event-gate/service.yaml     (system-wide defaults)
    //  2. ./config/service.yaml            (deployment-local override)
    //  3. Path given by EG_CONFIG_FILE env (operator-specified file)
    //  4. Environment variables prefixed EG__ (double-underscore separator)
    //     e.g. EG__SERVER__PORT=9090 sets server.port = 9090
    //
    // All service configuration fields carry serde defaults, so absent files
    // produce a config that only fails `validate()` on the fields that have no
    // sensible default (the Entra ID identifiers).  A malformed file or an
    // environment variable that cannot be coerced to the correct type IS a
    // hard error because it indicates deliberate-but-broken operator
    // configuration.
    // -------------------------------------------------------------------------
    let mut config_builder = config::Config::builder()
        .add_source(
            config::File::with_name("/etc/event-gate/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        )
        .add_source(
            config::File::with_name("config/service")
                .required(false)
                .format(config::FileFormat::Yaml),
        );

    // Optional explicit path supplied by the operator.
    if let Ok(explicit_path) = std::env::var("EG_CONFIG_FILE") {
        if !explicit_path.is_empty() {
            config_builder = config_builder.add_source(
                config::File::with_name(&explicit_path)
                    .required(true)
                    .format(config::FileFormat::Yaml),
            );
            info!(path = %explicit_path, "Loading configuration from explicit path");
        }
    }

    let config = match config_builder
        .add_source(config::Environment::with_prefix("EG").separator("__"))
        .build()
    {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(error = %e, "Failed to build configuration; aborting");
            std::process::exit(3);
        }
    };

    let service_config: ServiceConfig = match config.try_deserialize() {
        Ok(sc) => sc,
        Err(e) => {
            error!(
                error = %e,
                "Could not deserialize service configuration; aborting. \
                 Fix the configuration and restart."
            );
            std::process::exit(3);
        }
    };

    if let Err(e) = service_config.validate() {
        error!(error = %e, "Service configuration is invalid; aborting");
        std::process::exit(3);
    }

    // -------------------------------------------------------------------------
    // Build the token verifier
    //
    // Deliveries are accepted only from the Event Grid system topic's own
    // Entra ID identity, so the verifier is pinned to the configured tenant,
    // receiver application, and sender principal.
    // -------------------------------------------------------------------------
    let token_verifier = match EntraIdTokenVerifier::new(service_config.auth.verifier_settings()) {
        Ok(verifier) => Arc::new(verifier),
        Err(e) => {
            error!(error = %e, "Failed to build token verifier; aborting");
            std::process::exit(3);
        }
    };

    // -------------------------------------------------------------------------
    // Build the queue client
    //
    // Accepted event payloads are forwarded to a storage queue.  The target
    // queue is created on startup if it does not exist yet; a queue that
    // cannot be reached at startup is a hard error so a misdeployed service
    // fails fast instead of rejecting every delivery.
    // -------------------------------------------------------------------------
    let provider_config = match service_config.queue.provider {
        QueueProviderKind::Memory => {
            warn!("Using the in-memory queue provider; messages do not survive a restart");
            ProviderConfig::InMemory
        }
        QueueProviderKind::AzureStorage => ProviderConfig::AzureStorage(AzureStorageConfig::new(
            service_config.queue.connection_string.clone(),
        )),
    };

    let queue_client = match QueueClientFactory::create_client(&provider_config) {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "Failed to create queue client; aborting");
            std::process::exit(3);
        }
    };

    let queue_name = match QueueName::new(&service_config.queue.queue_name) {
        Ok(name) => name,
        Err(e) => {
            error!(error = %e, "Configured queue name is invalid; aborting");
            std::process::exit(3);
        }
    };

    if let Err(e) = queue_client.ensure_queue(&queue_name).await {
        let error = ServiceError::QueueUnavailable {
            message: e.to_string(),
        };
        error!(
            queue = %queue_name,
            error = %error,
            "Queue is not reachable; aborting"
        );
        std::process::exit(error.exit_code());
    }

    info!(
        provider = %queue_client.provider_type(),
        queue = %queue_name,
        "Queue client ready"
    );

    let processor = Arc::new(QueueEventProcessor::new(queue_client.clone(), queue_name));

    info!(
        host = %service_config.server.host,
        port = service_config.server.port,
        "Starting HTTP server"
    );

    // Start the server
    if let Err(e) = start_server(service_config, token_verifier, processor, queue_client).await {
        error!("Failed to start server: {}", e);
        std::process::exit(e.exit_code());
    }

    Ok(())
}
