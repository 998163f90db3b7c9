mod config;
mod context;
mod errors;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod state;
mod store;
mod views;

use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use crate::{
    config::{CollaboratorBackend, Config, SessionBackend},
    services::{Collaborator, MemoryCollaborator, MemorySessionStore, RedisSessionStore, RestCollaborator, SessionStore},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize basic tracing subscriber
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    let collaborator: Arc<dyn Collaborator> = match config.collaborator.backend {
        CollaboratorBackend::Rest => {
            tracing::info!("Using collaborator at {}", config.collaborator.base_url);
            Arc::new(RestCollaborator::new(
                &config.collaborator.base_url,
                Duration::from_secs(config.collaborator.timeout_secs),
            )?)
        }
        CollaboratorBackend::Memory => {
            tracing::warn!("Using in-memory collaborator with development data");
            Arc::new(MemoryCollaborator::seeded())
        }
    };

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Redis => {
            // Initialize Redis client
            let redis_client = if config.redis.sentinel_enabled {
                let url = config
                    .redis
                    .sentinel_url
                    .clone()
                    .context("Sentinel URL not configured")?;
                redis::Client::open(url).context("Failed to connect to Redis Sentinel")?
            } else {
                redis::Client::open(config.redis.url.clone()).context("Failed to connect to Redis")?
            };
            Arc::new(RedisSessionStore::new(Arc::new(redis_client), config.session.ttl_secs))
        }
        SessionBackend::Memory => {
            tracing::warn!("Sessions are kept in memory and will not survive a restart");
            Arc::new(MemorySessionStore::new())
        }
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let app = routes::build_router(AppState::new(config, collaborator, sessions));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Server running on {}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Failed to start server")?;
    Ok(())
}
