pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;

use crate::config::{Config, StorageBackend};
use crate::database::{
    memory::{MemoryMessageStore, MemoryResponderStore},
    message_store::{MessageStore, PgMessageStore},
    pool::{create_pool, run_migrations},
    responder_store::{PgResponderStore, ResponderStore},
};
use crate::error::Result;
use crate::services::{
    message_service::MessageService,
    responder_service::{ListSettings, ResponderService},
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub message_service: MessageService,
    pub responder_service: ResponderService,
}

impl AppState {
    pub fn new(
        config: Config,
        message_store: Arc<dyn MessageStore>,
        responder_store: Arc<dyn ResponderStore>,
    ) -> Result<Self> {
        let settings = ListSettings::from_config(&config)?;
        Ok(Self {
            config: Arc::new(config),
            message_service: MessageService::new(message_store),
            responder_service: ResponderService::new(responder_store, settings),
        })
    }

    /// Opens the configured storage backend and wires the services to it.
    pub async fn connect(config: Config) -> Result<Self> {
        match config.storage_backend {
            StorageBackend::Postgres => {
                let pool = create_pool(&config).await?;
                run_migrations(&pool).await?;
                tracing::info!("Connected to PostgreSQL, migrations applied");
                Self::new(
                    config,
                    Arc::new(PgMessageStore::new(pool.clone())),
                    Arc::new(PgResponderStore::new(pool)),
                )
            }
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Self::new(
                    config,
                    Arc::new(MemoryMessageStore::new()),
                    Arc::new(MemoryResponderStore::new()),
                )
            }
        }
    }
}
