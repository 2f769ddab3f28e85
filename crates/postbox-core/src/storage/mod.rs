/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! Persistence layer for messages
//!
//! [`PersistenceGateway::connect`] picks a durable backend (Neo4j or sled)
//! when one is configured and reachable, and otherwise falls back to an
//! in-process [`MemoryStore`] whose contents are lost on restart.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

pub mod config;
pub mod memory;
pub mod metadata;
pub mod neo4j;
pub mod sled_store;
pub mod traits;

pub use config::{StorageConfig, StorageType};
pub use memory::MemoryStore;
pub use metadata::{decode_document, strip_storage_metadata};
pub use neo4j::Neo4jStore;
pub use sled_store::SledStore;
pub use traits::{MessageStore, StorageBackend};

use crate::errors::StorageResult;
use crate::message::Message;

/// Create a durable store from configuration
pub async fn create_store(config: &StorageConfig) -> StorageResult<Arc<dyn MessageStore>> {
    match config.storage_type {
        StorageType::Neo4j => {
            let store = Neo4jStore::new(config).await?;
            Ok(Arc::new(store))
        }
        StorageType::Sled => {
            let store = SledStore::new(config)?;
            Ok(Arc::new(store))
        }
    }
}

/// The store serving the application, with a record of whether it degraded
#[derive(Debug, Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn MessageStore>,
    degraded: bool,
}

impl PersistenceGateway {
    /// Connect to the configured durable store, or fall back to memory.
    ///
    /// Never fails: a missing configuration or an unreachable store selects
    /// the ephemeral backend and logs a warning.
    pub async fn connect(config: Option<StorageConfig>) -> Self {
        let Some(config) = config else {
            warn!("Durable storage not configured. Messages will be kept in memory only.");
            return Self::degraded();
        };

        match create_store(&config).await {
            Ok(store) => {
                info!("Connected to {} message store", config.storage_type);
                Self {
                    store,
                    degraded: false,
                }
            }
            Err(e) => {
                warn!(
                    "{} message store unavailable ({}). Messages will be kept in memory only.",
                    config.storage_type, e
                );
                Self::degraded()
            }
        }
    }

    /// Use an explicitly chosen store
    pub fn with_store(store: Arc<dyn MessageStore>) -> Self {
        Self {
            store,
            degraded: false,
        }
    }

    fn degraded() -> Self {
        Self {
            store: Arc::new(MemoryStore::new()),
            degraded: true,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }
}

#[async_trait]
impl MessageStore for PersistenceGateway {
    async fn store(&self, message: &Message) -> StorageResult<()> {
        self.store.store(message).await
    }

    async fn list_all(&self) -> StorageResult<Vec<Message>> {
        self.store.list_all().await
    }

    async fn health_check(&self) -> StorageResult<bool> {
        self.store.health_check().await
    }

    fn backend(&self) -> StorageBackend {
        self.store.backend()
    }
}
