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

//! Ephemeral in-process message store

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::{MessageStore, StorageBackend};
use crate::errors::StorageResult;
use crate::message::Message;

/// Messages kept in insertion order for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.messages.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.messages.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn store(&self, message: &Message) -> StorageResult<()> {
        self.messages.write().await.push(message.clone());
        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<Message>> {
        Ok(self.messages.read().await.clone())
    }

    async fn health_check(&self) -> StorageResult<bool> {
        Ok(true)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Memory
    }
}
