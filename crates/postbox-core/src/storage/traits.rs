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

//! Storage abstraction traits

use std::fmt::Debug;

use async_trait::async_trait;

use crate::errors::StorageResult;
use crate::message::Message;

/// Which backend is actually serving requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Neo4j,
    Sled,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Neo4j => write!(f, "neo4j"),
            StorageBackend::Sled => write!(f, "sled"),
        }
    }
}

/// Store and retrieve messages
#[async_trait]
pub trait MessageStore: Send + Sync + Debug {
    /// Persist a message exactly as given
    async fn store(&self, message: &Message) -> StorageResult<()>;

    /// Every stored message, domain fields only
    async fn list_all(&self) -> StorageResult<Vec<Message>>;

    /// Check if the backend is reachable
    async fn health_check(&self) -> StorageResult<bool>;

    fn backend(&self) -> StorageBackend;
}
