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

//! Embedded durable store using sled

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use sled::{Db, Tree};

use super::config::StorageConfig;
use super::metadata::decode_document;
use super::traits::{MessageStore, StorageBackend};
use crate::errors::{StorageError, StorageResult};
use crate::message::Message;

const MESSAGES_TREE: &str = "messages";

/// Messages stored as JSON documents keyed by message id.
///
/// Each document carries `_rid`, `_etag` and `_ts` bookkeeping next to the
/// message fields. `_rid` comes from the database id generator and fixes the
/// listing order.
#[derive(Debug)]
pub struct SledStore {
    db: Db,
    messages: Tree,
}

impl SledStore {
    pub fn new(config: &StorageConfig) -> StorageResult<Self> {
        let db = sled::open(&config.uri)
            .map_err(|e| StorageError::Connection(format!("Failed to open sled database: {}", e)))?;
        let messages = db.open_tree(MESSAGES_TREE)?;

        Ok(Self { db, messages })
    }

    fn to_document(&self, message: &Message) -> StorageResult<Vec<u8>> {
        let body = serde_json::to_vec(message)?;
        let etag = format!("{:x}", Sha256::digest(&body));

        let Value::Object(mut document) = serde_json::to_value(message)? else {
            return Err(StorageError::Serialization(
                "message did not serialize to an object".to_string(),
            ));
        };
        document.insert("_rid".to_string(), json!(self.db.generate_id()?));
        document.insert("_etag".to_string(), json!(etag));
        document.insert("_ts".to_string(), json!(Utc::now().timestamp()));

        Ok(serde_json::to_vec(&document)?)
    }
}

#[async_trait]
impl MessageStore for SledStore {
    async fn store(&self, message: &Message) -> StorageResult<()> {
        let document = self.to_document(message)?;

        self.messages
            .compare_and_swap(message.id.as_bytes(), None::<&[u8]>, Some(document))?
            .map_err(|_| StorageError::Conflict(format!("message {} already exists", message.id)))?;

        self.messages.flush_async().await?;
        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<Message>> {
        let mut documents = Vec::new();

        for item in self.messages.iter() {
            let (_, bytes) = item?;
            let document: Map<String, Value> = serde_json::from_slice(&bytes)?;
            let rid = document.get("_rid").and_then(Value::as_u64).unwrap_or(u64::MAX);
            documents.push((rid, document));
        }

        documents.sort_by_key(|(rid, _)| *rid);

        documents
            .into_iter()
            .map(|(_, document)| decode_document(document))
            .collect()
    }

    async fn health_check(&self) -> StorageResult<bool> {
        self.db.size_on_disk()?;
        Ok(true)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Sled
    }
}
