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

//! Neo4j message store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use neo4rs::{query, ConfigBuilder, Graph, Row};
use uuid::Uuid;

use super::config::StorageConfig;
use super::traits::{MessageStore, StorageBackend};
use crate::errors::{StorageError, StorageResult};
use crate::message::Message;

const CREATE_MESSAGE: &str =
    "CREATE (m:Message {id: $id, content: $content, username: $username, timestamp: $timestamp})";

// Only domain properties are projected; element ids and labels stay in the database.
const LIST_MESSAGES: &str = "MATCH (m:Message) \
     RETURN m.id AS id, m.content AS content, m.username AS username, m.timestamp AS timestamp \
     ORDER BY m.timestamp, m.id";

/// Neo4j-backed message store
pub struct Neo4jStore {
    graph: Arc<Graph>,
}

impl std::fmt::Debug for Neo4jStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jStore").finish_non_exhaustive()
    }
}

impl Neo4jStore {
    /// Connect and probe the server.
    ///
    /// Fails when the connection and the probe together do not finish within
    /// the configured timeout. The bolt handshake happens lazily, so the probe
    /// is the first exchange with the server.
    pub async fn new(config: &StorageConfig) -> StorageResult<Self> {
        tokio::time::timeout(config.connect_timeout(), Self::connect_and_probe(config))
            .await
            .map_err(|_| {
                StorageError::Connection(format!(
                    "Timed out connecting to {} after {:?}",
                    config.uri,
                    config.connect_timeout()
                ))
            })?
    }

    async fn connect_and_probe(config: &StorageConfig) -> StorageResult<Self> {
        let mut builder = ConfigBuilder::default().uri(&config.uri);

        if let Some(username) = &config.username {
            builder = builder.user(username);
        }

        if let Some(password) = &config.password {
            builder = builder.password(password);
        }

        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        let graph = Graph::connect(builder.build()?).await?;
        let store = Self {
            graph: Arc::new(graph),
        };

        if !store.health_check().await? {
            return Err(StorageError::Connection(format!(
                "Neo4j at {} did not answer the health probe",
                config.uri
            )));
        }

        Ok(store)
    }

    fn row_to_message(row: &Row) -> StorageResult<Message> {
        let column = |name: &str| {
            row.get::<String>(name)
                .map_err(|e| StorageError::Serialization(format!("column {}: {}", name, e)))
        };

        let id = Uuid::parse_str(&column("id")?)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let timestamp = DateTime::parse_from_rfc3339(&column("timestamp")?)
            .map_err(|e| StorageError::Serialization(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Message {
            id,
            content: column("content")?,
            username: column("username")?,
            timestamp,
        })
    }
}

/// Fixed-width timestamps keep lexical order equal to time order
fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

#[async_trait]
impl MessageStore for Neo4jStore {
    async fn store(&self, message: &Message) -> StorageResult<()> {
        let create = query(CREATE_MESSAGE)
            .param("id", message.id.to_string())
            .param("content", message.content.clone())
            .param("username", message.username.clone())
            .param("timestamp", format_timestamp(&message.timestamp));

        self.graph.run(create).await?;
        Ok(())
    }

    async fn list_all(&self) -> StorageResult<Vec<Message>> {
        let mut rows = self.graph.execute(query(LIST_MESSAGES)).await?;
        let mut messages = Vec::new();

        while let Some(row) = rows.next().await? {
            messages.push(Self::row_to_message(&row)?);
        }

        Ok(messages)
    }

    async fn health_check(&self) -> StorageResult<bool> {
        let mut rows = self.graph.execute(query("RETURN 1 AS health")).await?;
        Ok(rows.next().await?.is_some())
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Neo4j
    }
}
