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

//! Message ingestion orchestration
//!
//! A create request moves through `validate -> moderate -> persist`. Any step
//! may end the request; nothing is stored unless every step succeeds.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::errors::{ServiceError, ServiceResult, StorageError};
use crate::message::{Message, ModerationVerdict, NewMessage};
use crate::moderation::Moderator;
use crate::storage::{MessageStore, StorageBackend};
use crate::validation::validate_payload;

/// What to do with a message the moderator does not allow
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationPolicy {
    /// Record the verdict but store the message anyway
    #[default]
    Observe,
    /// Refuse to store disallowed messages
    Enforce,
}

impl std::str::FromStr for ModerationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "observe" => Ok(ModerationPolicy::Observe),
            "enforce" => Ok(ModerationPolicy::Enforce),
            _ => Err(format!("Unknown moderation policy: {}", s)),
        }
    }
}

/// A stored message together with the verdict it received
#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub message: Message,
    pub verdict: ModerationVerdict,
}

pub struct MessageService {
    store: Arc<dyn MessageStore>,
    moderator: Arc<dyn Moderator>,
    policy: ModerationPolicy,
}

impl MessageService {
    pub fn new(
        store: Arc<dyn MessageStore>,
        moderator: Arc<dyn Moderator>,
        policy: ModerationPolicy,
    ) -> Self {
        Self {
            store,
            moderator,
            policy,
        }
    }

    pub fn policy(&self) -> ModerationPolicy {
        self.policy
    }

    pub fn storage_backend(&self) -> StorageBackend {
        self.store.backend()
    }

    /// Validate, moderate and persist a raw request body
    pub async fn create_message(&self, raw: &[u8]) -> ServiceResult<Accepted> {
        let new_message = validate_payload(raw).map_err(|e| {
            warn!("Rejected create request: {}", e);
            e
        })?;

        self.create_validated(new_message).await
    }

    /// Moderate and persist an already validated message
    pub async fn create_validated(&self, new_message: NewMessage) -> ServiceResult<Accepted> {
        let verdict = self.moderator.classify(&new_message.content).await;

        if !verdict.is_allowed && self.policy == ModerationPolicy::Enforce {
            info!(
                "Message rejected by moderation: category={} confidence={}",
                verdict.category, verdict.confidence
            );
            return Err(ServiceError::Rejected {
                category: verdict.category.to_string(),
                reason: verdict.reason,
            });
        }

        let message = new_message.into_message();

        self.store.store(&message).await.map_err(|e| {
            error!("Failed to store message {}: {}", message.id, e);
            ServiceError::Persistence(e)
        })?;

        info!(
            "Accepted message {} (moderation: category={} allowed={})",
            message.id, verdict.category, verdict.is_allowed
        );

        Ok(Accepted { message, verdict })
    }

    /// All stored messages
    pub async fn list_messages(&self) -> ServiceResult<Vec<Message>> {
        self.store.list_all().await.map_err(|e: StorageError| {
            error!("Failed to read messages: {}", e);
            ServiceError::Persistence(e)
        })
    }
}
