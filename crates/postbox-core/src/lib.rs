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

//! # Postbox Core
//!
//! Message ingestion pipeline: payload validation, LLM-backed moderation
//! that fails open, and persistence that degrades to in-process storage
//! when no durable store is available.

pub mod errors;
pub mod message;
pub mod moderation;
pub mod service;
pub mod storage;
pub mod validation;

// Re-export commonly used types
pub use errors::{LlmError, ServiceError, StorageError, ValidationError};
pub use message::{Message, ModerationCategory, ModerationVerdict, NewMessage};

// Re-export traits
pub use moderation::{LlmClient, Moderator};
pub use storage::MessageStore;

// Re-export concrete types
pub use moderation::{GeminiClient, LlmModerator, ModerationConfig};
pub use service::{Accepted, MessageService, ModerationPolicy};
pub use storage::{PersistenceGateway, StorageBackend, StorageConfig, StorageType};
pub use validation::validate_payload;
