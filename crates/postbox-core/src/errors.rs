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

use thiserror::Error;

/// Errors raised while checking a raw create-message payload
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Field '{0}' is required and must be a non-empty string")]
    MissingField(&'static str),
}

/// LLM-specific error types
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("LLM service returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("LLM returned an empty response: {message}")]
    EmptyResponse { message: String },

    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Timeout error: {message}")]
    Timeout { message: String },
}

/// Storage backend errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Write conflict: {0}")]
    Conflict(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),

    #[error("Sled error: {0}")]
    Sled(#[from] sled::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Errors surfaced by the message service to its callers
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Message rejected by moderation: {category}")]
    Rejected { category: String, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] StorageError),
}

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for message service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
