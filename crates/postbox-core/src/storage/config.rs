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

//! Storage configuration types

use serde::{Deserialize, Serialize};

pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Supported durable storage backends
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum StorageType {
    Neo4j,
    Sled,
}

impl std::fmt::Display for StorageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageType::Neo4j => write!(f, "neo4j"),
            StorageType::Sled => write!(f, "sled"),
        }
    }
}

impl std::str::FromStr for StorageType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "neo4j" => Ok(StorageType::Neo4j),
            "sled" => Ok(StorageType::Sled),
            _ => Err(format!("Unknown storage type: {}", s)),
        }
    }
}

/// Durable storage configuration.
///
/// For Neo4j `uri` is the bolt URI; for sled it is the database directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub storage_type: StorageType,
    pub uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    pub timeout_seconds: Option<u64>,
}

impl StorageConfig {
    /// Create a new Neo4j configuration
    pub fn neo4j(uri: String, username: String, password: String) -> Self {
        Self {
            storage_type: StorageType::Neo4j,
            uri,
            username: Some(username),
            password: Some(password),
            database: None,
            timeout_seconds: None,
        }
    }

    /// Create a new sled configuration
    pub fn sled(path: String) -> Self {
        Self {
            storage_type: StorageType::Sled,
            uri: path,
            username: None,
            password: None,
            database: None,
            timeout_seconds: None,
        }
    }

    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_timeout(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    pub fn connect_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS))
    }
}
