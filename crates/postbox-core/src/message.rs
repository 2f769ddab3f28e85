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

//! Message domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Username recorded when the author does not supply one
pub const DEFAULT_USERNAME: &str = "anonymous";

/// A message accepted by the ingestion pipeline.
///
/// Messages are created once and never mutated afterwards. Only these four
/// fields are exposed to callers; storage backends must not leak their own
/// bookkeeping through this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub content: String,
    pub username: String,
    pub timestamp: DateTime<Utc>,
}

/// A validated create request that has not been stamped yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub content: String,
    pub username: String,
}

impl NewMessage {
    pub fn new(content: impl Into<String>, username: Option<String>) -> Self {
        Self {
            content: content.into(),
            username: username.unwrap_or_else(|| DEFAULT_USERNAME.to_string()),
        }
    }

    /// Assign a fresh id and the current UTC time
    pub fn into_message(self) -> Message {
        Message {
            id: Uuid::new_v4(),
            content: self.content,
            username: self.username,
            timestamp: Utc::now(),
        }
    }
}

/// Moderation categories understood by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationCategory {
    Clean,
    Toxic,
    Spam,
    Harassment,
    Unknown,
}

impl ModerationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationCategory::Clean => "clean",
            ModerationCategory::Toxic => "toxic",
            ModerationCategory::Spam => "spam",
            ModerationCategory::Harassment => "harassment",
            ModerationCategory::Unknown => "unknown",
        }
    }
}

/// Exact match on the lowercase name; any other spelling is `Unknown`
impl From<&str> for ModerationCategory {
    fn from(value: &str) -> Self {
        match value {
            "clean" => ModerationCategory::Clean,
            "toxic" => ModerationCategory::Toxic,
            "spam" => ModerationCategory::Spam,
            "harassment" => ModerationCategory::Harassment,
            _ => ModerationCategory::Unknown,
        }
    }
}

impl std::fmt::Display for ModerationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The classifier's judgment about a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationVerdict {
    pub is_allowed: bool,
    pub category: ModerationCategory,
    pub confidence: f64,
    pub reason: String,
}

impl ModerationVerdict {
    pub const FAIL_OPEN_REASON: &'static str = "moderation service unavailable, allowing message";

    /// Verdict used whenever the classifier cannot produce one
    pub fn fail_open() -> Self {
        Self {
            is_allowed: true,
            category: ModerationCategory::Unknown,
            confidence: 0.0,
            reason: Self::FAIL_OPEN_REASON.to_string(),
        }
    }

    /// Build a verdict from a classifier answer. Only `clean` is allowed and
    /// the confidence is clamped into `[0.0, 1.0]`.
    pub fn classified(category: ModerationCategory, confidence: f64, reason: String) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            is_allowed: category == ModerationCategory::Clean,
            category,
            confidence,
            reason,
        }
    }
}
