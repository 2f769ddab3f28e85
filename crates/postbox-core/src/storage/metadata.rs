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

//! Removal of backend bookkeeping from stored documents

use serde_json::{Map, Value};

use crate::errors::StorageResult;
use crate::message::Message;

/// Bookkeeping keys written by document stores
pub const STORAGE_METADATA_FIELDS: [&str; 5] = ["_rid", "_self", "_etag", "_attachments", "_ts"];

/// Drop every storage-internal key. Any underscore-prefixed key counts.
pub fn strip_storage_metadata(mut document: Map<String, Value>) -> Map<String, Value> {
    for field in STORAGE_METADATA_FIELDS {
        document.remove(field);
    }
    document.retain(|key, _| !key.starts_with('_'));
    document
}

/// Decode a stored document into a message, ignoring bookkeeping
pub fn decode_document(document: Map<String, Value>) -> StorageResult<Message> {
    let message = serde_json::from_value(Value::Object(strip_storage_metadata(document)))?;
    Ok(message)
}
