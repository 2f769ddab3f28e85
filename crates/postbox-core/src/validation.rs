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

//! Create-message payload validation

use serde::Deserialize;
use serde_json::Value;
use validator::Validate;

use crate::errors::ValidationError;
use crate::message::NewMessage;

/// Shape of a create-message request once its field types are known
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMessageRequest {
    #[validate(length(min = 1))]
    pub content: String,
    #[serde(default)]
    pub username: Option<String>,
}

/// Validate a raw request body
pub fn validate_payload(raw: &[u8]) -> Result<NewMessage, ValidationError> {
    let value: Value = serde_json::from_slice(raw)
        .map_err(|_| ValidationError::InvalidPayload("Invalid JSON body".to_string()))?;
    validate_value(value)
}

/// Validate an already decoded JSON document
pub fn validate_value(value: Value) -> Result<NewMessage, ValidationError> {
    let Value::Object(fields) = &value else {
        return Err(ValidationError::InvalidPayload(
            "Request body must be a JSON object".to_string(),
        ));
    };

    if !matches!(fields.get("content"), Some(Value::String(_))) {
        return Err(ValidationError::MissingField("content"));
    }

    match fields.get("username") {
        None | Some(Value::Null) | Some(Value::String(_)) => {}
        Some(_) => {
            return Err(ValidationError::InvalidPayload(
                "Field 'username' must be a string".to_string(),
            ))
        }
    }

    let request: CreateMessageRequest = serde_json::from_value(value)
        .map_err(|e| ValidationError::InvalidPayload(e.to_string()))?;

    request
        .validate()
        .map_err(|_| ValidationError::MissingField("content"))?;

    Ok(NewMessage::new(request.content, request.username))
}
