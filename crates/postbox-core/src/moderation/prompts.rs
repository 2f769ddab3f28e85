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

//! Prompt templates for moderation requests

use crate::message::ModerationCategory;

/// Categories the model may choose from
pub const CLASSIFIABLE_CATEGORIES: [ModerationCategory; 4] = [
    ModerationCategory::Clean,
    ModerationCategory::Toxic,
    ModerationCategory::Spam,
    ModerationCategory::Harassment,
];

/// Build the classification prompt for one message
pub fn classify_message(content: &str) -> String {
    let categories = CLASSIFIABLE_CATEGORIES
        .iter()
        .map(|c| format!("- {}", c))
        .collect::<Vec<_>>()
        .join("\n");
    let choices = CLASSIFIABLE_CATEGORIES
        .iter()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        r#"You are a content moderation system.

Classify the following message into ONE of these categories:
{categories}

Return ONLY valid JSON in this exact format:
{{
  "category": "<{choices}>",
  "confidence": <number between 0 and 1>,
  "reason": "<short explanation>"
}}

Message:
"{content}"
"#
    )
}
