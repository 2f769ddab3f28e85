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

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::LlmClient;
use super::config::ModerationConfig;
use crate::errors::{LlmError, LlmResult};

/// API key header. The key must never appear in a request URL.
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Serialize)]
struct GeminiPartRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GeminiContentRequest<'a> {
    parts: Vec<GeminiPartRequest<'a>>,
}

#[derive(Debug, Serialize)]
struct GeminiRequest<'a> {
    contents: Vec<GeminiContentRequest<'a>>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

/// Client for the Gemini `generateContent` endpoint
pub struct GeminiClient {
    http_client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &ModerationConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|_| config.has_api_key())
            .ok_or_else(|| LlmError::InvalidConfig {
                message: "Gemini API key is required".to_string(),
            })?;

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        let endpoint = format!("{}/models/{}:generateContent", config.base_url(), config.model());

        Ok(Self {
            http_client,
            endpoint,
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> LlmResult<String> {
        let request = GeminiRequest {
            contents: vec![GeminiContentRequest {
                parts: vec![GeminiPartRequest { text: prompt }],
            }],
        };

        let response = self
            .http_client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: GeminiResponse = serde_json::from_str(&body)?;
        debug!("Gemini returned {} candidate(s)", parsed.candidates.len());

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .and_then(|part| part.text)
            .ok_or_else(|| LlmError::EmptyResponse {
                message: "No text part in first candidate".to_string(),
            })
    }
}
