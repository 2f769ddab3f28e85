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

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::client::LlmClient;
use super::config::ModerationConfig;
use super::gemini_client::GeminiClient;
use super::prompts;
use crate::errors::{LlmError, LlmResult};
use crate::message::{ModerationCategory, ModerationVerdict};

/// Decides whether message content may be accepted.
///
/// Implementations never fail: an unreachable or misbehaving backend is
/// reported as an allowing verdict.
#[async_trait]
pub trait Moderator: Send + Sync {
    async fn classify(&self, content: &str) -> ModerationVerdict;
}

/// LLM-backed moderator with fail-open semantics
pub struct LlmModerator {
    client: Option<Arc<dyn LlmClient>>,
    timeout: Duration,
}

impl LlmModerator {
    pub fn new(client: Option<Arc<dyn LlmClient>>, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// A moderator that never calls out and allows everything
    pub fn disabled() -> Self {
        Self::new(None, ModerationConfig::default().timeout)
    }

    /// Build a Gemini-backed moderator, or a disabled one when no API key is set
    pub fn from_config(config: &ModerationConfig) -> Self {
        if !config.has_api_key() {
            warn!("GEMINI_API_KEY not configured, moderation will allow all messages");
            return Self::disabled();
        }

        match GeminiClient::new(config) {
            Ok(client) => Self::new(Some(Arc::new(client)), config.timeout),
            Err(e) => {
                warn!("Failed to create moderation client, allowing all messages: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.client.is_some()
    }

    async fn request_verdict(&self, client: &dyn LlmClient, content: &str) -> LlmResult<ModerationVerdict> {
        let prompt = prompts::classify_message(content);

        let answer = tokio::time::timeout(self.timeout, client.generate_text(&prompt))
            .await
            .map_err(|_| LlmError::Timeout {
                message: format!("no answer within {:?}", self.timeout),
            })??;

        parse_verdict(&answer)
    }
}

#[async_trait]
impl Moderator for LlmModerator {
    async fn classify(&self, content: &str) -> ModerationVerdict {
        let Some(client) = &self.client else {
            return ModerationVerdict::fail_open();
        };

        match self.request_verdict(client.as_ref(), content).await {
            Ok(verdict) => {
                debug!(
                    "Moderation verdict: category={} confidence={}",
                    verdict.category, verdict.confidence
                );
                verdict
            }
            Err(e) => {
                warn!("Moderation failed, allowing message: {}", e);
                ModerationVerdict::fail_open()
            }
        }
    }
}

/// Remove triple-backtick fences (optionally tagged `json`) and surrounding whitespace
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(pos) = rest.find("```") {
        cleaned.push_str(&rest[..pos]);
        rest = &rest[pos + 3..];
        if rest.get(..4).is_some_and(|tag| tag.eq_ignore_ascii_case("json")) {
            rest = &rest[4..];
        }
    }
    cleaned.push_str(rest);

    cleaned.trim().to_string()
}

/// Parse a model answer into a verdict
pub fn parse_verdict(answer: &str) -> LlmResult<ModerationVerdict> {
    let value: Value = serde_json::from_str(&strip_code_fences(answer))?;
    let Value::Object(fields) = value else {
        return Err(LlmError::EmptyResponse {
            message: "moderation answer is not a JSON object".to_string(),
        });
    };

    let category = fields
        .get("category")
        .and_then(Value::as_str)
        .map(ModerationCategory::from)
        .unwrap_or(ModerationCategory::Unknown);

    Ok(ModerationVerdict::classified(
        category,
        confidence_of(&fields),
        reason_of(&fields),
    ))
}

fn confidence_of(fields: &Map<String, Value>) -> f64 {
    match fields.get("confidence") {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        Some(Value::Bool(b)) => f64::from(u8::from(*b)),
        _ => 0.0,
    }
}

fn reason_of(fields: &Map<String, Value>) -> String {
    match fields.get("reason") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::mock;
    use mockall::predicate::*;

    mock! {
        TestLlm {}

        #[async_trait]
        impl LlmClient for TestLlm {
            async fn generate_text(&self, prompt: &str) -> LlmResult<String>;
        }
    }

    struct SlowLlm {
        delay: Duration,
    }

    #[async_trait]
    impl LlmClient for SlowLlm {
        async fn generate_text(&self, _prompt: &str) -> LlmResult<String> {
            tokio::time::sleep(self.delay).await;
            Ok(r#"{"category": "toxic", "confidence": 0.9}"#.to_string())
        }
    }

    fn moderator_answering(answer: &'static str) -> LlmModerator {
        let mut llm = MockTestLlm::new();
        llm.expect_generate_text()
            .times(1)
            .returning(move |_| Ok(answer.to_string()));
        LlmModerator::new(Some(Arc::new(llm)), Duration::from_secs(5))
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```JSON {\"a\":1} ```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{}\n```\n"), "{}");
        assert_eq!(strip_code_fences("  {\"a\":1}  "), "{\"a\":1}");
        assert_eq!(strip_code_fences(""), "");
    }

    #[test]
    fn test_parse_verdict_defaults() {
        let verdict = parse_verdict("{}").unwrap();
        assert_eq!(verdict.category, ModerationCategory::Unknown);
        assert_eq!(verdict.confidence, 0.0);
        assert_eq!(verdict.reason, "");
        assert!(!verdict.is_allowed);
    }

    #[test]
    fn test_parse_verdict_coerces_confidence() {
        let verdict = parse_verdict(r#"{"category":"clean","confidence":"0.75"}"#).unwrap();
        assert_eq!(verdict.confidence, 0.75);

        let verdict = parse_verdict(r#"{"category":"clean","confidence":"high"}"#).unwrap();
        assert_eq!(verdict.confidence, 0.0);

        let verdict = parse_verdict(r#"{"category":"spam","confidence":-5}"#).unwrap();
        assert_eq!(verdict.confidence, 0.0);

        let verdict = parse_verdict(r#"{"category":"spam","confidence":1.7}"#).unwrap();
        assert_eq!(verdict.confidence, 1.0);
    }

    #[test]
    fn test_parse_verdict_requires_exact_clean() {
        for answer in [r#"{"category":"Clean"}"#, r#"{"category":" CLEAN "}"#] {
            let verdict = parse_verdict(answer).unwrap();
            assert_eq!(verdict.category, ModerationCategory::Unknown);
            assert!(!verdict.is_allowed);
        }
    }

    #[test]
    fn test_parse_verdict_rejects_non_objects() {
        assert!(parse_verdict("[1,2,3]").is_err());
        assert!(parse_verdict("clean").is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_moderator_fails_open() {
        let moderator = LlmModerator::from_config(&ModerationConfig::default());
        assert!(!moderator.is_enabled());
        assert_eq!(moderator.classify("anything").await, ModerationVerdict::fail_open());
    }

    #[tokio::test]
    async fn test_clean_answer_is_allowed() {
        let moderator = moderator_answering(
            "```json\n{\"category\": \"clean\", \"confidence\": 0.98, \"reason\": \"greeting\"}\n```",
        );

        let verdict = moderator.classify("hello there").await;
        assert!(verdict.is_allowed);
        assert_eq!(verdict.category, ModerationCategory::Clean);
        assert_eq!(verdict.confidence, 0.98);
        assert_eq!(verdict.reason, "greeting");
    }

    #[tokio::test]
    async fn test_non_clean_categories_are_not_allowed() {
        for (answer, category) in [
            (r#"{"category": "toxic", "confidence": 0.8}"#, ModerationCategory::Toxic),
            (r#"{"category": "spam", "confidence": 0.8}"#, ModerationCategory::Spam),
            (r#"{"category": "harassment", "confidence": 0.8}"#, ModerationCategory::Harassment),
            (r#"{"category": "weird", "confidence": 0.8}"#, ModerationCategory::Unknown),
        ] {
            let verdict = moderator_answering(answer).classify("msg").await;
            assert!(!verdict.is_allowed);
            assert_eq!(verdict.category, category);
        }
    }

    #[tokio::test]
    async fn test_prompt_contains_message() {
        let mut llm = MockTestLlm::new();
        llm.expect_generate_text()
            .with(function(|prompt: &str| prompt.contains("\"is this spam?\"")))
            .times(1)
            .returning(|_| Ok(r#"{"category": "clean"}"#.to_string()));
        let moderator = LlmModerator::new(Some(Arc::new(llm)), Duration::from_secs(5));

        assert!(moderator.classify("is this spam?").await.is_allowed);
    }

    #[tokio::test]
    async fn test_malformed_answer_fails_open() {
        let verdict = moderator_answering("I think this is fine").classify("msg").await;
        assert_eq!(verdict, ModerationVerdict::fail_open());
    }

    #[tokio::test]
    async fn test_client_error_fails_open() {
        let mut llm = MockTestLlm::new();
        llm.expect_generate_text().times(1).returning(|_| {
            Err(LlmError::Status {
                status: 500,
                body: "boom".to_string(),
            })
        });
        let moderator = LlmModerator::new(Some(Arc::new(llm)), Duration::from_secs(5));

        let verdict = moderator.classify("msg").await;
        assert!(verdict.is_allowed);
        assert_eq!(verdict, ModerationVerdict::fail_open());
    }

    #[tokio::test]
    async fn test_timeout_fails_open() {
        let llm = SlowLlm {
            delay: Duration::from_millis(500),
        };
        let moderator = LlmModerator::new(Some(Arc::new(llm)), Duration::from_millis(50));

        let started = std::time::Instant::now();
        let verdict = moderator.classify("msg").await;

        assert_eq!(verdict, ModerationVerdict::fail_open());
        assert!(started.elapsed() < Duration::from_millis(400));
    }
}
