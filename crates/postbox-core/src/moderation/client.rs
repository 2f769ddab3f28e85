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

use crate::errors::LlmResult;

/// Trait for LLM clients that answer a single free-text prompt
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send the prompt and return the model's textual answer
    async fn generate_text(&self, prompt: &str) -> LlmResult<String>;
}
