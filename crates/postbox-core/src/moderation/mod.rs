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

//! Content moderation
//!
//! A [`Moderator`] turns message content into a [`ModerationVerdict`]. The
//! only implementation, [`LlmModerator`], asks an LLM to categorize the
//! content and falls back to an allowing verdict whenever the model is not
//! configured or cannot produce a usable answer.
//!
//! [`ModerationVerdict`]: crate::message::ModerationVerdict

pub mod classifier;
pub mod client;
pub mod config;
pub mod gemini_client;
pub mod prompts;

pub use classifier::{strip_code_fences, LlmModerator, Moderator};
pub use client::LlmClient;
pub use config::ModerationConfig;
pub use gemini_client::GeminiClient;
