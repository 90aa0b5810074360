//! OpenAI-compatible request and response types
//!
//! These types follow the wire shape of the OpenAI Chat Completions API.
//! The request is decoded leniently: every field defaults to its zero value
//! and unknown fields are ignored, since the fake backend never interprets
//! anything but `model` (echoed) and `stream` (branch).

use serde::{Deserialize, Serialize};

// =============================================================================
// OpenAI API Object Type Constants
// =============================================================================

/// Object type for non-streaming chat completion responses
pub const OBJECT_CHAT_COMPLETION: &str = "chat.completion";
/// Object type for streaming chat completion chunks
pub const OBJECT_CHAT_COMPLETION_CHUNK: &str = "chat.completion.chunk";
/// Role carried by every generated message
pub const ROLE_ASSISTANT: &str = "assistant";

// =============================================================================
// Chat Completion Request
// =============================================================================

/// A single message in the conversation
///
/// `role` is free-form; the fake backend never validates it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// Assistant message with the given content
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ROLE_ASSISTANT, content)
    }
}

/// OpenAI-compatible chat completion request
///
/// Immutable once decoded. Clients and tests build one with
/// [`ChatCompletionRequest::new`] and serialize it as the request body.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    model: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
    #[serde(default)]
    stream: bool,
}

impl ChatCompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, stream: bool) -> Self {
        Self {
            model: model.into(),
            messages,
            stream,
        }
    }

    /// Model name, echoed verbatim into every response (may be empty)
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Whether the client asked for an SSE stream
    pub fn stream(&self) -> bool {
        self.stream
    }
}

// =============================================================================
// Chat Completion Response (Non-Streaming)
// =============================================================================

/// Finish reason for a completion
///
/// The fake backend always runs the canned reply to its end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
}

/// A single choice in the response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    pub finish_reason: FinishReason,
}

/// OpenAI-compatible chat completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletion {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<Choice>,
}

impl ChatCompletion {
    /// Create a completion carrying the whole reply in one assistant message
    pub fn new(id: &str, model: &str, created: i64, content: &str) -> Self {
        Self {
            id: id.to_string(),
            object: OBJECT_CHAT_COMPLETION.to_string(),
            created,
            model: model.to_string(),
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant(content),
                finish_reason: FinishReason::Stop,
            }],
        }
    }
}

/// Get the current Unix timestamp for response creation.
///
/// Returns 0 and logs a warning if the system clock is before the UNIX epoch.
pub fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_else(|e| {
            tracing::warn!(
                error = %e,
                "System clock appears to be before UNIX epoch - using 0 as timestamp"
            );
            0
        })
}

// =============================================================================
// Chat Completion Chunk (Streaming)
// =============================================================================

/// Delta content in a streaming chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A single choice in a streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkChoice {
    pub delta: Delta,
    pub index: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<FinishReason>,
}

/// OpenAI-compatible streaming chunk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: i64,
    pub model: String,
    pub choices: Vec<ChunkChoice>,
}

impl ChatCompletionChunk {
    fn with_choice(id: &str, model: &str, created: i64, choice: ChunkChoice) -> Self {
        Self {
            id: id.to_string(),
            object: OBJECT_CHAT_COMPLETION_CHUNK.to_string(),
            created,
            model: model.to_string(),
            choices: vec![choice],
        }
    }

    /// Create an initial chunk with role announcement
    pub fn initial(id: &str, model: &str, created: i64) -> Self {
        Self::with_choice(
            id,
            model,
            created,
            ChunkChoice {
                delta: Delta {
                    role: Some(ROLE_ASSISTANT.to_string()),
                    content: None,
                },
                index: 0,
                finish_reason: None,
            },
        )
    }

    /// Create a content chunk, optionally closing the message
    pub fn content(
        id: &str,
        model: &str,
        created: i64,
        content: &str,
        finish_reason: Option<FinishReason>,
    ) -> Self {
        Self::with_choice(
            id,
            model,
            created,
            ChunkChoice {
                delta: Delta {
                    role: None,
                    content: Some(content.to_string()),
                },
                index: 0,
                finish_reason,
            },
        )
    }

    /// The single choice of this chunk
    pub fn choice(&self) -> Option<&ChunkChoice> {
        self.choices.first()
    }
}

// =============================================================================
// Tests
// =============================================================================
