use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "llama-4-scout-17b-16e-instruct";

pub const CEREBRAS_API_KEY_ENV_VAR: &str = "CEREBRAS_API_KEY";
pub const OPENROUTER_API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

const CEREBRAS_URL: &str = "https://api.cerebras.ai/v1/chat/completions";
const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// Where completions are fetched from. Each variant stores the *name* of the
/// environment variable holding the key; the key itself is read per call.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub enum Provider {
    Cerebras { api_key_env_var: String },
    OpenRouter { api_key_env_var: String },
}

impl Provider {
    pub fn cerebras(api_key_env_var_name: &str) -> Self {
        Self::Cerebras {
            api_key_env_var: api_key_env_var_name.to_string(),
        }
    }

    pub fn openrouter(api_key_env_var_name: &str) -> Self {
        Self::OpenRouter {
            api_key_env_var: api_key_env_var_name.to_string(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Cerebras { .. } => "cerebras",
            Provider::OpenRouter { .. } => "openrouter",
        }
    }

    pub fn url(&self) -> &'static str {
        match self {
            Provider::Cerebras { .. } => CEREBRAS_URL,
            Provider::OpenRouter { .. } => OPENROUTER_URL,
        }
    }

    pub fn api_key_env_var(&self) -> &str {
        match self {
            Provider::Cerebras { api_key_env_var } | Provider::OpenRouter { api_key_env_var } => {
                api_key_env_var
            }
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl ChatCompletionRequest {
    /// Content of the first message with the given role, if any.
    pub fn message_content(&self, role: &str) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponseMessage {
    pub role: String,
    // Some providers send `null` content on refusals.
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
    #[serde(default)]
    pub finish_reason: Option<String>,
    pub index: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: Option<u32>,
    pub total_tokens: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChatCompletionResponse {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatCompletionChoice>,
    #[serde(default)]
    pub usage: Option<ChatCompletionUsage>,
}

impl ChatCompletionResponse {
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
    }
}
