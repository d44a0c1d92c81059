pub mod connection;
pub mod endpoints;

pub use connection::{ApiClient, ApiConnectionError, CompletionService};
pub use endpoints::{ChatCompletionRequest, ChatMessage, Provider, DEFAULT_MODEL};
