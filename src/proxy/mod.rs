//! Proxy module for the relay server
//!
//! Outbound calls to the chat-completion API. Sessions only see the
//! [`CompletionClient`] trait, so the HTTP client is injected per session
//! and can be swapped for a mock in tests.

mod completion;

pub use completion::{ChatCompletionsClient, CompletionClient};

#[cfg(test)]
pub use completion::MockCompletionClient;
