use std::sync::Arc;
use tracing::{debug, warn};

use super::render::markdown_to_html;
use super::{Message, Transcript};
use crate::proxy::CompletionClient;

/// One conversation, owned by exactly one connection.
pub struct Session {
    client: Arc<dyn CompletionClient>,
    transcript: Transcript,
}

impl Session {
    pub fn new(client: Arc<dyn CompletionClient>, system_prompt: &str) -> Self {
        Self {
            client,
            transcript: Transcript::new(system_prompt),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Run one turn and return the rendered reply chunk.
    ///
    /// The user message is always recorded. The assistant message is only
    /// recorded when the completion succeeds; on failure the returned chunk
    /// is the rendered `Error: <description>` and the session stays usable.
    pub async fn submit(&mut self, user_text: impl Into<String>) -> String {
        let user_text = user_text.into();
        debug!(chars = user_text.chars().count(), "submitting user message");
        self.transcript.push(Message::user(user_text));

        match self.client.complete(self.transcript.messages()).await {
            Ok(reply) => {
                let rendered = markdown_to_html(&reply);
                self.transcript.push(Message::assistant(reply));
                rendered
            }
            Err(e) => {
                warn!(error = %e, "completion failed");
                markdown_to_html(&format!("Error: {}", e))
            }
        }
    }
}
