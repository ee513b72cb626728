pub mod prompt;

use crate::completion::{CompletionClient, CompletionError, CompletionResult, Conversation};
use crate::relay::prompt::SystemPrompt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use tracing::log::{info, warn};

/// Sent whenever a request fails outside the completion call itself.
pub const GENERIC_FAILURE_REPLY: &str = "Sorry, a technical error occurred. Please try again.";

/// Canned message used by the operator self-test.
pub const SELF_TEST_MESSAGE: &str = "Hello, this is a test";

const LOG_SEPARATOR: &str = "============================================================";

/// Inbound WhatsApp message as posted by Twilio (form encoded).
#[derive(Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct InboundMessage {
    #[serde(rename = "From", default)]
    pub from: String,

    #[serde(rename = "ProfileName", default)]
    pub profile_name: Option<String>,

    #[serde(rename = "Body", default)]
    pub body: String,
}

/// Turns inbound messages into replies through the completion client.
#[derive(Clone)]
pub struct Relay {
    client: Option<Arc<dyn CompletionClient>>,
    prompt: Arc<SystemPrompt>,
}
impl Relay {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, prompt: SystemPrompt) -> Self {
        Self {
            client,
            prompt: Arc::new(prompt),
        }
    }

    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    pub fn display_name<'a>(&'a self, profile_name: Option<&'a str>) -> &'a str {
        profile_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| self.prompt.default_name())
    }

    /// Makes exactly one completion request for the message body.
    pub async fn complete(&self, display_name: &str, body: &str) -> CompletionResult {
        let Some(client) = &self.client else {
            return Err(CompletionError::NotConfigured);
        };

        let conversation = Conversation::new(self.prompt.render(display_name), body);
        client.complete(&conversation).await
    }

    /// Operator smoke test through the same path as real messages.
    pub async fn self_test(&self) -> CompletionResult {
        self.complete(self.prompt.default_name(), SELF_TEST_MESSAGE).await
    }

    /// Always yields a reply: the completion text verbatim, or the fallback for its failure.
    #[instrument(skip_all, fields(from = %message.from))]
    pub async fn reply_to(&self, message: InboundMessage) -> String {
        let body = message.body.trim();
        let display_name = self.display_name(message.profile_name.as_deref());

        info!("{LOG_SEPARATOR}");
        info!("New message");
        info!("From: {}", message.from);
        info!("Name: {display_name}");
        info!("Message: {body}");
        info!("{LOG_SEPARATOR}");

        let reply = match self.complete(display_name, body).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Completion failed, sending fallback reply: {e}");
                e.fallback_reply().to_string()
            }
        };

        info!("Reply sent: {reply}");
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::testing::FakeCompletionClient;

    fn relay_with(client: Option<Arc<FakeCompletionClient>>) -> Relay {
        let client = client.map(|c| c as Arc<dyn CompletionClient>);
        Relay::new(client, SystemPrompt::new("Assist {name}.", "Customer"))
    }

    fn message(from: &str, profile_name: Option<&str>, body: &str) -> InboundMessage {
        InboundMessage {
            from: from.to_string(),
            profile_name: profile_name.map(str::to_string),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn test_reply_is_completion_verbatim() {
        let fake = Arc::new(FakeCompletionClient::replying("  Use 3 bags.\n"));
        let relay = relay_with(Some(fake.clone()));

        let reply = relay
            .reply_to(message("whatsapp:+15550001", Some("Ana"), "  how much cement?  "))
            .await;

        assert_eq!(reply, "  Use 3 bags.\n");
        let calls = fake.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], Conversation::new("Assist Ana.", "how much cement?"));
    }

    #[tokio::test]
    async fn test_missing_profile_name_uses_default() {
        let fake = Arc::new(FakeCompletionClient::replying("ok"));
        let relay = relay_with(Some(fake.clone()));

        relay.reply_to(message("whatsapp:+15550001", None, "hi")).await;
        relay.reply_to(message("whatsapp:+15550001", Some("   "), "hi")).await;

        let calls = fake.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls.iter().all(|c| c.system == "Assist Customer."));
    }

    #[tokio::test]
    async fn test_missing_body_is_empty() {
        let fake = Arc::new(FakeCompletionClient::replying("ok"));
        let relay = relay_with(Some(fake.clone()));

        let reply = relay.reply_to(InboundMessage::default()).await;

        assert_eq!(reply, "ok");
        assert_eq!(fake.calls()[0].user, "");
    }

    #[tokio::test]
    async fn test_failures_map_to_fallbacks() {
        let failures = [
            CompletionError::Authentication("bad key".to_string()),
            CompletionError::RateLimited("slow down".to_string()),
            CompletionError::Api("boom".to_string()),
            CompletionError::Unclassified("eof".to_string()),
        ];

        for failure in failures {
            let expected = failure.fallback_reply();
            let fake = Arc::new(FakeCompletionClient::new(Err(failure)));
            let relay = relay_with(Some(fake.clone()));

            let reply = relay.reply_to(message("x", None, "hi")).await;
            assert_eq!(reply, expected);
            assert_eq!(fake.calls().len(), 1, "failures must not be retried");
        }
    }

    #[tokio::test]
    async fn test_unconfigured_client() {
        let relay = relay_with(None);

        assert!(!relay.is_available());
        assert_eq!(
            relay.reply_to(message("x", Some("Ana"), "hi")).await,
            CompletionError::NotConfigured.fallback_reply()
        );
        assert_eq!(relay.self_test().await, Err(CompletionError::NotConfigured));
    }

    #[tokio::test]
    async fn test_self_test_uses_canned_message() {
        let fake = Arc::new(FakeCompletionClient::replying("pong"));
        let relay = relay_with(Some(fake.clone()));

        assert_eq!(relay.self_test().await, Ok("pong".to_string()));
        assert_eq!(
            fake.calls(),
            vec![Conversation::new("Assist Customer.", SELF_TEST_MESSAGE)]
        );
    }

    #[test]
    fn test_inbound_message_form_fields() {
        let message: InboundMessage = serde_json::from_value(serde_json::json!({
            "From": "whatsapp:+15550001",
            "ProfileName": "Ana",
            "Body": "hello",
            "MessageSid": "SM123"
        }))
        .unwrap();

        assert_eq!(message.from, "whatsapp:+15550001");
        assert_eq!(message.profile_name.as_deref(), Some("Ana"));
        assert_eq!(message.body, "hello");
    }
}
