use std::collections::BTreeMap;

use parley_providers::{Credentials, ProviderRegistry};
use parley_types::{ChatError, Message};

use crate::Conversation;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Owns the conversation set, the active selection, and id allocation, and
/// dispatches user turns to the bound provider.
///
/// The single-flight and active-id invariants live here as methods rather
/// than as flags checked at call sites. Ids come from a monotonic counter
/// and are never reused, even after deletion.
#[derive(Default)]
pub struct Session {
    conversations: BTreeMap<u64, Conversation>,
    active_id: Option<u64>,
    next_id: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new unstarted conversation and makes it active.
    pub fn create_conversation(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.conversations.insert(id, Conversation::new(id));
        self.active_id = Some(id);
        id
    }

    /// Removes a conversation. If it was active, the first remaining
    /// conversation in iteration order becomes active, or none.
    pub fn delete_conversation(&mut self, id: u64) {
        self.conversations.remove(&id);
        if self.active_id == Some(id) {
            self.active_id = self.conversations.keys().next().copied();
        }
    }

    /// Sets the active conversation. The caller guarantees `id` exists.
    pub fn select_conversation(&mut self, id: u64) {
        self.active_id = Some(id);
    }

    pub fn active_id(&self) -> Option<u64> {
        self.active_id
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.and_then(|id| self.conversations.get(&id))
    }

    pub fn conversation(&self, id: u64) -> Option<&Conversation> {
        self.conversations.get(&id)
    }

    pub fn conversation_mut(&mut self, id: u64) -> Option<&mut Conversation> {
        self.conversations.get_mut(&id)
    }

    pub fn conversations(&self) -> impl Iterator<Item = &Conversation> {
        self.conversations.values()
    }

    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }

    /// Appends `text` as a user message, dispatches the full transcript to
    /// the conversation's provider, and appends the reply as an assistant
    /// message. Failures arrive as `"Error: "` text in the transcript, not
    /// as raised faults; `processing` is cleared on every return path.
    ///
    /// Rejected while a request is already in flight (single-flight), and
    /// for unknown or unstarted conversations.
    pub async fn send_message(
        &mut self,
        id: u64,
        text: impl Into<String>,
        registry: &ProviderRegistry,
        credentials: &Credentials,
    ) -> Result<&Conversation, ChatError> {
        let (provider, model, transcript) = {
            let convo = self
                .conversations
                .get_mut(&id)
                .ok_or(ChatError::UnknownConversation { id })?;

            if convo.is_processing() {
                return Err(ChatError::ConversationBusy { id });
            }
            let (Some(provider), Some(model)) = (convo.provider(), convo.model()) else {
                return Err(ChatError::ConversationNotStarted { id });
            };
            let provider = provider.to_string();
            let model = model.to_string();

            convo.push_message(Message::user(text.into()));
            convo.set_processing(true);
            (provider, model, convo.messages().to_vec())
        };

        tracing::info!(conversation = id, provider = %provider, model = %model, "dispatching user turn");

        let reply = match registry.get(&provider) {
            Some(adapter) => {
                let credential = credentials.get(adapter.credential_key()).to_string();
                adapter.send(&model, &transcript, &credential).await
            }
            // Contained like any other request failure: the transcript is
            // the only error channel.
            None => format!("Error: {}", ChatError::UnknownProvider(provider.clone())),
        };

        let convo = self
            .conversations
            .get_mut(&id)
            .ok_or(ChatError::UnknownConversation { id })?;
        convo.push_message(Message::assistant(reply));
        convo.set_processing(false);

        Ok(&*convo)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use parley_providers::ProviderAdapter;

    /// Echoes the last user message back, prefixed.
    struct EchoAdapter;

    #[async_trait]
    impl ProviderAdapter for EchoAdapter {
        fn name(&self) -> &str {
            "Echo"
        }

        fn credential_key(&self) -> &str {
            "echo"
        }

        async fn fetch_models(&self, _credential: &str) -> Result<Vec<String>, ChatError> {
            Ok(vec!["echo-1".into()])
        }

        async fn complete(
            &self,
            _model: &str,
            transcript: &[Message],
            _credential: &str,
        ) -> Result<String, ChatError> {
            let last = transcript.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(format!("echo: {last}"))
        }
    }

    /// Always fails with a timeout.
    struct TimeoutAdapter;

    #[async_trait]
    impl ProviderAdapter for TimeoutAdapter {
        fn name(&self) -> &str {
            "Flaky"
        }

        fn credential_key(&self) -> &str {
            "flaky"
        }

        async fn fetch_models(&self, _credential: &str) -> Result<Vec<String>, ChatError> {
            Ok(vec!["flaky-1".into()])
        }

        async fn complete(
            &self,
            _model: &str,
            _transcript: &[Message],
            _credential: &str,
        ) -> Result<String, ChatError> {
            Err(ChatError::Timeout {
                provider: "Flaky".into(),
                timeout_ms: 60_000,
            })
        }
    }

    fn echo_registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::empty();
        registry.register(EchoAdapter);
        registry.register(TimeoutAdapter);
        registry
    }

    #[test]
    fn create_makes_conversation_active() {
        let mut session = Session::new();
        let id = session.create_conversation();
        assert_eq!(session.active_id(), Some(id));
        assert_eq!(session.len(), 1);
        assert!(!session.conversation(id).unwrap().started());
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut session = Session::new();
        let a = session.create_conversation();
        let b = session.create_conversation();
        assert!(b > a);

        session.delete_conversation(b);
        let c = session.create_conversation();
        assert!(c > b, "deleted id must not be reused");
    }

    #[test]
    fn delete_only_conversation_clears_active() {
        let mut session = Session::new();
        let id = session.create_conversation();
        session.delete_conversation(id);
        assert!(session.is_empty());
        assert_eq!(session.active_id(), None);
    }

    #[test]
    fn delete_active_falls_back_to_first_remaining() {
        let mut session = Session::new();
        let a = session.create_conversation();
        let b = session.create_conversation();
        session.select_conversation(b);
        session.delete_conversation(b);
        assert_eq!(session.active_id(), Some(a));
    }

    #[test]
    fn delete_inactive_keeps_selection() {
        let mut session = Session::new();
        let a = session.create_conversation();
        let b = session.create_conversation();
        session.select_conversation(a);
        session.delete_conversation(b);
        assert_eq!(session.active_id(), Some(a));
    }

    #[test]
    fn create_then_delete_restores_prior_state() {
        let mut session = Session::new();
        let a = session.create_conversation();
        let before: Vec<u64> = session.conversations().map(|c| c.id()).collect();

        let b = session.create_conversation();
        session.delete_conversation(b);

        let after: Vec<u64> = session.conversations().map(|c| c.id()).collect();
        assert_eq!(before, after);
        // Active falls back to the remaining conversation.
        assert_eq!(session.active_id(), Some(a));
    }

    #[tokio::test]
    async fn send_message_appends_user_then_assistant() {
        let mut session = Session::new();
        let registry = echo_registry();
        let id = session.create_conversation();
        session
            .conversation_mut(id)
            .unwrap()
            .start("Echo", "echo-1");

        let convo = session
            .send_message(id, "hello", &registry, &Credentials::new())
            .await
            .unwrap();

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], Message::user("hello"));
        assert_eq!(messages[1], Message::assistant("echo: hello"));
        assert!(!convo.is_processing());
    }

    #[tokio::test]
    async fn sequential_sends_stay_ordered() {
        let mut session = Session::new();
        let registry = echo_registry();
        let id = session.create_conversation();
        session
            .conversation_mut(id)
            .unwrap()
            .start("Echo", "echo-1");

        let creds = Credentials::new();
        session.send_message(id, "one", &registry, &creds).await.unwrap();
        session.send_message(id, "two", &registry, &creds).await.unwrap();

        let contents: Vec<&str> = session
            .conversation(id)
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, vec!["one", "echo: one", "two", "echo: two"]);
    }

    #[tokio::test]
    async fn failure_is_stored_as_assistant_text() {
        let mut session = Session::new();
        let registry = echo_registry();
        let id = session.create_conversation();
        session
            .conversation_mut(id)
            .unwrap()
            .start("Flaky", "flaky-1");

        let convo = session
            .send_message(id, "hello", &registry, &Credentials::new())
            .await
            .unwrap();

        let messages = convo.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1].role, parley_types::Role::Assistant);
        assert_eq!(
            messages[1].content,
            "Error: request to Flaky timed out after 60000ms"
        );
        assert!(!convo.is_processing(), "processing must clear on the failure path");
    }

    #[tokio::test]
    async fn unregistered_provider_degrades_to_error_text() {
        let mut session = Session::new();
        let registry = ProviderRegistry::empty();
        let id = session.create_conversation();
        session
            .conversation_mut(id)
            .unwrap()
            .start("Ghost", "ghost-1");

        let convo = session
            .send_message(id, "hello", &registry, &Credentials::new())
            .await
            .unwrap();

        assert_eq!(
            convo.messages()[1].content,
            "Error: no provider named 'Ghost' is registered"
        );
        assert!(!convo.is_processing());
    }

    #[tokio::test]
    async fn send_rejected_while_processing() {
        let mut session = Session::new();
        let registry = echo_registry();
        let id = session.create_conversation();
        session
            .conversation_mut(id)
            .unwrap()
            .start("Echo", "echo-1");

        session.conversation_mut(id).unwrap().set_processing(true);
        let err = session
            .send_message(id, "hello", &registry, &Credentials::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationBusy { id: 0 }));

        // The rejected call must not have touched the transcript.
        assert!(session.conversation(id).unwrap().messages().is_empty());
    }

    #[tokio::test]
    async fn send_rejected_before_start() {
        let mut session = Session::new();
        let registry = echo_registry();
        let id = session.create_conversation();

        let err = session
            .send_message(id, "hello", &registry, &Credentials::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::ConversationNotStarted { id: 0 }));
    }

    #[tokio::test]
    async fn send_rejected_for_unknown_conversation() {
        let mut session = Session::new();
        let registry = echo_registry();

        let err = session
            .send_message(42, "hello", &registry, &Credentials::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::UnknownConversation { id: 42 }));
    }
}
