use parley_types::Message;

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// One independent message history bound to a (provider, model) pair.
///
/// Fields stay private so the lifecycle invariants hold: a started
/// conversation always has a provider and model, and neither changes after
/// `start`. New conversations begin with an empty transcript, with no
/// seeded system message.
#[derive(Debug, Clone)]
pub struct Conversation {
    id: u64,
    title: String,
    provider: Option<String>,
    model: Option<String>,
    started: bool,
    messages: Vec<Message>,
    processing: bool,
}

impl Conversation {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            title: "New conversation".to_string(),
            provider: None,
            model: None,
            started: false,
            messages: Vec::new(),
            processing: false,
        }
    }

    /// Binds the conversation to a provider and model. Happens at most
    /// once; a second call is a no-op and returns `false`.
    pub fn start(&mut self, provider: impl Into<String>, model: impl Into<String>) -> bool {
        if self.started {
            return false;
        }
        let provider = provider.into();
        let model = model.into();
        self.title = format!("{provider} - {model}");
        self.provider = Some(provider);
        self.model = Some(model);
        self.started = true;
        true
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    /// True while a response request is in flight.
    pub fn is_processing(&self) -> bool {
        self.processing
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// The transcript without system messages, for rendering.
    pub fn visible_messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().filter(|m| !m.is_system())
    }

    pub(crate) fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub(crate) fn set_processing(&mut self, processing: bool) {
        self.processing = processing;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
