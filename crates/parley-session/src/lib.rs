//! Conversation state and dispatch for the parley chat core.
//!
//! Provides `Conversation` (one transcript bound to a provider/model pair)
//! and `Session` (the conversation set, active selection, id allocation,
//! and the single-flight send path).

mod conversation;
mod session;

pub use conversation::Conversation;
pub use session::Session;
