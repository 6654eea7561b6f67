//! In-memory doubles for testing plugins and hosts without a server.
//!
//! - [`MockChatClient`] plays the chat service: a fixed profile, a storage
//!   map, a message server that hands out ids, and a log of every call.
//!   Individual operations can be switched to fail.
//! - [`ScriptedFeed`] delivers a fixed list of events, then either closes or
//!   stays open forever.
//! - Message builders ([`private_message`], [`stream_message`]) and
//!   [`bot_profile`] keep test setup short.
//!
//! ```rust,ignore
//! let client = Arc::new(MockChatClient::new());
//! let mut handler = BotHandler::builder(client.clone(), ".").build().await?;
//! plugin.handle_message(&private_message(3, "hello"), &mut handler).await?;
//! assert_eq!(client.unique_reply().content, "Hi there!");
//! ```

use std::collections::VecDeque;

use async_trait::async_trait;
use parking_lot::Mutex;
use parley_core::{
    ApiError, ApiResult, BotProfile, ChatClient, Conversation, Envelope, Event, EventFeed,
    EventFlags, FLAG_MENTIONED, Message, MessageEdit, MessageReceipt, Participant, StorageMap,
    mention_token,
};

/// User id of the profile returned by [`bot_profile`].
pub const BOT_USER_ID: u64 = 1;

/// Profile used by [`MockChatClient::new`].
pub fn bot_profile() -> BotProfile {
    BotProfile {
        user_id: BOT_USER_ID,
        full_name: "Test Bot".into(),
        email: "test-bot@example.com".into(),
    }
}

/// Builds a participant whose email and name derive from `id`.
pub fn participant(id: u64) -> Participant {
    if id == BOT_USER_ID {
        let profile = bot_profile();
        return Participant::new(id, profile.email, profile.full_name);
    }
    Participant::new(id, format!("user{id}@example.com"), format!("User {id}"))
}

/// Builds a private message from `sender_id` to the test bot.
pub fn private_message(sender_id: u64, content: &str) -> Message {
    group_private_message(sender_id, &[], content)
}

/// Builds a private message from `sender_id` to the bot plus `others`.
pub fn group_private_message(sender_id: u64, others: &[u64], content: &str) -> Message {
    let mut recipients = vec![participant(BOT_USER_ID), participant(sender_id)];
    recipients.extend(others.iter().map(|&id| participant(id)));
    let sender = participant(sender_id);
    Message {
        id: 100,
        sender_id,
        sender_email: sender.email,
        sender_full_name: sender.full_name,
        conversation: Conversation::Private { recipients },
        content: content.to_string(),
    }
}

/// Builds a stream message from `sender_id`.
pub fn stream_message(sender_id: u64, stream: &str, topic: &str, content: &str) -> Message {
    let sender = participant(sender_id);
    Message {
        id: 200,
        sender_id,
        sender_email: sender.email,
        sender_full_name: sender.full_name,
        conversation: Conversation::Stream {
            stream: stream.to_string(),
            topic: topic.to_string(),
        },
        content: content.to_string(),
    }
}

/// Wraps a message in an event without flags.
pub fn message_event(message: Message) -> Event {
    Event::message(0, message, EventFlags::new())
}

/// Wraps a message in an event carrying the `mentioned` flag.
pub fn mentioned_event(message: Message) -> Event {
    Event::message(0, message, [FLAG_MENTIONED].into_iter().collect())
}

/// Content that starts with a mention of the test bot.
pub fn mention(text: &str) -> String {
    format!("{} {text}", mention_token(&bot_profile().full_name))
}

// ─── MockChatClient ───────────────────────────────────────────────────────────

#[derive(Default)]
struct MockState {
    storage: StorageMap,
    sent: Vec<Envelope>,
    edits: Vec<MessageEdit>,
    storage_updates: Vec<StorageMap>,
    next_message_id: u64,
    fail_profile: bool,
    fail_storage_fetch: bool,
    fail_storage_updates: bool,
    fail_sends: bool,
}

/// In-memory stand-in for the chat service.
pub struct MockChatClient {
    profile: BotProfile,
    state: Mutex<MockState>,
}

impl MockChatClient {
    /// Creates a client answering with [`bot_profile`] and empty storage.
    pub fn new() -> Self {
        Self::with_profile(bot_profile())
    }

    /// Creates a client answering with `profile`.
    pub fn with_profile(profile: BotProfile) -> Self {
        Self {
            profile,
            state: Mutex::new(MockState {
                next_message_id: 1,
                ..Default::default()
            }),
        }
    }

    /// Seeds the server-side storage with raw (already serialized) values.
    pub fn with_storage<I, K, V>(self, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.state
            .lock()
            .storage
            .extend(entries.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Makes `get_profile` answer with an error result.
    pub fn fail_profile(&self, fail: bool) {
        self.state.lock().fail_profile = fail;
    }

    /// Makes `get_storage` answer with an error result.
    pub fn fail_storage_fetch(&self, fail: bool) {
        self.state.lock().fail_storage_fetch = fail;
    }

    /// Makes `update_storage` answer with an error result.
    pub fn fail_storage_updates(&self, fail: bool) {
        self.state.lock().fail_storage_updates = fail;
    }

    /// Makes `send_message` and `update_message` answer with an error result.
    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().fail_sends = fail;
    }

    /// Every envelope sent so far, in order.
    pub fn sent_messages(&self) -> Vec<Envelope> {
        self.state.lock().sent.clone()
    }

    /// Every edit applied so far, in order.
    pub fn edits(&self) -> Vec<MessageEdit> {
        self.state.lock().edits.clone()
    }

    /// Every successful storage update, in order.
    pub fn storage_updates(&self) -> Vec<StorageMap> {
        self.state.lock().storage_updates.clone()
    }

    /// Current server-side storage.
    pub fn storage_snapshot(&self) -> StorageMap {
        self.state.lock().storage.clone()
    }

    /// Forgets sent messages and edits.
    pub fn reset_transcript(&self) {
        let mut state = self.state.lock();
        state.sent.clear();
        state.edits.clear();
    }

    /// Returns the only message sent so far.
    ///
    /// # Panics
    ///
    /// Panics if the bot sent nothing or more than one message.
    pub fn unique_reply(&self) -> Envelope {
        let mut sent = self.sent_messages();
        assert!(!sent.is_empty(), "the bot is not responding for some reason");
        assert_eq!(
            sent.len(),
            1,
            "the bot is giving too many responses for some reason: {sent:?}"
        );
        sent.remove(0)
    }
}

impl Default for MockChatClient {
    fn default() -> Self {
        Self::new()
    }
}

fn rejected(what: &str) -> ApiError {
    ApiError::remote("BAD_REQUEST", format!("{what} rejected by mock"))
}

#[async_trait]
impl ChatClient for MockChatClient {
    async fn get_profile(&self) -> ApiResult<BotProfile> {
        if self.state.lock().fail_profile {
            return Err(rejected("profile fetch"));
        }
        Ok(self.profile.clone())
    }

    async fn get_storage(&self) -> ApiResult<StorageMap> {
        let state = self.state.lock();
        if state.fail_storage_fetch {
            return Err(rejected("storage fetch"));
        }
        Ok(state.storage.clone())
    }

    async fn update_storage(&self, entries: StorageMap) -> ApiResult<()> {
        let mut state = self.state.lock();
        if state.fail_storage_updates {
            return Err(rejected("storage update"));
        }
        state.storage.extend(entries.clone());
        state.storage_updates.push(entries);
        Ok(())
    }

    async fn send_message(&self, envelope: &Envelope) -> ApiResult<MessageReceipt> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(rejected("send"));
        }
        let id = state.next_message_id;
        state.next_message_id += 1;
        state.sent.push(envelope.clone());
        Ok(MessageReceipt { id })
    }

    async fn update_message(&self, edit: &MessageEdit) -> ApiResult<()> {
        let mut state = self.state.lock();
        if state.fail_sends {
            return Err(rejected("update"));
        }
        state.edits.push(edit.clone());
        Ok(())
    }
}

// ─── ScriptedFeed ─────────────────────────────────────────────────────────────

/// Event feed that replays a fixed list of events.
pub struct ScriptedFeed {
    events: VecDeque<ApiResult<Event>>,
    hold_open: bool,
}

impl ScriptedFeed {
    /// Creates a feed that delivers `events` and then closes.
    pub fn new(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            events: events.into_iter().map(Ok).collect(),
            hold_open: false,
        }
    }

    /// Appends a failure after the scripted events.
    pub fn then_fail(mut self, error: ApiError) -> Self {
        self.events.push_back(Err(error));
        self
    }

    /// Keeps the feed open (waiting forever) once the script runs out,
    /// like an idle long-poll.
    pub fn hold_open(mut self) -> Self {
        self.hold_open = true;
        self
    }

    /// Number of events not yet delivered.
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

#[async_trait]
impl EventFeed for ScriptedFeed {
    async fn next_event(&mut self) -> ApiResult<Option<Event>> {
        match self.events.pop_front() {
            Some(next) => next.map(Some),
            None if self.hold_open => std::future::pending().await,
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unique_reply() {
        let client = MockChatClient::new();
        client
            .send_message(&Envelope::private(["a@example.com"], "only"))
            .await
            .unwrap();
        assert_eq!(client.unique_reply().content, "only");
    }

    #[tokio::test]
    #[should_panic(expected = "too many responses")]
    async fn test_unique_reply_rejects_extra_messages() {
        let client = MockChatClient::new();
        for content in ["one", "two"] {
            client
                .send_message(&Envelope::private(["a@example.com"], content))
                .await
                .unwrap();
        }
        client.unique_reply();
    }

    #[test]
    #[should_panic(expected = "not responding")]
    fn test_unique_reply_rejects_silence() {
        MockChatClient::new().unique_reply();
    }
}
