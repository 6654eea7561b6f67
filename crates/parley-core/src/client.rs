//! Interfaces to the remote chat service.
//!
//! The runtime never talks HTTP directly. Everything it needs from the server
//! goes through two seams:
//!
//! - [`ChatClient`]: request/response calls (profile, storage, sending).
//! - [`EventFeed`]: the blocking long-poll that delivers one event at a time.
//!
//! `parley-transport` provides the REST implementations; tests use the
//! in-memory doubles from `parley_framework::testing`.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ApiResult;
use crate::event::Event;
use crate::message::{BotProfile, Envelope, MessageEdit, MessageReceipt};

/// Serialized bot storage: key → JSON text.
pub type StorageMap = BTreeMap<String, String>;

/// Request/response operations offered by the chat service.
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Fetches the profile of the account the client is authenticated as.
    async fn get_profile(&self) -> ApiResult<BotProfile>;

    /// Fetches the complete storage map of this bot.
    async fn get_storage(&self) -> ApiResult<StorageMap>;

    /// Writes the given entries, leaving every other key untouched.
    async fn update_storage(&self, entries: StorageMap) -> ApiResult<()>;

    /// Sends a new message.
    async fn send_message(&self, envelope: &Envelope) -> ApiResult<MessageReceipt>;

    /// Replaces the content of an existing message.
    async fn update_message(&self, edit: &MessageEdit) -> ApiResult<()>;
}

/// Shared, type-erased chat client.
pub type BoxedClient = Arc<dyn ChatClient>;

/// A source of events, one at a time and in delivery order.
///
/// `next_event` is the only place the dispatch loop waits. Implementations
/// may block for a long time (long-poll) and handle their own reconnection;
/// returning `Ok(None)` means the feed is closed for good.
#[async_trait]
pub trait EventFeed: Send {
    /// Waits for the next event.
    async fn next_event(&mut self) -> ApiResult<Option<Event>>;
}

#[async_trait]
impl<F: EventFeed + ?Sized> EventFeed for Box<F> {
    async fn next_event(&mut self) -> ApiResult<Option<Event>> {
        (**self).next_event().await
    }
}
