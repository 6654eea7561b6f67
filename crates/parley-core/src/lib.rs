//! # Parley Core
//!
//! The building blocks every other Parley crate agrees on.
//!
//! ## Contents
//!
//! - **Model**: inbound [`Message`]s and [`Event`]s, outbound [`Envelope`]s
//!   and [`MessageEdit`]s, the bot's own [`BotProfile`].
//! - **Client seams**: [`ChatClient`] for request/response calls and
//!   [`EventFeed`] for the long-poll event stream.
//! - **Send guard**: the sliding-window [`RateLimiter`].
//! - **Mention filter**: [`extract_query_without_mention`].
//! - **Errors**: [`ApiError`] and the [`BoxError`] used by plugins.
//!
//! ## Layering
//!
//! ```text
//! ┌──────────────────┐   ┌──────────────────┐
//! │ parley-transport │   │ parley-framework │
//! │  (REST client)   │   │ (facade, loop)   │
//! └────────┬─────────┘   └────────┬─────────┘
//!          └──────────┬───────────┘
//!              ┌──────▼──────┐
//!              │ parley-core │
//!              └─────────────┘
//! ```

pub mod client;
pub mod error;
pub mod event;
pub mod mention;
pub mod message;
pub mod rate_limit;

pub use client::{BoxedClient, ChatClient, EventFeed, StorageMap};
pub use error::{ApiError, ApiResult, BAD_EVENT_QUEUE_ID, BoxError};
pub use event::{Event, EventFlags, EventKind, FLAG_MENTIONED};
pub use mention::{extract_query_without_mention, mention_token};
pub use message::{
    BotProfile, Conversation, ConversationKind, Destination, Envelope, Message, MessageEdit,
    MessageReceipt, Participant,
};
pub use rate_limit::RateLimiter;
