//! # Parley
//!
//! Chat bots as plugins, with the plumbing handled for you.
//!
//! ## Overview
//!
//! A bot is a [`BotPlugin`](prelude::BotPlugin) registered through a static
//! [`PluginDescriptor`](prelude::PluginDescriptor). The runtime connects to
//! the chat server, long-polls its event queue and hands every message
//! addressed to the bot (private messages, and stream messages that start
//! with an @-mention of it) to the plugin together with a
//! [`BotHandler`](prelude::BotHandler).
//!
//! ```text
//! ┌──────────────┐     ┌────────────┐     ┌──────────────┐
//! │  EventQueue  │────▶│ Dispatcher │────▶│    Plugin    │
//! │ (long-poll)  │     │  (filter)  │     │              │
//! └──────────────┘     └─────┬──────┘     └──────┬───────┘
//!                            │ flush             │ send / reply / storage
//!                      ┌─────▼───────────────────▼─────┐
//!                      │   BotHandler (rate-limited)   │
//!                      └───────────────────────────────┘
//! ```
//!
//! The handler sends messages under a sliding-window rate limit, confines
//! file access to the bot's root directory, reads the bot's `.conf` section
//! and, for plugins that declare [`Capability::Storage`](prelude::Capability),
//! keeps a key-value store that is flushed to the server after every message.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! struct HelloWorld;
//!
//! #[async_trait]
//! impl BotPlugin for HelloWorld {
//!     fn usage(&self) -> &str {
//!         "Replies with a friendly greeting."
//!     }
//!
//!     async fn handle_message(
//!         &mut self,
//!         message: &Message,
//!         handler: &mut BotHandler,
//!     ) -> Result<(), BoxError> {
//!         handler.send_reply(message, "beep boop").await?;
//!         Ok(())
//!     }
//! }
//!
//! static HELLOWORLD: PluginDescriptor =
//!     PluginDescriptor::new("helloworld", || Box::new(HelloWorld));
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     BotRuntime::builder(HELLOWORLD).build()?.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `rest-client` (default): REST transport and `BotRuntime::run`
//! - `testing`: `MockChatClient` and `ScriptedFeed` for plugin tests
//! - `yaml-config`: accept `parley.yaml`
//! - `json-log`: JSON log lines

pub use parley_core as core;
pub use parley_framework as framework;
pub use parley_runtime as runtime;
pub use parley_transport as transport;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use parley::prelude::*;
/// ```
pub mod prelude {
    // Runtime - main entry point
    pub use parley_runtime::{BotRuntime, RuntimeError, RuntimeResult};

    // Plugin system
    pub use parley_framework::{
        BotHandler, BotPlugin, BoxedPlugin, Capability, HandlerError, HandlerResult,
        PluginDescriptor,
    };

    // Messages in and out
    pub use parley_core::{
        BoxError, Conversation, ConversationKind, Envelope, Message, MessageEdit, MessageReceipt,
    };

    // Implementing plugins
    pub use async_trait::async_trait;
    pub use parley_runtime::prelude::*;
}
