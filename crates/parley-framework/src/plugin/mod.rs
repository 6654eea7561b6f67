//! Plugin system for the Parley framework.
//!
//! # Architecture
//!
//! A bot is a [`BotPlugin`]: an object with one required entry point
//! (`handle_message`), a `usage` string and an optional `initialize` hook.
//!
//! A [`PluginDescriptor`] is the *static, `Copy` handle* to a plugin. It
//! carries the plugin's name, description and declared [`Capability`]s plus a
//! factory function pointer. The runtime builds the facade from the
//! descriptor and then calls [`PluginDescriptor::instantiate`].
//!
//! # Quick start
//!
//! ```rust,ignore
//! use parley::prelude::*;
//!
//! #[derive(Default)]
//! struct Echo;
//!
//! #[async_trait]
//! impl BotPlugin for Echo {
//!     fn usage(&self) -> &str {
//!         "Repeats whatever you say to it."
//!     }
//!
//!     async fn handle_message(
//!         &mut self,
//!         message: &Message,
//!         handler: &mut BotHandler,
//!     ) -> Result<(), BoxError> {
//!         handler.send_reply(message, &message.content).await?;
//!         Ok(())
//!     }
//! }
//!
//! pub static ECHO: PluginDescriptor = PluginDescriptor::new("echo", || Box::new(Echo));
//! ```
//!
//! # Storage
//!
//! Storage is opt-in. A plugin that calls
//! [`BotHandler::storage_mut`](crate::handler::BotHandler::storage_mut)
//! without declaring [`Capability::Storage`] gets a fatal
//! [`HandlerError::Capability`](crate::error::HandlerError::Capability).

pub mod core;
pub mod descriptor;

pub use self::core::{BotPlugin, BoxedPlugin};
pub use descriptor::{Capability, PluginDescriptor};
