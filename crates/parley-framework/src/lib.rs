//! # Parley Framework
//!
//! Everything between the wire and a bot's own logic.
//!
//! - [`BotPlugin`] and [`PluginDescriptor`]: what a bot is and how it is
//!   registered, including its declared [`Capability`]s.
//! - [`BotHandler`]: the facade a plugin talks through (identity,
//!   rate-limited messaging, config sections, scoped file access, storage).
//! - [`StateStore`]: dirty-tracked storage flushed after every message.
//! - [`EventDispatcher`]: the filter-and-dispatch loop over an
//!   [`EventFeed`](parley_core::EventFeed).
//!
//! With the `testing` feature, [`testing`] provides an in-memory chat client
//! and a scripted event feed for plugin tests.

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod plugin;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::{ConfigProvider, ConfigSection, NoConfig, StaticConfig};
pub use dispatcher::{EventDispatcher, Outcome};
pub use error::{
    BotConfigError, DispatchError, DispatchResult, HandlerError, HandlerResult, StateError,
    StateResult,
};
pub use handler::{BotHandler, BotHandlerBuilder};
pub use plugin::{BotPlugin, BoxedPlugin, Capability, PluginDescriptor};
pub use state::StateStore;
