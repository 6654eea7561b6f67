//! Event dispatcher for the Parley framework.
//!
//! The [`EventDispatcher`] owns the plugin and its [`BotHandler`] and drives
//! them from an [`EventFeed`]. Each event goes through the same steps:
//!
//! 1. Non-message events are ignored.
//! 2. The message is addressed to the bot if it is a private message from
//!    someone else, or if the event carries the `mentioned` flag.
//! 3. For mentions the leading `@**Bot Name**` is stripped; a mention that
//!    does not start the message drops the event.
//! 4. Addressed messages are handed to the plugin, one at a time.
//! 5. Storage is flushed.
//!
//! ```rust,ignore
//! let mut dispatcher = EventDispatcher::new("helloworld", plugin, handler);
//! dispatcher.initialize().await?;
//! dispatcher.run(&mut feed, &shutdown).await?;
//! ```
//!
//! Cancellation is only observed while waiting for the next event, never
//! while the plugin runs or storage is flushed.

use parley_core::{BoxError, Event, EventFeed, EventKind, extract_query_without_mention};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, debug_span, error, info};

use crate::error::{DispatchError, DispatchResult, HandlerError, StateError};
use crate::handler::BotHandler;
use crate::plugin::BoxedPlugin;

/// What happened to a single event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a message event.
    Ignored,
    /// The bot was mentioned, but not at the start of the message.
    Dropped,
    /// A message not meant for the bot.
    NotAddressed,
    /// The plugin handled the message.
    Dispatched,
}

/// Drives a single plugin from an event feed.
pub struct EventDispatcher {
    name: String,
    plugin: BoxedPlugin,
    handler: BotHandler,
}

impl EventDispatcher {
    /// Creates a dispatcher for `plugin`, registered under `name`.
    pub fn new(name: impl Into<String>, plugin: BoxedPlugin, handler: BotHandler) -> Self {
        Self {
            name: name.into(),
            plugin,
            handler,
        }
    }

    /// Name of the plugin being driven.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The facade handed to the plugin.
    pub fn handler(&self) -> &BotHandler {
        &self.handler
    }

    /// Usage text of the plugin.
    pub fn usage(&self) -> &str {
        self.plugin.usage()
    }

    /// Runs the plugin's `initialize` hook and flushes whatever it stored.
    pub async fn initialize(&mut self) -> DispatchResult<()> {
        if let Err(e) = self.plugin.initialize(&mut self.handler).await {
            return Err(match into_fatal(e) {
                Ok(fatal) => DispatchError::Fatal(fatal),
                Err(e) => DispatchError::Initialize {
                    plugin: self.name.clone(),
                    message: e.to_string(),
                },
            });
        }
        self.ensure_no_violation()?;
        self.handler.flush_storage().await?;
        debug!(bot = %self.name, "Plugin initialized");
        Ok(())
    }

    /// Processes events until the feed closes, `shutdown` is cancelled or a
    /// fatal error occurs.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::Feed`] if the feed fails.
    /// - [`DispatchError::Fatal`] on rate-limit or capability violations.
    /// - [`DispatchError::State`] if storage cannot be flushed.
    pub async fn run<F>(&mut self, feed: &mut F, shutdown: &CancellationToken) -> DispatchResult<()>
    where
        F: EventFeed + ?Sized,
    {
        info!(bot = %self.name, "Listening for messages");

        loop {
            let next = tokio::select! {
                biased;
                () = shutdown.cancelled() => {
                    info!(bot = %self.name, "Shutdown requested, stopping");
                    return Ok(());
                }
                next = feed.next_event() => next,
            };

            match next.map_err(DispatchError::Feed)? {
                Some(event) => {
                    self.process_event(event).await?;
                }
                None => {
                    info!(bot = %self.name, "Event feed closed");
                    return Ok(());
                }
            }
        }
    }

    /// Runs one event through filtering, dispatch and storage flush.
    pub async fn process_event(&mut self, event: Event) -> DispatchResult<Outcome> {
        let (mut message, flags) = match event.kind {
            EventKind::Message { message, flags } => (message, flags),
            EventKind::Other { event_type } => {
                debug!(event_id = event.id, event_type = %event_type, "Ignoring event");
                return Ok(Outcome::Ignored);
            }
        };

        let is_mentioned = flags.is_mentioned();
        let is_private = message.is_private_from_other(self.handler.user_id());

        if is_mentioned {
            let query = extract_query_without_mention(&message.content, self.handler.full_name())
                .map(str::to_owned);
            match query {
                Some(query) => message.content = query,
                None => {
                    debug!(message_id = message.id, "Mention is not leading, dropping message");
                    return Ok(Outcome::Dropped);
                }
            }
        }

        let outcome = if is_private || is_mentioned {
            let span = debug_span!("handle_message", bot = %self.name, message_id = message.id);
            let result = self
                .plugin
                .handle_message(&message, &mut self.handler)
                .instrument(span)
                .await;

            if let Err(e) = result {
                match into_fatal(e) {
                    Ok(fatal) => return Err(DispatchError::Fatal(fatal)),
                    Err(e) => error!(
                        bot = %self.name,
                        message_id = message.id,
                        error = %e,
                        "Bot failed to handle message"
                    ),
                }
            }
            self.ensure_no_violation()?;
            Outcome::Dispatched
        } else {
            Outcome::NotAddressed
        };

        self.handler.flush_storage().await?;
        Ok(outcome)
    }

    /// Surfaces latched violations the plugin may have swallowed.
    fn ensure_no_violation(&self) -> DispatchResult<()> {
        if let Some(capability) = self.handler.capability_violation() {
            return Err(DispatchError::Fatal(HandlerError::Capability { capability }));
        }
        if self.handler.is_rate_limited() {
            return Err(DispatchError::Fatal(HandlerError::RateLimitExceeded));
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("name", &self.name)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

/// Separates errors that must stop the bot from ordinary plugin failures.
fn into_fatal(error: BoxError) -> Result<HandlerError, BoxError> {
    let error = match error.downcast::<HandlerError>() {
        Ok(e) if e.is_fatal() => return Ok(*e),
        Ok(e) => return Err(e as BoxError),
        Err(other) => other,
    };
    match error.downcast::<StateError>() {
        Ok(e) if matches!(*e, StateError::Sync(_)) => Ok(HandlerError::State(*e)),
        Ok(e) => Err(e as BoxError),
        Err(other) => Err(other),
    }
}
