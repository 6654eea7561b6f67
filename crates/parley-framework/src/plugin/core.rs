use async_trait::async_trait;
use parley_core::{BoxError, Message};

use crate::handler::BotHandler;

// ─── BotPlugin ────────────────────────────────────────────────────────────────

/// The capability interface every bot implements.
///
/// The dispatcher calls [`handle_message`](Self::handle_message) once per
/// message addressed to the bot, strictly one at a time. The handler is
/// passed by `&mut`, so the plugin has exclusive access to messaging and
/// storage for the duration of the call.
///
/// # Errors
///
/// Returning an error is logged and the loop moves on to the next event,
/// except for fatal facade errors (rate limit, undeclared capability, failed
/// state sync), which stop the bot.
#[async_trait]
pub trait BotPlugin: Send {
    /// Short help text printed at startup.
    fn usage(&self) -> &str;

    /// Called once after the facade is ready and before the first event.
    async fn initialize(&mut self, _handler: &mut BotHandler) -> Result<(), BoxError> {
        Ok(())
    }

    /// Handles one message addressed to the bot.
    ///
    /// For mentions, `message.content` has the leading mention already removed.
    async fn handle_message(
        &mut self,
        message: &Message,
        handler: &mut BotHandler,
    ) -> Result<(), BoxError>;
}

/// Owned, type-erased plugin.
pub type BoxedPlugin = Box<dyn BotPlugin>;
