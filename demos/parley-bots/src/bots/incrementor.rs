//! Keeps one message up to date instead of posting new ones.
//!
//! The first mention gets a reply containing `1`; every later mention edits
//! that same message to show the new count. Both the count and the id of the
//! message survive restarts through bot storage.

use parley::prelude::*;

const NUMBER_KEY: &str = "number";
const MESSAGE_ID_KEY: &str = "message_id";

/// Counts mentions in a single, edited message.
pub struct Incrementor;

pub static INCREMENTOR: PluginDescriptor = PluginDescriptor::new("incrementor", create)
    .description("Counts how often it was mentioned, editing one message in place.")
    .capabilities(&[Capability::Storage]);

fn create() -> BoxedPlugin {
    Box::new(Incrementor)
}

#[async_trait]
impl BotPlugin for Incrementor {
    fn usage(&self) -> &str {
        "This is a boilerplate bot that makes use of the update_message function. \
         For the first @-mention, it initially replies with one message containing \
         a `1`. Every time the bot is @-mentioned, this number will be incremented \
         in the same message."
    }

    async fn initialize(&mut self, handler: &mut BotHandler) -> Result<(), BoxError> {
        let storage = handler.storage_mut()?;
        if !storage.contains(NUMBER_KEY) || !storage.contains(MESSAGE_ID_KEY) {
            storage.put(NUMBER_KEY, &0u64)?;
            storage.put(MESSAGE_ID_KEY, &None::<u64>)?;
        }
        Ok(())
    }

    async fn handle_message(
        &mut self,
        message: &Message,
        handler: &mut BotHandler,
    ) -> Result<(), BoxError> {
        let storage = handler.storage_mut()?;
        let number = storage.get::<u64>(NUMBER_KEY)? + 1;
        storage.put(NUMBER_KEY, &number)?;
        let message_id = storage.get::<Option<u64>>(MESSAGE_ID_KEY)?;

        match message_id {
            Some(id) => {
                handler
                    .update_message(&MessageEdit::new(id, number.to_string()))
                    .await?;
            }
            None => {
                let receipt = handler.send_reply(message, &number.to_string()).await?;
                handler
                    .storage_mut()?
                    .put(MESSAGE_ID_KEY, &Some(receipt.id))?;
            }
        }
        Ok(())
    }
}
