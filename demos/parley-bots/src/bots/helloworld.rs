//! The smallest useful bot: answers everything with a greeting.

use parley::prelude::*;

/// Replies "beep boop" to every message addressed to it.
pub struct HelloWorld;

pub static HELLOWORLD: PluginDescriptor = PluginDescriptor::new("helloworld", create)
    .display_name("HelloWorld")
    .description("Responds to any query with a friendly greeting.");

fn create() -> BoxedPlugin {
    Box::new(HelloWorld)
}

#[async_trait]
impl BotPlugin for HelloWorld {
    fn usage(&self) -> &str {
        "This is a boilerplate bot that responds to a user query with \
         \"beep boop\", which is robot for \"Hello World\".\n\n\
         This bot can be used as a template for other, more sophisticated, bots."
    }

    async fn handle_message(
        &mut self,
        message: &Message,
        handler: &mut BotHandler,
    ) -> Result<(), BoxError> {
        handler.send_reply(message, "beep boop").await?;
        Ok(())
    }
}
