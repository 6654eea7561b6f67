//! Plugin descriptor: the static, `Copy` handle to a plugin.

use super::BoxedPlugin;

// ─── Capability ───────────────────────────────────────────────────────────────

/// Optional facade features a plugin must declare up front.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// Persistent key-value storage synchronized with the server.
    Storage,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage => write!(f, "storage"),
        }
    }
}

// ─── PluginDescriptor ─────────────────────────────────────────────────────────

/// A static, `Copy` descriptor that identifies and instantiates a plugin.
///
/// The descriptor is the plugin's registration: besides the factory it
/// carries the name used for config lookup and the set of declared
/// [`Capability`]s. The facade decides once, at construction, which optional
/// features exist for the plugin.
///
/// ```rust,ignore
/// pub static INCREMENTOR: PluginDescriptor =
///     PluginDescriptor::new("incrementor", || Box::new(Incrementor::default()))
///         .description("Counts how often it was mentioned.")
///         .capabilities(&[Capability::Storage]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PluginDescriptor {
    /// Machine name (used in logs, config lookup and the client name).
    pub name: &'static str,

    /// Name shown in the startup banner; derived from `name` when `None`.
    pub display_name: Option<&'static str>,

    /// One-line description shown at startup.
    pub description: &'static str,

    /// Capabilities the plugin declares.
    pub capabilities: &'static [Capability],

    /// Factory function that creates the live plugin instance.
    pub create: fn() -> BoxedPlugin,
}

impl PluginDescriptor {
    /// Creates a descriptor with no description and no capabilities.
    pub const fn new(name: &'static str, create: fn() -> BoxedPlugin) -> Self {
        Self {
            name,
            display_name: None,
            description: "",
            capabilities: &[],
            create,
        }
    }

    /// Sets the description.
    pub const fn description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Overrides the display name.
    pub const fn display_name(mut self, display_name: &'static str) -> Self {
        self.display_name = Some(display_name);
        self
    }

    /// Declares capabilities.
    pub const fn capabilities(mut self, capabilities: &'static [Capability]) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Returns `true` if `capability` was declared.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Returns the display name, capitalizing `name` when none was set.
    pub fn resolved_display_name(&self) -> String {
        if let Some(name) = self.display_name {
            return name.to_string();
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Client name reported to the server: `Parley<DisplayName>Bot`.
    pub fn client_name(&self) -> String {
        format!("Parley{}Bot", self.resolved_display_name().replace(' ', ""))
    }

    /// Creates the live plugin from the factory function.
    #[inline]
    pub fn instantiate(&self) -> BoxedPlugin {
        (self.create)()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parley_core::{BoxError, Message};

    use super::*;
    use crate::handler::BotHandler;
    use crate::plugin::BotPlugin;

    struct Nop;

    #[async_trait]
    impl BotPlugin for Nop {
        fn usage(&self) -> &str {
            "does nothing"
        }

        async fn handle_message(
            &mut self,
            _message: &Message,
            _handler: &mut BotHandler,
        ) -> Result<(), BoxError> {
            Ok(())
        }
    }

    static PLAIN: PluginDescriptor = PluginDescriptor::new("helloworld", || Box::new(Nop));

    static STORING: PluginDescriptor = PluginDescriptor::new("incrementor", || Box::new(Nop))
        .description("counts")
        .capabilities(&[Capability::Storage]);

    #[test]
    fn test_capabilities() {
        assert!(!PLAIN.has_capability(Capability::Storage));
        assert!(STORING.has_capability(Capability::Storage));
        assert_eq!(STORING.description, "counts");
    }

    #[test]
    fn test_display_and_client_names() {
        assert_eq!(PLAIN.resolved_display_name(), "Helloworld");
        assert_eq!(PLAIN.client_name(), "ParleyHelloworldBot");

        let named = PLAIN.display_name("Hello World");
        assert_eq!(named.resolved_display_name(), "Hello World");
        assert_eq!(named.client_name(), "ParleyHelloWorldBot");
    }

    #[test]
    fn test_instantiate() {
        let plugin = PLAIN.instantiate();
        assert_eq!(plugin.usage(), "does nothing");
    }
}
