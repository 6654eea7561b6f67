//! Bundled bots.

mod helloworld;
mod incrementor;

use parley::prelude::PluginDescriptor;

pub use helloworld::HELLOWORLD;
pub use incrementor::INCREMENTOR;

/// Every bot this binary can run.
pub static BOTS: &[&PluginDescriptor] = &[&HELLOWORLD, &INCREMENTOR];

/// Looks up a bot by name.
pub fn find(name: &str) -> Option<&'static PluginDescriptor> {
    BOTS.iter().copied().find(|bot| bot.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find() {
        assert_eq!(find("incrementor").map(|b| b.name), Some("incrementor"));
        assert!(find("giphy").is_none());
    }
}
