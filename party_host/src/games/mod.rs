//! Bundled game types.

pub mod trivia;

use crate::plugin::PluginRegistry;

/// A registry with every bundled game type registered.
pub fn default_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(trivia::TriviaPlugin::new());
    registry
}
