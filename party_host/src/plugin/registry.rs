//! Game-type registry.

use std::collections::HashMap;
use std::sync::Arc;

use super::{GamePlugin, PluginInfo};
use crate::game::{AnyGame, GameSession, SessionCore};

type SessionFactory = Box<dyn Fn(SessionCore) -> Box<dyn AnyGame> + Send + Sync>;

struct RegisteredPlugin {
    info: PluginInfo,
    factory: SessionFactory,
}

/// Maps a game-type id onto a factory for type-erased sessions.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, RegisteredPlugin>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a plugin under its own id.
    ///
    /// Capability flags are captured here; sessions consult the captured
    /// [`PluginInfo`] rather than asking the plugin again.
    pub fn register<P: GamePlugin>(&mut self, plugin: P) {
        let info = plugin.info();
        let plugin = Arc::new(plugin);

        let factory_info = info.clone();
        let factory: SessionFactory = Box::new(move |core| {
            Box::new(GameSession::new(
                core,
                Arc::clone(&plugin),
                factory_info.clone(),
            ))
        });

        log::info!("Registered game plugin: {} ({})", info.name, info.id);
        let id = info.id.clone();
        if self
            .plugins
            .insert(id.clone(), RegisteredPlugin { info, factory })
            .is_some()
        {
            log::warn!("Plugin '{id}' was already registered; replaced");
        }
    }

    pub fn info(&self, game_type: &str) -> Option<&PluginInfo> {
        self.plugins.get(game_type).map(|entry| &entry.info)
    }

    /// Build a session for `game_type` around `core`.
    pub fn instantiate(&self, game_type: &str, core: SessionCore) -> Option<Box<dyn AnyGame>> {
        self.plugins
            .get(game_type)
            .map(|entry| (entry.factory)(core))
    }

    /// Registered plugin descriptions, sorted by id.
    pub fn available(&self) -> Vec<PluginInfo> {
        let mut infos: Vec<PluginInfo> = self.plugins.values().map(|e| e.info.clone()).collect();
        infos.sort_by(|a, b| a.id.cmp(&b.id));
        infos
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}
