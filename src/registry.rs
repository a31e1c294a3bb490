use std::{collections::HashMap, sync::Arc};

use actix::{Actor, Addr};
use parking_lot::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::{game::Game, instance::GameInstance};

/// Maps game ids to the actor that owns each game.
///
/// Shared by every connection handler; cloning shares the same map.
#[derive(Clone, Default)]
pub struct InstanceManager {
    instances: Arc<RwLock<HashMap<Uuid, Addr<GameInstance>>>>,
}

impl InstanceManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new instance in the lobby with a freshly shuffled game.
    pub fn create(&self, owner_id: Option<Uuid>) -> (Uuid, Addr<GameInstance>) {
        self.create_with_game(owner_id, Game::new())
    }

    pub fn create_with_game(&self, owner_id: Option<Uuid>, game: Game) -> (Uuid, Addr<GameInstance>) {
        let game_id = Uuid::new_v4();
        let addr = GameInstance::new(game_id, owner_id, game)
            .with_registry(self.clone())
            .start();
        self.instances.write().insert(game_id, addr.clone());
        info!("registered game instance {}", game_id);
        (game_id, addr)
    }

    pub fn get(&self, game_id: &Uuid) -> Option<Addr<GameInstance>> {
        self.instances.read().get(game_id).cloned()
    }

    pub fn remove(&self, game_id: &Uuid) -> Option<Addr<GameInstance>> {
        let removed = self.instances.write().remove(game_id);
        if removed.is_some() {
            info!("deregistered game instance {}", game_id);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.instances.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.read().is_empty()
    }
}
