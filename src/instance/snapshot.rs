use std::collections::HashMap;

use actix::Recipient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    game::{
        card::{ActionType, CardState},
        player::Player,
        Action, Block, Challenge, Game, TurnState,
    },
    protocol::ServerMessage,
};

use super::GameStatus;

/// One player's view of the game.
///
/// Carries everything a client needs to play and nothing that would let it
/// cheat: opponents' living cards are never included.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ClientStateBroadcast {
    pub timestamp: DateTime<Utc>,

    pub game_id: Uuid,
    pub owner_id: Option<Uuid>,
    #[serde(rename = "self")]
    pub self_: Option<Peer>,
    pub peers: Vec<Peer>,
    pub status: GameStatus,

    pub turn_state: TurnState,
    pub leader: Option<Uuid>,
    pub next_death: Option<Uuid>,
    pub winner: Option<Uuid>,
    pub pending_action: Option<Action>,
    pub pending_block: Option<Block>,
    pub pending_challenge: Option<Challenge>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: Uuid,
    pub name: String,
    pub cards: Vec<CardState>,
    pub credits: i32,
    pub leading: bool,
    pub connected: bool,
    #[serde(default)]
    pub allowed_actions: Vec<ActionType>,
}

impl Peer {
    /// Public entry: dead cards only.
    fn public(player: &Player, leading: bool, connected: bool) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            cards: player.get_dead_cards(),
            credits: player.credits,
            leading,
            connected,
            allowed_actions: Vec::new(),
        }
    }

    /// The recipient's own entry: full hand and the actions it unlocks.
    fn own(player: &Player, leading: bool) -> Self {
        Self {
            cards: player.cards.clone(),
            allowed_actions: player.get_allowed_actions(),
            ..Self::public(player, leading, true)
        }
    }
}

impl ClientStateBroadcast {
    pub fn for_recipient(
        game_id: Uuid,
        owner_id: Option<Uuid>,
        status: GameStatus,
        game: &Game,
        clients: &HashMap<Uuid, Recipient<ServerMessage>>,
        recipient: Uuid,
    ) -> Self {
        let leader = game.leader_id();
        let mut self_ = None;
        let mut peers = Vec::with_capacity(game.player_count().saturating_sub(1));

        for player in game.players() {
            let leading = leader == Some(player.id);
            if player.id == recipient {
                self_ = Some(Peer::own(player, leading));
            } else {
                peers.push(Peer::public(
                    player,
                    leading,
                    clients.contains_key(&player.id),
                ));
            }
        }

        Self {
            timestamp: Utc::now(),
            game_id,
            owner_id,
            self_,
            peers,
            status,
            turn_state: game.turn_state(),
            leader,
            next_death: game.next_death(),
            winner: game.winner(),
            pending_action: game.pending_action().copied(),
            pending_block: game.pending_block().copied(),
            pending_challenge: game.pending_challenge().copied(),
        }
    }
}
