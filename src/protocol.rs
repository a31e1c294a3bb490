use actix::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    game::{card::Card, Action},
    instance::snapshot::ClientStateBroadcast,
};

// --- Client to Server Messages ---

/// A frame sent by a client: `{"type": "...", "payload": {...}}`.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a new game with the sender as its owner.
    CreateGame { name: String },

    /// Takes a seat in an existing game, or retakes the seat `rejoin_token`
    /// was issued for.
    #[serde(rename_all = "camelCase")]
    JoinGame {
        game_id: Uuid,
        name: String,
        #[serde(default)]
        rejoin_token: Option<Uuid>,
    },

    StartGame,

    AttemptAction { action: Action },

    /// The blocking player is always the sender.
    AttemptBlock { card: Card },

    /// The challenger is always the sender.
    Challenge,

    ResolveDeath { card: usize },

    CommitTurn,

    EndTurn,
}

// --- Server to Client Messages ---

#[derive(Serialize, Deserialize, Message, Clone, Debug)]
#[rtype(result = "()")]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// The sender now holds a seat in `game_id` under `client_id`.
    /// `rejoin_token` is sent to this client only.
    #[serde(rename_all = "camelCase")]
    Joined {
        game_id: Uuid,
        client_id: Uuid,
        owner_id: Option<Uuid>,
        rejoin_token: Uuid,
    },

    /// The recipient's masked view of the game.
    State(Box<ClientStateBroadcast>),

    Error { code: ErrorCode, message: String },
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    IllegalTransition,
    InvalidReference,
    InsufficientResources,
    CapacityExceeded,
    UnknownAction,
    SessionError,
    InvalidMessageFormat,
    InternalError,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct CreateGameResponse {
    pub id: Uuid,
}
