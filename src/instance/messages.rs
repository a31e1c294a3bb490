use actix::{Message, MessageResponse, Recipient};
use serde::Serialize;
use uuid::Uuid;

use crate::{exception::GameError, protocol::ServerMessage};

use super::{GameCommand, GameStatus};

/// Seats a client in the game and starts delivering state to `recipient`.
///
/// With a `rejoin_token` the client takes back the seat the token was issued
/// for and `client_id` is ignored. Answers with the seated player id.
#[derive(Message)]
#[rtype(result = "Result<Uuid, GameError>")]
pub struct Connect {
    pub client_id: Uuid,
    pub name: String,
    pub rejoin_token: Option<Uuid>,
    pub recipient: Recipient<ServerMessage>,
}

/// The client's connection is gone. Nothing is sent to it after this.
#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub client_id: Uuid,
}

/// Fire-and-forget: the outcome reaches the client as a broadcast or an error.
#[derive(Message)]
#[rtype(result = "()")]
pub struct PlayerCommand {
    pub client_id: Uuid,
    pub command: GameCommand,
}

/// Recomputes and pushes every client's snapshot.
#[derive(Message)]
#[rtype(result = "()")]
pub struct BroadcastState;

#[derive(Message)]
#[rtype(result = "InstanceInfo")]
pub struct GetInstanceInfo;

/// Lobby listing data. Reveals no cards.
#[derive(Debug, Clone, PartialEq, Serialize, MessageResponse)]
#[serde(rename_all = "camelCase")]
pub struct InstanceInfo {
    pub game_id: Uuid,
    pub owner_id: Option<Uuid>,
    pub status: GameStatus,
    pub players: usize,
    pub connected: usize,
}
