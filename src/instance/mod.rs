//! A running game: one [`Game`] plus the clients connected to it.
//!
//! `GameInstance` is an actix actor. Its mailbox is the only path by which the
//! game is mutated, so commands from different connections are applied one at a
//! time in arrival order, and every broadcast sees a state no other command is
//! halfway through changing.

use std::collections::HashMap;

use actix::{Actor, ActorContext, Context, Recipient};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    exception::GameError,
    game::{card::Card, Action, Block, Challenge, Game, TurnState},
    protocol::ServerMessage,
    registry::InstanceManager,
};

pub mod handlers;
pub mod messages;
pub mod snapshot;

use snapshot::ClientStateBroadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    Lobby,
    InProgress,
    Complete,
}

/// A player command, with the acting client already attached by the session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameCommand {
    StartGame,
    AttemptAction(Action),
    AttemptBlock(Card),
    Challenge,
    ResolveDeath(usize),
    CommitTurn,
    EndTurn,
}

impl GameCommand {
    pub fn name(&self) -> &'static str {
        match self {
            GameCommand::StartGame => "start_game",
            GameCommand::AttemptAction(_) => "attempt_action",
            GameCommand::AttemptBlock(_) => "attempt_block",
            GameCommand::Challenge => "challenge",
            GameCommand::ResolveDeath(_) => "resolve_death",
            GameCommand::CommitTurn => "commit_turn",
            GameCommand::EndTurn => "end_turn",
        }
    }
}

pub struct GameInstance {
    game_id: Uuid,
    owner_id: Option<Uuid>,
    status: GameStatus,
    game: Game,
    clients: HashMap<Uuid, Recipient<ServerMessage>>,
    // rejoin token -> player id
    rejoin_tokens: HashMap<Uuid, Uuid>,
    registry: Option<InstanceManager>,
}

impl GameInstance {
    pub fn new(game_id: Uuid, owner_id: Option<Uuid>, game: Game) -> Self {
        Self {
            game_id,
            owner_id,
            status: GameStatus::Lobby,
            game,
            clients: HashMap::new(),
            rejoin_tokens: HashMap::new(),
            registry: None,
        }
    }

    /// Lets the instance drop itself from `registry` once it is abandoned.
    pub fn with_registry(mut self, registry: InstanceManager) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Seats a new client, or re-attaches the player holding `rejoin_token`.
    ///
    /// Returns the player id the connection now speaks for. Player ids are
    /// public, so only the token handed out privately in `Joined` reclaims a seat.
    fn connect(
        &mut self,
        client_id: Uuid,
        name: String,
        rejoin_token: Option<Uuid>,
        recipient: Recipient<ServerMessage>,
    ) -> Result<Uuid, GameError> {
        let (client_id, token) = match rejoin_token {
            Some(token) => {
                let seat = *self
                    .rejoin_tokens
                    .get(&token)
                    .ok_or(GameError::InvalidRejoinToken)?;
                if self.clients.contains_key(&seat) {
                    return Err(GameError::SessionExists(seat));
                }
                info!(
                    "GAME INSTANCE [{}]: player {} reconnected",
                    self.game_id, seat
                );
                (seat, token)
            }
            None => {
                if self.clients.contains_key(&client_id) {
                    return Err(GameError::SessionExists(client_id));
                }
                if self.status != GameStatus::Lobby {
                    return Err(GameError::InvalidStatus {
                        operation: "join_game",
                        status: self.status,
                    });
                }
                self.game.add_player(client_id, name)?;
                let token = Uuid::new_v4();
                self.rejoin_tokens.insert(token, client_id);
                info!(
                    "GAME INSTANCE [{}]: player {} joined ({} seated)",
                    self.game_id,
                    client_id,
                    self.game.player_count()
                );
                (client_id, token)
            }
        };

        if self.owner_id.is_none() {
            self.owner_id = Some(client_id);
        }
        recipient.do_send(ServerMessage::Joined {
            game_id: self.game_id,
            client_id,
            owner_id: self.owner_id,
            rejoin_token: token,
        });
        self.clients.insert(client_id, recipient);
        Ok(client_id)
    }

    /// Removes a client from the roster. Returns false if it was not connected.
    fn disconnect(&mut self, client_id: Uuid) -> bool {
        if self.clients.remove(&client_id).is_none() {
            return false;
        }

        if self.status == GameStatus::Lobby && self.game.remove_player(client_id).is_some() {
            self.rejoin_tokens.retain(|_, seat| *seat != client_id);
            info!(
                "GAME INSTANCE [{}]: player {} left the lobby",
                self.game_id, client_id
            );
            if self.owner_id == Some(client_id) {
                self.owner_id = self.game.order().first().copied();
            }
        } else {
            info!(
                "GAME INSTANCE [{}]: player {} disconnected, seat kept",
                self.game_id, client_id
            );
        }
        true
    }

    /// An instance nobody is connected to, and that nobody could usefully
    /// rejoin, can be dropped.
    fn is_abandoned(&self) -> bool {
        self.clients.is_empty() && self.status != GameStatus::InProgress
    }

    /// Checks that `client_id` is entitled to issue `command` right now.
    fn authorize(&self, client_id: Uuid, command: &GameCommand) -> Result<(), GameError> {
        if !self.clients.contains_key(&client_id) {
            return Err(GameError::NotConnected);
        }

        if let GameCommand::StartGame = command {
            if self.status != GameStatus::Lobby {
                return Err(GameError::InvalidStatus {
                    operation: command.name(),
                    status: self.status,
                });
            }
            if self.owner_id != Some(client_id) {
                return Err(GameError::NotOwner);
            }
            return Ok(());
        }

        if self.status != GameStatus::InProgress {
            return Err(GameError::InvalidStatus {
                operation: command.name(),
                status: self.status,
            });
        }

        let is_leader = self.game.leader_id() == Some(client_id);
        let in_play = self.game.player(&client_id).map_or(false, |p| p.is_alive());
        let allowed = match command {
            GameCommand::AttemptAction(_) => is_leader && in_play,
            GameCommand::CommitTurn | GameCommand::EndTurn => is_leader,
            GameCommand::AttemptBlock(_) => !is_leader && in_play,
            GameCommand::Challenge => {
                in_play
                    && match self.game.turn_state() {
                        TurnState::BlockPending => is_leader,
                        _ => !is_leader,
                    }
            }
            GameCommand::ResolveDeath(_) => self.game.next_death() == Some(client_id),
            GameCommand::StartGame => true,
        };

        if allowed {
            Ok(())
        } else {
            Err(GameError::NotYourTurn(client_id))
        }
    }

    /// Runs one command against the game.
    pub fn apply(&mut self, client_id: Uuid, command: GameCommand) -> Result<(), GameError> {
        self.authorize(client_id, &command)?;

        match command {
            GameCommand::StartGame => {
                self.game.deal()?;
                self.status = GameStatus::InProgress;
                info!(
                    "GAME INSTANCE [{}]: game started with {} players",
                    self.game_id,
                    self.game.player_count()
                );
            }
            GameCommand::AttemptAction(action) => self.game.attempt_action(action)?,
            GameCommand::AttemptBlock(card) => self.game.attempt_block(Block {
                card,
                initiator: client_id,
            })?,
            GameCommand::Challenge => self.game.challenge(Challenge {
                initiator: client_id,
            })?,
            GameCommand::ResolveDeath(index) => self.game.resolve_death(index)?,
            GameCommand::CommitTurn => self.game.commit_turn()?,
            GameCommand::EndTurn => {
                self.game.end_turn()?;
                if self.game.turn_state() == TurnState::PlayerWon {
                    self.status = GameStatus::Complete;
                    info!(
                        "GAME INSTANCE [{}]: complete, winner {:?}",
                        self.game_id,
                        self.game.winner()
                    );
                }
            }
        }
        Ok(())
    }

    /// Pushes a masked snapshot to every connected client.
    fn broadcast_state(&self) {
        debug!(
            "GAME INSTANCE [{}]: broadcasting state to {} clients",
            self.game_id,
            self.clients.len()
        );
        for (client_id, recipient) in &self.clients {
            let view = ClientStateBroadcast::for_recipient(
                self.game_id,
                self.owner_id,
                self.status,
                &self.game,
                &self.clients,
                *client_id,
            );
            recipient.do_send(ServerMessage::State(Box::new(view)));
        }
    }

    fn send_error(&self, client_id: Uuid, error: &GameError) {
        match self.clients.get(&client_id) {
            Some(recipient) => recipient.do_send(ServerMessage::from(error)),
            None => warn!(
                "GAME INSTANCE [{}]: dropping error for disconnected client {}",
                self.game_id, client_id
            ),
        }
    }

    fn stop_if_abandoned(&self, ctx: &mut Context<Self>) {
        if self.is_abandoned() {
            info!(
                "GAME INSTANCE [{}]: no clients left ({:?}), stopping",
                self.game_id, self.status
            );
            ctx.stop();
        }
    }
}

impl Actor for GameInstance {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        info!("GAME INSTANCE [{}]: started", self.game_id);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(registry) = &self.registry {
            registry.remove(&self.game_id);
        }
        info!("GAME INSTANCE [{}]: stopped", self.game_id);
    }
}
