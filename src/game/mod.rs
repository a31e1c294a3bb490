//! Turn resolution state machine.
//!
//! A turn always starts in [`TurnState::Default`] with the leader proposing an
//! action. Other players may block it or challenge it, a block may in turn be
//! challenged, and a lost challenge or a successful assassination forces some
//! player to give up a card. Every transition is a method on [`Game`] that either
//! applies completely or returns an error without touching any state.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::exception::GameError;

pub mod card;
pub mod player;


use card::{ActionType, Card};
use player::Player;

pub const MAX_PLAYERS: usize = 6;
pub const CARDS_PER_PLAYER: usize = 2;

/// An action proposed by the leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    #[serde(default, rename = "target")]
    pub target_player: Option<Uuid>,
}

impl Action {
    pub fn new(action_type: ActionType, target_player: Option<Uuid>) -> Self {
        Self {
            action_type,
            target_player,
        }
    }
}

/// A claim to hold `card` in order to stop the pending action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub card: Card,
    pub initiator: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenge {
    pub initiator: Uuid,
}

/// Where the current turn stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Waiting for the leader to propose an action.
    Default,
    /// An action is on the table; it may be blocked, challenged or committed.
    ActionPending,
    /// A block is on the table; it may be challenged or accepted with a commit.
    BlockPending,
    /// Reserved for the exchange draw. Never entered: exchange resolves as a no-op.
    ExchangePending,
    /// Someone other than the leader lost a challenge and owes a card.
    PlayerLostChallenge,
    /// The leader lost a challenge and owes a card.
    LeaderLostChallenge,
    /// The action's target was assassinated or hit by a revolt and owes a card.
    PlayerKilled,
    /// Nothing left to resolve; the leader may end the turn.
    Finished,
    /// Only one player has living cards. Terminal.
    PlayerWon,
}

impl TurnState {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnState::Default => "default",
            TurnState::ActionPending => "action_pending",
            TurnState::BlockPending => "block_pending",
            TurnState::ExchangePending => "exchange_pending",
            TurnState::PlayerLostChallenge => "player_lost_challenge",
            TurnState::LeaderLostChallenge => "leader_lost_challenge",
            TurnState::PlayerKilled => "player_killed",
            TurnState::Finished => "finished",
            TurnState::PlayerWon => "player_won",
        }
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The aggregate root of a single game.
///
/// Players are kept in a map for lookup and in `order` for seating. `order` never
/// shrinks once cards are dealt, so `leader` (an index into it) stays meaningful
/// for the life of the game.
#[derive(Debug, Clone)]
pub struct Game {
    deck: Vec<Card>,
    players: HashMap<Uuid, Player>,
    order: Vec<Uuid>,
    leader: usize,
    turn_state: TurnState,
    next_death: Option<Uuid>,
    winner: Option<Uuid>,
    pending_action: Option<Action>,
    pending_block: Option<Block>,
    pending_challenge: Option<Challenge>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Creates a game in the default state with a freshly shuffled deck.
    pub fn new() -> Self {
        Self::with_deck(card::shuffled_deck(&mut rand::thread_rng()))
    }

    /// Creates a game drawing from `deck`. Cards are dealt from the end.
    pub fn with_deck(deck: Vec<Card>) -> Self {
        Self {
            deck,
            players: HashMap::new(),
            order: Vec::new(),
            leader: 0,
            turn_state: TurnState::Default,
            next_death: None,
            winner: None,
            pending_action: None,
            pending_block: None,
            pending_challenge: None,
        }
    }

    pub fn add_player(&mut self, id: Uuid, name: impl Into<String>) -> Result<(), GameError> {
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::GameFull { max: MAX_PLAYERS });
        }
        if self.players.contains_key(&id) {
            return Err(GameError::AlreadyInGame(id));
        }

        self.players.insert(id, Player::new(id, name));
        self.order.push(id);
        Ok(())
    }

    /// Removes a player who holds no cards. Only valid before the deal, while
    /// seating is still open.
    pub fn remove_player(&mut self, id: Uuid) -> Option<Player> {
        let player = self.players.get(&id)?;
        if !player.cards.is_empty() {
            return None;
        }
        self.order.retain(|p| *p != id);
        if self.leader >= self.order.len() {
            self.leader = 0;
        }
        self.players.remove(&id)
    }

    /// Deals two cards to every seated player, round robin in seating order.
    pub fn deal(&mut self) -> Result<(), GameError> {
        let needed = self.order.len() * CARDS_PER_PLAYER;
        if needed > self.deck.len() {
            return Err(GameError::DeckExhausted {
                needed,
                available: self.deck.len(),
            });
        }

        for i in 0..needed {
            let id = self.order[i % self.order.len()];
            if let (Some(card), Some(player)) = (self.deck.pop(), self.players.get_mut(&id)) {
                player.give_card(card);
            }
        }
        debug!("dealt {} cards, {} left in deck", needed, self.deck.len());
        Ok(())
    }

    // --- Queries -------------------------------------------------------

    pub fn turn_state(&self) -> TurnState {
        self.turn_state
    }

    pub fn player(&self, id: &Uuid) -> Option<&Player> {
        self.players.get(id)
    }

    pub fn player_mut(&mut self, id: &Uuid) -> Option<&mut Player> {
        self.players.get_mut(id)
    }

    pub fn contains_player(&self, id: &Uuid) -> bool {
        self.players.contains_key(id)
    }

    /// Players in seating order.
    pub fn players(&self) -> impl Iterator<Item = &Player> + '_ {
        self.order.iter().filter_map(|id| self.players.get(id))
    }

    pub fn order(&self) -> &[Uuid] {
        &self.order
    }

    pub fn player_count(&self) -> usize {
        self.order.len()
    }

    pub fn leader_index(&self) -> usize {
        self.leader
    }

    pub fn leader_id(&self) -> Option<Uuid> {
        self.order.get(self.leader).copied()
    }

    pub fn leader(&self) -> Option<&Player> {
        self.leader_id().and_then(|id| self.players.get(&id))
    }

    pub fn next_death(&self) -> Option<Uuid> {
        self.next_death
    }

    pub fn winner(&self) -> Option<Uuid> {
        self.winner
    }

    pub fn pending_action(&self) -> Option<&Action> {
        self.pending_action.as_ref()
    }

    pub fn pending_block(&self) -> Option<&Block> {
        self.pending_block.as_ref()
    }

    pub fn pending_challenge(&self) -> Option<&Challenge> {
        self.pending_challenge.as_ref()
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    /// Deck plus every hand, dead cards included.
    pub fn cards_in_play(&self) -> usize {
        self.deck.len() + self.players.values().map(|p| p.cards.len()).sum::<usize>()
    }

    // --- Transitions ---------------------------------------------------

    /// Proposes an action for the current leader.
    ///
    /// The cost is paid up front and is never refunded, even when the action is
    /// later blocked or lost on a challenge. Income cannot be blocked or
    /// challenged and is committed immediately.
    pub fn attempt_action(&mut self, action: Action) -> Result<(), GameError> {
        self.expect_state("attempt_action", &[TurnState::Default])?;

        match action.target_player {
            Some(target) => match self.players.get(&target) {
                None => return Err(GameError::PlayerNotFound(target)),
                Some(p) if !p.is_alive() => return Err(GameError::PlayerEliminated(target)),
                _ => {}
            },
            None if action.action_type.requires_target() => {
                return Err(GameError::MissingTarget(action.action_type));
            }
            _ => {}
        }

        let leader_id = self.leader_id().ok_or(GameError::NoPlayers)?;
        let leader = self
            .players
            .get_mut(&leader_id)
            .ok_or(GameError::PlayerNotFound(leader_id))?;
        leader.pay_for_action(action.action_type)?;

        info!(
            "player {} attempts {} (target: {:?})",
            leader_id, action.action_type, action.target_player
        );
        self.pending_action = Some(action);
        self.turn_state = TurnState::ActionPending;

        if action.action_type == ActionType::Income {
            self.commit_turn()?;
        }
        Ok(())
    }

    pub fn attempt_block(&mut self, block: Block) -> Result<(), GameError> {
        self.expect_state("attempt_block", &[TurnState::ActionPending])?;
        let action = self.require_pending_action()?;

        self.require_living(block.initiator)?;
        if !block.card.blocks(action.action_type) {
            return Err(GameError::CardCannotBlock {
                card: block.card,
                action: action.action_type,
            });
        }

        info!(
            "player {} blocks {} claiming {:?}",
            block.initiator, action.action_type, block.card
        );
        self.pending_block = Some(block);
        self.turn_state = TurnState::BlockPending;
        Ok(())
    }

    /// Calls a bluff on the pending action or block.
    ///
    /// The outcome is decided from the accused player's living cards and recorded
    /// in `next_death`, which is the only reliable answer to "who loses a card":
    /// the same two lost-challenge states are reused for action and block
    /// challenges with different players on the hook.
    pub fn challenge(&mut self, challenge: Challenge) -> Result<(), GameError> {
        self.expect_state(
            "challenge",
            &[TurnState::ActionPending, TurnState::BlockPending],
        )?;

        self.require_living(challenge.initiator)?;
        let action = self.require_pending_action()?;
        let leader = self.leader().ok_or(GameError::NoPlayers)?;
        let leader_id = leader.id;

        let (state, loser) = match self.turn_state {
            TurnState::ActionPending => {
                if leader.is_allowed_action(action.action_type) {
                    (TurnState::PlayerLostChallenge, challenge.initiator)
                } else {
                    (TurnState::LeaderLostChallenge, leader_id)
                }
            }
            _ => {
                let block = self
                    .pending_block
                    .ok_or(GameError::IllegalTransition {
                        operation: "challenge",
                        state: self.turn_state,
                    })?;
                let blocker = self
                    .players
                    .get(&block.initiator)
                    .ok_or(GameError::PlayerNotFound(block.initiator))?;
                if blocker.can_block(action.action_type) {
                    (TurnState::LeaderLostChallenge, leader_id)
                } else {
                    (TurnState::PlayerLostChallenge, block.initiator)
                }
            }
        };

        info!(
            "player {} challenged during {}: {} loses a card",
            challenge.initiator, self.turn_state, loser
        );
        self.pending_challenge = Some(challenge);
        self.turn_state = state;
        self.next_death = Some(loser);
        Ok(())
    }

    /// Kills the card at `card_index` in the hand of the player owing a card.
    ///
    /// A player with nothing left to lose owes nothing: the index is ignored and
    /// the turn moves on as if the card had been given up.
    pub fn resolve_death(&mut self, card_index: usize) -> Result<(), GameError> {
        self.expect_state(
            "resolve_death",
            &[
                TurnState::PlayerLostChallenge,
                TurnState::LeaderLostChallenge,
                TurnState::PlayerKilled,
            ],
        )?;

        let victim_id = self.next_death.ok_or(GameError::NoPendingDeath)?;
        let victim = self
            .players
            .get_mut(&victim_id)
            .ok_or(GameError::PlayerNotFound(victim_id))?;
        if victim.is_alive() {
            let card = victim.kill_card(card_index)?;
            info!("player {} lost {:?}", victim_id, card);
        } else {
            info!("player {} has no card left to lose", victim_id);
        }

        self.next_death = None;
        self.turn_state = match self.turn_state {
            // the action survived the challenge and is still on the table
            TurnState::PlayerLostChallenge => TurnState::ActionPending,
            _ => TurnState::Finished,
        };
        Ok(())
    }

    /// Applies the pending action, or accepts the pending block.
    pub fn commit_turn(&mut self) -> Result<(), GameError> {
        self.expect_state(
            "commit_turn",
            &[TurnState::ActionPending, TurnState::BlockPending],
        )?;

        if self.turn_state == TurnState::BlockPending {
            info!("block stood, action negated");
            self.turn_state = TurnState::Finished;
            return Ok(());
        }

        let action = self.require_pending_action()?;
        let leader_id = self.leader_id().ok_or(GameError::NoPlayers)?;

        match action.action_type {
            ActionType::Income => self.credit(leader_id, 1)?,
            ActionType::ForeignAid => self.credit(leader_id, 2)?,
            ActionType::Tax => self.credit(leader_id, 3)?,
            ActionType::Steal => {
                let target = action
                    .target_player
                    .ok_or(GameError::MissingTarget(action.action_type))?;
                self.credit(target, -2)?;
                self.credit(leader_id, 2)?;
            }
            ActionType::Assassinate | ActionType::Revolt => {
                let target = action
                    .target_player
                    .ok_or(GameError::MissingTarget(action.action_type))?;
                // the target may have lost its last card on a bluffed block
                if !self.players.get(&target).map_or(false, Player::is_alive) {
                    info!("player {} is already out, nothing to kill", target);
                    self.turn_state = TurnState::Finished;
                    return Ok(());
                }
                info!("player {} must give up a card", target);
                self.next_death = Some(target);
                self.turn_state = TurnState::PlayerKilled;
                return Ok(());
            }
            // TODO: draw two, keep two, return two once ExchangePending gets a resolution step
            ActionType::Exchange => {}
        }

        info!("committed {} for player {}", action.action_type, leader_id);
        self.turn_state = TurnState::Finished;
        Ok(())
    }

    /// Checks for a winner, otherwise passes the lead to the next living player.
    pub fn end_turn(&mut self) -> Result<(), GameError> {
        self.expect_state("end_turn", &[TurnState::Finished])?;

        let in_play: Vec<Uuid> = self.players().filter(|p| p.is_alive()).map(|p| p.id).collect();
        if let [last] = in_play[..] {
            info!("player {} won", last);
            self.winner = Some(last);
            self.turn_state = TurnState::PlayerWon;
            return Ok(());
        }

        let count = self.order.len();
        for _ in 0..count {
            self.leader = (self.leader + 1) % count;
            if self.leader().map_or(false, Player::is_alive) {
                break;
            }
        }

        self.turn_state = TurnState::Default;
        self.pending_action = None;
        self.pending_block = None;
        self.pending_challenge = None;
        debug!("turn passed to seat {}", self.leader);
        Ok(())
    }

    // --- Helpers -------------------------------------------------------

    fn expect_state(&self, operation: &'static str, states: &[TurnState]) -> Result<(), GameError> {
        if states.contains(&self.turn_state) {
            Ok(())
        } else {
            Err(GameError::IllegalTransition {
                operation,
                state: self.turn_state,
            })
        }
    }

    fn require_living(&self, id: Uuid) -> Result<(), GameError> {
        match self.players.get(&id) {
            None => Err(GameError::PlayerNotFound(id)),
            Some(p) if !p.is_alive() => Err(GameError::PlayerEliminated(id)),
            Some(_) => Ok(()),
        }
    }

    fn require_pending_action(&self) -> Result<Action, GameError> {
        self.pending_action.ok_or_else(|| {
            GameError::UnknownAction(format!("no action recorded in {}", self.turn_state))
        })
    }

    fn credit(&mut self, id: Uuid, amount: i32) -> Result<(), GameError> {
        self.players
            .get_mut(&id)
            .ok_or(GameError::PlayerNotFound(id))?
            .adjust_credits(amount);
        Ok(())
    }
}
