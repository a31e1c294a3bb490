use uuid::Uuid;

use crate::exception::GameError;

use super::card::{ActionType, Card, CardState, DEFAULT_GRANTS};

pub const STARTING_CREDITS: i32 = 2;

#[derive(Debug, Clone)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub cards: Vec<CardState>,
    /// Not clamped: a steal may push this below zero.
    pub credits: i32,
}

impl Player {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            cards: Vec::new(),
            credits: STARTING_CREDITS,
        }
    }

    pub fn living_cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.cards.iter().filter(|c| c.alive).map(|c| c.card)
    }

    pub fn get_living_cards(&self) -> Vec<Card> {
        self.living_cards().collect()
    }

    pub fn get_dead_cards(&self) -> Vec<CardState> {
        self.cards.iter().filter(|c| !c.alive).copied().collect()
    }

    pub fn is_alive(&self) -> bool {
        self.cards.iter().any(|c| c.alive)
    }

    pub fn give_card(&mut self, card: Card) {
        self.cards.push(CardState::new(card));
    }

    pub fn kill_card(&mut self, index: usize) -> Result<Card, GameError> {
        let state = self
            .cards
            .get_mut(index)
            .ok_or(GameError::InvalidCardIndex { index })?;
        if !state.alive {
            return Err(GameError::CardAlreadyDead { index });
        }
        state.alive = false;
        Ok(state.card)
    }

    pub fn adjust_credits(&mut self, amount: i32) {
        self.credits += amount;
    }

    /// Deducts the cost of `action`, leaving credits untouched on failure.
    pub fn pay_for_action(&mut self, action: ActionType) -> Result<(), GameError> {
        if let Some(cost) = action.cost() {
            if self.credits < cost {
                return Err(GameError::InsufficientCredits {
                    needed: cost,
                    available: self.credits,
                });
            }
            self.credits -= cost;
        }
        Ok(())
    }

    pub fn is_allowed_action(&self, action: ActionType) -> bool {
        DEFAULT_GRANTS.contains(&action) || self.living_cards().any(|c| c.grants() == Some(action))
    }

    pub fn get_allowed_actions(&self) -> Vec<ActionType> {
        let mut allowed = DEFAULT_GRANTS.to_vec();
        for action in self.living_cards().filter_map(Card::grants) {
            if !allowed.contains(&action) {
                allowed.push(action);
            }
        }
        allowed
    }

    pub fn can_block(&self, action: ActionType) -> bool {
        let blockers = action.blocked_by();
        self.living_cards().any(|c| blockers.contains(&c))
    }
}
