use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// The five character cards. Three copies of each make up the deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Card {
    Duke,
    Assassin,
    Ambassador,
    Captain,
    Contessa,
}

/// A card held by a player. Once dead it stays in the hand face up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardState {
    pub card: Card,
    pub alive: bool,
}

impl CardState {
    pub fn new(card: Card) -> Self {
        Self { card, alive: true }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Income,
    ForeignAid,
    Tax,
    Assassinate,
    Revolt,
    Exchange,
    Steal,
}

/// Actions every player may take without claiming a card.
pub const DEFAULT_GRANTS: [ActionType; 3] =
    [ActionType::Income, ActionType::ForeignAid, ActionType::Revolt];

pub const STARTING_DECK: [Card; 15] = [
    Card::Duke,
    Card::Assassin,
    Card::Ambassador,
    Card::Captain,
    Card::Contessa,
    Card::Duke,
    Card::Assassin,
    Card::Ambassador,
    Card::Captain,
    Card::Contessa,
    Card::Duke,
    Card::Assassin,
    Card::Ambassador,
    Card::Captain,
    Card::Contessa,
];

impl Card {
    /// The action this card lets its holder perform, if any.
    pub fn grants(self) -> Option<ActionType> {
        match self {
            Card::Duke => Some(ActionType::Tax),
            Card::Assassin => Some(ActionType::Assassinate),
            Card::Ambassador => Some(ActionType::Exchange),
            Card::Captain => Some(ActionType::Steal),
            Card::Contessa => None,
        }
    }

    pub fn blocks(self, action: ActionType) -> bool {
        action.blocked_by().contains(&self)
    }
}

impl ActionType {
    pub fn cost(self) -> Option<i32> {
        match self {
            ActionType::Assassinate => Some(3),
            ActionType::Revolt => Some(7),
            _ => None,
        }
    }

    /// Cards able to block this action. Empty means unblockable.
    pub fn blocked_by(self) -> &'static [Card] {
        match self {
            ActionType::ForeignAid => &[Card::Duke],
            ActionType::Assassinate => &[Card::Contessa],
            ActionType::Steal => &[Card::Captain, Card::Ambassador],
            _ => &[],
        }
    }

    pub fn is_blockable(self) -> bool {
        !self.blocked_by().is_empty()
    }

    /// The card that must be held to perform this action honestly.
    pub fn required_card(self) -> Option<Card> {
        match self {
            ActionType::Tax => Some(Card::Duke),
            ActionType::Assassinate => Some(Card::Assassin),
            ActionType::Exchange => Some(Card::Ambassador),
            ActionType::Steal => Some(Card::Captain),
            ActionType::Income | ActionType::ForeignAid | ActionType::Revolt => None,
        }
    }

    pub fn requires_target(self) -> bool {
        matches!(
            self,
            ActionType::Assassinate | ActionType::Revolt | ActionType::Steal
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::Income => "income",
            ActionType::ForeignAid => "foreign_aid",
            ActionType::Tax => "tax",
            ActionType::Assassinate => "assassinate",
            ActionType::Revolt => "revolt",
            ActionType::Exchange => "exchange",
            ActionType::Steal => "steal",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn shuffled_deck<R: Rng + ?Sized>(rng: &mut R) -> Vec<Card> {
    let mut deck = STARTING_DECK.to_vec();
    deck.shuffle(rng);
    deck
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_card_grant_requires_that_card() {
        for card in STARTING_DECK {
            if let Some(action) = card.grants() {
                assert_eq!(action.required_card(), Some(card));
            }
        }
    }

    #[test]
    fn default_grants_need_no_card() {
        for action in DEFAULT_GRANTS {
            assert_eq!(action.required_card(), None);
        }
    }

    #[test]
    fn blocking_table() {
        assert!(Card::Duke.blocks(ActionType::ForeignAid));
        assert!(Card::Contessa.blocks(ActionType::Assassinate));
        assert!(Card::Captain.blocks(ActionType::Steal));
        assert!(Card::Ambassador.blocks(ActionType::Steal));

        assert!(!Card::Duke.blocks(ActionType::Steal));
        assert!(!Card::Contessa.blocks(ActionType::Tax));
        assert!(!ActionType::Income.is_blockable());
        assert!(!ActionType::Revolt.is_blockable());
        assert!(!ActionType::Tax.is_blockable());
    }

    #[test]
    fn action_costs() {
        assert_eq!(ActionType::Assassinate.cost(), Some(3));
        assert_eq!(ActionType::Revolt.cost(), Some(7));
        assert_eq!(ActionType::Steal.cost(), None);
        assert_eq!(ActionType::Income.cost(), None);
    }

    #[test]
    fn shuffle_keeps_every_card() {
        let mut rng = rand::thread_rng();
        let deck = shuffled_deck(&mut rng);
        assert_eq!(deck.len(), 15);
        for card in [
            Card::Duke,
            Card::Assassin,
            Card::Ambassador,
            Card::Captain,
            Card::Contessa,
        ] {
            assert_eq!(deck.iter().filter(|c| **c == card).count(), 3);
        }
    }

    #[test]
    fn wire_names() {
        assert_eq!(
            serde_json::to_string(&ActionType::ForeignAid).unwrap(),
            "\"foreign_aid\""
        );
        assert_eq!(serde_json::to_string(&Card::Duke).unwrap(), "\"duke\"");
    }
}
