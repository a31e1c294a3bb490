use actix::MailboxError;
use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    game::{
        card::{ActionType, Card},
        TurnState,
    },
    instance::GameStatus,
    protocol::{ErrorCode, ServerMessage},
};

/// Every way a command can be rejected.
///
/// Rejections never leave a game half-updated and are reported only to the
/// client that sent the command.
#[derive(Error, Debug)]
pub enum GameError {
    // --- illegal transitions ---
    #[error("'{operation}' is not allowed in turn state '{state}'")]
    IllegalTransition {
        operation: &'static str,
        state: TurnState,
    },

    #[error("'{operation}' is not allowed while the game is {status:?}")]
    InvalidStatus {
        operation: &'static str,
        status: GameStatus,
    },

    #[error("player {0} may not do that right now")]
    NotYourTurn(Uuid),

    #[error("only the game owner may start the game")]
    NotOwner,

    // --- invalid references ---
    #[error("player {0} is not in this game")]
    PlayerNotFound(Uuid),

    #[error("player {0} has no living cards")]
    PlayerEliminated(Uuid),

    #[error("{0} needs a target player")]
    MissingTarget(ActionType),

    #[error("{card:?} cannot block {action}")]
    CardCannotBlock { card: Card, action: ActionType },

    #[error("no card at index {index}")]
    InvalidCardIndex { index: usize },

    #[error("card at index {index} is already dead")]
    CardAlreadyDead { index: usize },

    #[error("no player is waiting to lose a card")]
    NoPendingDeath,

    #[error("game has no players")]
    NoPlayers,

    #[error("game {0} not found")]
    GameNotFound(Uuid),

    // --- resources ---
    #[error("not enough credits: needed {needed}, available {available}")]
    InsufficientCredits { needed: i32, available: i32 },

    #[error("deck has {available} cards, {needed} needed to deal")]
    DeckExhausted { needed: usize, available: usize },

    // --- capacity ---
    #[error("game is full ({max} players)")]
    GameFull { max: usize },

    // --- internal invariant ---
    #[error("unknown action: {0}")]
    UnknownAction(String),

    // --- connection ---
    #[error("player {0} is already in this game")]
    AlreadyInGame(Uuid),

    #[error("client is not connected to a game")]
    NotConnected,

    #[error("an active session already exists for player {0}")]
    SessionExists(Uuid),

    #[error("rejoin token does not match any seat in this game")]
    InvalidRejoinToken,

    #[error("Actor mailbox error: {0}")]
    Mailbox(#[from] MailboxError),
}

impl GameError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GameError::IllegalTransition { .. }
            | GameError::InvalidStatus { .. }
            | GameError::NotYourTurn(_)
            | GameError::NotOwner => ErrorCode::IllegalTransition,
            GameError::PlayerNotFound(_)
            | GameError::PlayerEliminated(_)
            | GameError::MissingTarget(_)
            | GameError::CardCannotBlock { .. }
            | GameError::InvalidCardIndex { .. }
            | GameError::CardAlreadyDead { .. }
            | GameError::NoPendingDeath
            | GameError::NoPlayers
            | GameError::GameNotFound(_) => ErrorCode::InvalidReference,
            GameError::InsufficientCredits { .. } | GameError::DeckExhausted { .. } => {
                ErrorCode::InsufficientResources
            }
            GameError::GameFull { .. } => ErrorCode::CapacityExceeded,
            GameError::UnknownAction(_) => ErrorCode::UnknownAction,
            GameError::AlreadyInGame(_)
            | GameError::NotConnected
            | GameError::SessionExists(_)
            | GameError::InvalidRejoinToken => ErrorCode::SessionError,
            GameError::Mailbox(_) => ErrorCode::InternalError,
        }
    }
}

/// Convert GameError to the message sent back to the offending client.
impl From<&GameError> for ServerMessage {
    fn from(error: &GameError) -> Self {
        let code = error.code();
        let message = match code {
            ErrorCode::InternalError => "Internal server error".to_string(),
            _ => error.to_string(),
        };
        ServerMessage::Error { code, message }
    }
}

impl ResponseError for GameError {
    fn status_code(&self) -> StatusCode {
        match self.code() {
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InvalidReference => StatusCode::NOT_FOUND,
            _ => StatusCode::CONFLICT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        tracing::error!("Request failed: {}", self);
        HttpResponse::build(status).json(ServerMessage::from(self))
    }
}
