pub mod ws_session;

pub use ws_session::ClientSession;

#[derive(Clone, Copy, Debug, PartialEq)]
enum SessionState {
    Idle,          // Connected, not seated in any game.
    Joining,       // Connect sent to an instance, waiting for its answer.
    InGame,        // Seated; commands are forwarded to the instance.
    Disconnecting, // Shutting down, instance already told.
}
