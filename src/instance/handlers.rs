use actix::{Context, Handler};
use tracing::{info, warn};
use uuid::Uuid;

use crate::exception::GameError;

use super::{messages::*, GameInstance};

impl Handler<Connect> for GameInstance {
    type Result = Result<Uuid, GameError>;

    fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) -> Self::Result {
        info!(
            "GAME INSTANCE [{}]: handling Connect for client {}",
            self.game_id, msg.client_id
        );
        let seat = self
            .connect(msg.client_id, msg.name, msg.rejoin_token, msg.recipient)
            .map_err(|e| {
                warn!(
                    "GAME INSTANCE [{}]: rejected client {}: {}",
                    self.game_id, msg.client_id, e
                );
                e
            })?;
        self.broadcast_state();
        Ok(seat)
    }
}

impl Handler<Disconnect> for GameInstance {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, ctx: &mut Context<Self>) -> Self::Result {
        if !self.disconnect(msg.client_id) {
            return;
        }
        self.broadcast_state();
        self.stop_if_abandoned(ctx);
    }
}

impl Handler<PlayerCommand> for GameInstance {
    type Result = ();

    fn handle(&mut self, msg: PlayerCommand, _ctx: &mut Context<Self>) -> Self::Result {
        let PlayerCommand { client_id, command } = msg;
        match self.apply(client_id, command) {
            Ok(()) => self.broadcast_state(),
            Err(e) => {
                warn!(
                    "GAME INSTANCE [{}]: {} from {} rejected: {}",
                    self.game_id,
                    command.name(),
                    client_id,
                    e
                );
                self.send_error(client_id, &e);
            }
        }
    }
}

impl Handler<BroadcastState> for GameInstance {
    type Result = ();

    fn handle(&mut self, _msg: BroadcastState, _ctx: &mut Context<Self>) -> Self::Result {
        self.broadcast_state();
    }
}

impl Handler<GetInstanceInfo> for GameInstance {
    type Result = InstanceInfo;

    fn handle(&mut self, _msg: GetInstanceInfo, _ctx: &mut Context<Self>) -> Self::Result {
        InstanceInfo {
            game_id: self.game_id,
            owner_id: self.owner_id,
            status: self.status,
            players: self.game.player_count(),
            connected: self.clients.len(),
        }
    }
}
