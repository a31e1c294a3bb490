use std::time::{Duration, Instant};

use actix::{
    fut, Actor, ActorContext, ActorFutureExt, Addr, AsyncContext, Handler, Running, StreamHandler,
};
use actix_web_actors::ws;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    exception::GameError,
    instance::{
        messages::{Connect, Disconnect, PlayerCommand},
        GameCommand, GameInstance,
    },
    protocol::{ClientMessage, ErrorCode, ServerMessage},
    registry::InstanceManager,
};

use super::SessionState;

type Ctx = ws::WebsocketContext<ClientSession>;

fn send_err(ctx: &mut Ctx, code: ErrorCode, message: &str) {
    if let Ok(text) = serde_json::to_string(&ServerMessage::Error {
        code,
        message: message.to_string(),
    }) {
        ctx.text(text);
    }
}

fn send_game_err(ctx: &mut Ctx, error: &GameError) {
    match serde_json::to_string(&ServerMessage::from(error)) {
        Ok(text) => ctx.text(text),
        Err(e) => warn!("Failed to serialize error for client: {}", e),
    }
}

/// One WebSocket connection.
///
/// Decodes client frames, forwards game commands to the instance the client
/// is seated in, and writes whatever the instance sends back to the socket.
pub struct ClientSession {
    client_id: Uuid,
    game_id: Option<Uuid>,
    instance: Option<Addr<GameInstance>>,
    state: SessionState,
    hb: Instant,
    instances: InstanceManager,
    heartbeat_interval: Duration,
    client_timeout: Duration,
}

impl ClientSession {
    pub fn new(
        instances: InstanceManager,
        heartbeat_interval: Duration,
        client_timeout: Duration,
    ) -> Self {
        Self {
            client_id: Uuid::new_v4(),
            game_id: None,
            instance: None,
            state: SessionState::Idle,
            hb: Instant::now(),
            instances,
            heartbeat_interval,
            client_timeout,
        }
    }

    fn hb(&self, ctx: &mut Ctx) {
        ctx.run_interval(self.heartbeat_interval, |act, ctx| {
            if Instant::now().duration_since(act.hb) > act.client_timeout {
                info!(
                    "Websocket client {} heartbeat failed, disconnecting!",
                    act.client_id
                );
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn handle_create(&mut self, ctx: &mut Ctx, name: String) {
        if self.state != SessionState::Idle {
            send_game_err(ctx, &GameError::SessionExists(self.client_id));
            return;
        }
        let (game_id, addr) = self.instances.create(Some(self.client_id));
        info!("Client {} created game {}", self.client_id, game_id);
        self.connect(ctx, game_id, addr, name, None);
    }

    fn handle_join(
        &mut self,
        ctx: &mut Ctx,
        game_id: Uuid,
        name: String,
        rejoin_token: Option<Uuid>,
    ) {
        if self.state != SessionState::Idle {
            send_game_err(ctx, &GameError::SessionExists(self.client_id));
            return;
        }
        let Some(addr) = self.instances.get(&game_id) else {
            send_game_err(ctx, &GameError::GameNotFound(game_id));
            return;
        };
        self.connect(ctx, game_id, addr, name, rejoin_token);
    }

    /// Asks the instance for a seat, holding back other frames until it answers.
    fn connect(
        &mut self,
        ctx: &mut Ctx,
        game_id: Uuid,
        addr: Addr<GameInstance>,
        name: String,
        rejoin_token: Option<Uuid>,
    ) {
        self.state = SessionState::Joining;
        let client_id = self.client_id;
        let request = addr.send(Connect {
            client_id,
            name,
            rejoin_token,
            recipient: ctx.address().recipient(),
        });

        let joined = fut::wrap_future::<_, Self>(request).map(move |result, act, ctx| {
            match result.map_err(GameError::from).and_then(|r| r) {
                Ok(seat) => {
                    info!("Client {} seated in game {} as {}", client_id, game_id, seat);
                    act.client_id = seat;
                    act.game_id = Some(game_id);
                    act.instance = Some(addr);
                    act.state = SessionState::InGame;
                }
                Err(e) => {
                    warn!("Client {} could not join game {}: {}", client_id, game_id, e);
                    act.state = SessionState::Idle;
                    send_game_err(ctx, &e);
                }
            }
        });
        ctx.wait(joined);
    }

    fn forward(&mut self, ctx: &mut Ctx, command: GameCommand) {
        match (&self.instance, self.state) {
            (Some(instance), SessionState::InGame) => {
                debug!("Client {} sends {}", self.client_id, command.name());
                instance.do_send(PlayerCommand {
                    client_id: self.client_id,
                    command,
                });
            }
            _ => send_game_err(ctx, &GameError::NotConnected),
        }
    }

    fn handle_client_message(&mut self, ctx: &mut Ctx, msg: ClientMessage) {
        let command = match msg {
            ClientMessage::CreateGame { name } => return self.handle_create(ctx, name),
            ClientMessage::JoinGame {
                game_id,
                name,
                rejoin_token,
            } => return self.handle_join(ctx, game_id, name, rejoin_token),
            ClientMessage::StartGame => GameCommand::StartGame,
            ClientMessage::AttemptAction { action } => GameCommand::AttemptAction(action),
            ClientMessage::AttemptBlock { card } => GameCommand::AttemptBlock(card),
            ClientMessage::Challenge => GameCommand::Challenge,
            ClientMessage::ResolveDeath { card } => GameCommand::ResolveDeath(card),
            ClientMessage::CommitTurn => GameCommand::CommitTurn,
            ClientMessage::EndTurn => GameCommand::EndTurn,
        };
        self.forward(ctx, command);
    }
}

impl Actor for ClientSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!("ClientSession {} started.", self.client_id);
        self.hb(ctx);
    }

    fn stopping(&mut self, _ctx: &mut Self::Context) -> Running {
        if self.state == SessionState::Disconnecting {
            return Running::Stop;
        }
        self.state = SessionState::Disconnecting;

        match (&self.instance, self.game_id) {
            (Some(instance), Some(game_id)) => {
                info!(
                    "Client {} disconnected from game {}.",
                    self.client_id, game_id
                );
                instance.do_send(Disconnect {
                    client_id: self.client_id,
                });
            }
            _ => info!("Client {} disconnected before joining.", self.client_id),
        }
        Running::Stop
    }
}

impl Handler<ServerMessage> for ClientSession {
    type Result = ();

    fn handle(&mut self, msg: ServerMessage, ctx: &mut Self::Context) {
        match serde_json::to_string(&msg) {
            Ok(text) => ctx.text(text),
            Err(e) => warn!("Failed to serialize ServerMessage for client: {}", e),
        }
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ClientSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => {
                self.hb = Instant::now();
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {
                self.hb = Instant::now();
            }
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(msg) => self.handle_client_message(ctx, msg),
                Err(e) => {
                    warn!("Failed to parse client message: {}", e);
                    send_err(ctx, ErrorCode::InvalidMessageFormat, "Invalid message format");
                }
            },
            Ok(ws::Message::Binary(_)) => {
                send_err(ctx, ErrorCode::InvalidMessageFormat, "Binary frames are not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            _ => ctx.stop(),
        }
    }
}
