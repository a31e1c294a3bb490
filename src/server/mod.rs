use std::time::Duration;

use actix_web::{get, post, web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tracing::info;
use uuid::Uuid;

use crate::{
    exception::GameError, instance::messages::GetInstanceInfo, protocol::CreateGameResponse,
    session::ClientSession, AppState,
};

#[get("/ws/")]
async fn game_ws_route(
    req: HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = ClientSession::new(
        state.instances.clone(),
        Duration::from_secs(state.settings.session.heartbeat_interval_seconds),
        Duration::from_secs(state.settings.session.client_timeout_seconds),
    );
    ws::start(session, &req, stream)
}

/// Opens an ownerless lobby. The first client to join it becomes the owner.
#[post("/create")]
async fn create_game(state: web::Data<AppState>) -> HttpResponse {
    let (id, _) = state.instances.create(None);
    info!("Created game {} over HTTP", id);
    HttpResponse::Ok().json(CreateGameResponse { id })
}

#[get("/games/{game_id}")]
async fn game_info(
    path: web::Path<Uuid>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, GameError> {
    let game_id = path.into_inner();
    let addr = state
        .instances
        .get(&game_id)
        .ok_or(GameError::GameNotFound(game_id))?;
    let info = addr.send(GetInstanceInfo).await?;
    Ok(HttpResponse::Ok().json(info))
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}

/// Registers every route. `AppState` must be supplied as app data.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(game_ws_route)
        .service(create_game)
        .service(game_info)
        .service(health);
}
