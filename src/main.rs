use std::io;

use actix::System;
use actix_web::{web, App, HttpServer};
use revolt_server::{env::Settings, server, AppState, LoggerManager};
use tracing::{error, info};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();

    let settings = Settings::new().map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;

    let _logger_manager = LoggerManager::setup(&settings);
    info!(
        "Logger initialized (RUN_MODE={})",
        std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into())
    );

    let app_state = AppState::new(settings.clone());

    let bind_address = format!("{}:{}", settings.server.bind_address, settings.server.port);
    info!("Starting HTTP server on {}", bind_address);

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(server::configure)
    })
    .bind(&bind_address)?
    .run();

    info!("Revolt server is running on {}", bind_address);

    tokio::select! {
        res = &mut server => {
            error!("Server exited unexpectedly");
            return res;
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C received. Initiating graceful shutdown...");
            System::current().stop();
        },
    }

    server.await?;
    info!("System has shut down gracefully");

    Ok(())
}
