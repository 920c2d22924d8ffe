use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;
use std::io;
use std::sync::Arc;

mod backend;
mod config;
mod error;
mod game;
mod models;
mod routes;
mod state;
mod websocket;

use backend::HttpBackend;
use config::Config;
use state::AppState;

#[actix_web::main]
async fn main() -> io::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::parse();
    let backend = HttpBackend::new(&config.api_url, config.request_timeout()).map_err(io::Error::other)?;

    info!("Starting chess analysis server at http://{}", config.bind);
    info!("Using analysis backend at {}", backend.base_url());

    let app_state = web::Data::new(AppState::new(
        Arc::new(backend.clone()),
        backend.base_url(),
        &config.static_dir,
    ));

    let static_dir = config.static_dir.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(|cfg| routes::configure_routes(cfg, &static_dir))
    })
    .bind(&config.bind)?
    .run()
    .await
}
