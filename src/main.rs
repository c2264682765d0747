mod api;
mod blockchain;
mod config;
mod digest;
mod error;
mod transaction;
mod wallet;

use actix_web::{App, HttpServer, web};
use dotenvy::dotenv;
use log::info;

use api::AppState;
use config::Config;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let Config { host, port, mining } = Config::from_env();
    info!("CONFIG - {mining:?}");

    println!("⛓️ Starting PoW ledger API at http://{host}:{port}");

    // mines the genesis block
    let state = web::Data::new(AppState::new(mining));

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
