use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::info;
use quittance_server::config::AppConfig;
use quittance_server::{db, services, AppState};
use std::io;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    config.ensure_directories().map_err(io::Error::other)?;

    let db = db::open(&config.db_path).map_err(io::Error::other)?;
    db::seed(&db, config.landlord.as_ref()).map_err(io::Error::other)?;
    if config.landlord.is_none() {
        info!("LANDLORD_NAME is not set; receipts need an owner row to be generated");
    }

    let state = AppState::new(db, &config.receipts_dir, &config.uploads_dir);
    let url = format!("http://{}:{}", config.host, config.port);
    info!("Server running at {}", url);

    HttpServer::new(move || {
        App::new()
            .app_data(services::json_config())
            .app_data(web::Data::new(state.clone()))
            .service(services::templates::configure_routes())
            .service(services::receipts::configure_routes())
    })
        .bind((config.host.as_str(), config.port))?
        .run()
        .await
}
