use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};

use study_survey_server::{
    app_state::AppState, config::Config, handlers, middleware::RequestIdMiddleware,
};

const JSON_LIMIT_BYTES: usize = 50 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env();
    if let Err(e) = config.validate_for_production() {
        log::warn!("{}; remote survey creation and extraction will fail", e);
    }

    let host = config.web_server_host.clone();
    let port = config.web_server_port;
    let max_upload_bytes = config.max_upload_bytes;
    let state = web::Data::new(Arc::new(AppState::new(config)));

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .app_data(web::PayloadConfig::new(max_upload_bytes))
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .wrap(RequestIdMiddleware)
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
