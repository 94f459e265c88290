use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http, middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use log::{error, info};

use projexia::app_state::AppState;
use projexia::config::{Config, Storage};
use projexia::routes;
use projexia::session::SessionAuth;
use projexia::store::{MemoryStore, MongoStore, Store};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let store: Arc<dyn Store> = match &config.storage {
        Storage::MongoDb { uri, database } => match MongoStore::connect(uri, database).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                error!("Could not connect to MongoDB: {}", e);
                std::process::exit(1);
            }
        },
        Storage::Memory => {
            info!("Using the in-memory store; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    if config.bypass_auth {
        info!("BYPASS_AUTH is on: Google sign-in logs everyone in as the test user");
    }

    let bind = (config.host.clone(), config.port);
    info!("Server running at http://{}:{}", bind.0, bind.1);
    info!("Allowed CORS origins: {}", config.cors_origins.join(", "));

    let state = web::Data::new(AppState::new(store, config));

    HttpServer::new(move || {
        let cors = state
            .config
            .cors_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::CONTENT_TYPE,
                http::header::ACCEPT,
                http::header::AUTHORIZATION,
            ])
            .supports_credentials()
            .max_age(3600);

        App::new()
            .app_data(state.clone())
            .wrap(SessionAuth::new(state.config.session_secret.clone()))
            .wrap(cors)
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
