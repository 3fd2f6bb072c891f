use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;

use listforge::auth::{PasswordHasher, TokenIssuer};
use listforge::config::Config;
use listforge::routes;
use listforge::state::AppState;
use listforge::store::PgStore;

fn cors(client_url: Option<&str>) -> Cors {
    let cors = match client_url {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .supports_credentials(),
        None => Cors::default().allow_any_origin(),
    };
    cors.allow_any_method().allow_any_header().max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .acquire_timeout(config.database_acquire_timeout)
        .connect(&config.database_url)
        .await
        .map_err(std::io::Error::other)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(std::io::Error::other)?;
    log::info!("database migrations applied");

    let hasher = PasswordHasher::new(config.bcrypt_cost).map_err(std::io::Error::other)?;
    let tokens = Arc::new(TokenIssuer::new(
        &config.jwt_secret,
        &config.jwt_refresh_secret,
    ));
    let state = web::Data::new(AppState::new(
        Arc::new(PgStore::new(pool)),
        tokens,
        hasher,
        config.secure_cookies,
    ));

    log::info!("starting ListForge server at {}", config.server_url());

    let client_url = config.client_url.clone();
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(cors(client_url.as_deref()))
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
