pub mod config;
pub mod db;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod service;
#[cfg(test)]
mod test_utils;

use std::io;
use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use log::info;
use sqlx::{postgres::Postgres, Pool};

use config::Config;
use db::{
    init_db_pool,
    invitations::PgNotifier,
    memory::{MemoryNotifier, MemoryStore},
    Stores,
};
use service::{
    auth::AuthMiddleware,
    log::{init_logger, LoggerMiddleware},
    notification::Notifier,
    AppState,
};

pub(crate) type PGPool = Pool<Postgres>;

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_logger();
    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    let (stores, notifier): (Stores, Arc<dyn Notifier>) = match &config.database_url {
        Some(url) => {
            let pool = init_db_pool(url, config.db_max_connections)
                .await
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
            (Stores::postgres(pool.clone()), Arc::new(PgNotifier::new(pool)))
        }
        None => (
            Stores::in_memory(Arc::new(MemoryStore::new())),
            Arc::new(MemoryNotifier::new()),
        ),
    };

    let bind_address = config.bind_address;
    let state = AppState {
        stores,
        notifier,
        config,
    };
    info!("listening on {}", bind_address);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(AuthMiddleware::new(&state.config.jwt_secret))
            .wrap(LoggerMiddleware)
            .configure(handlers::config)
    })
    .bind(bind_address)?
    .run()
    .await
}
