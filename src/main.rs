use std::io;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use log::info;

use tasktrack::auth::{PasswordHasher, SessionMiddleware};
use tasktrack::config::{Config, StorageBackend};
use tasktrack::error::AppError;
use tasktrack::routes::{self, auth::CookiePolicy, health};
use tasktrack::store::{MemoryStore, PgStore, Store};

fn io_error(err: AppError) -> io::Error {
    io::Error::new(io::ErrorKind::Other, err.to_string())
}

async fn build_store(config: &Config) -> Result<Arc<dyn Store>, AppError> {
    match config.storage {
        StorageBackend::Postgres => {
            let url = config.database_url.as_deref().ok_or_else(|| {
                AppError::InternalServerError("DATABASE_URL must be set".into())
            })?;
            let store = PgStore::connect(url).await?;
            store.migrate().await?;
            info!("Connected to PostgreSQL, migrations applied");
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("Using the in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(io_error)?;
    let store: web::Data<dyn Store> = web::Data::from(build_store(&config).await.map_err(io_error)?);
    let matcher = web::Data::new(config.matcher);
    let hasher = web::Data::new(PasswordHasher::default());
    let cookies = web::Data::new(CookiePolicy {
        secure: config.cookie_secure,
    });

    info!(
        "Starting task tracker at {} (search: {:?})",
        config.server_url(),
        config.matcher
    );

    HttpServer::new(move || {
        App::new()
            .app_data(store.clone())
            .app_data(matcher.clone())
            .app_data(hasher.clone())
            .app_data(cookies.clone())
            .wrap(SessionMiddleware::new(store.clone()))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .wrap(Logger::default())
            .service(health::health)
            .service(web::scope("/api").configure(routes::config))
            .configure(routes::pages_config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
