use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use splitledger::{
    auth::ApiToken,
    config::{Config, StoreBackend},
    routes,
    store::{LedgerStore, MemoryStore, MongoStore},
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "splitledger=debug,actix_web=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    let store: Arc<dyn LedgerStore> = match &config.store {
        StoreBackend::Mongo { uri, database } => {
            info!(database = %database, "connecting to MongoDB");
            Arc::new(MongoStore::connect(uri, database).await?)
        }
        StoreBackend::Memory => {
            info!("using the in-memory store, data will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };
    let store = web::Data::from(store);
    let api_token = web::Data::new(ApiToken(config.api_token.clone()));

    info!(host = %config.host, port = config.port, "listening");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(Cors::permissive())
            .app_data(store.clone())
            .app_data(api_token.clone())
            .configure(routes::configure)
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}
