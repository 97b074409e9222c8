use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use ac24dia_server::config::Settings;
use ac24dia_server::store::{demo, MemoryStore, PgStore, Store};
use ac24dia_server::{app, schema, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let settings = Settings::new()?;

    let store: Arc<dyn Store> = if settings.memory_store {
        log::info!("Using in-process memory store");
        Arc::new(MemoryStore::new())
    } else {
        let pg = PgPoolOptions::new()
            .max_connections(5)
            .connect(&settings.supabase_url)
            .await?;
        if settings.bootstrap_schema {
            schema::bootstrap(&pg).await?;
        }
        Arc::new(PgStore::new(pg))
    };

    if settings.seed_demo {
        demo::seed_if_empty(store.as_ref())
            .await
            .map_err(|err| anyhow::anyhow!("seeding demo data failed: {:?}", err))?;
    }

    let addr = settings.bind_address;
    let app = app(AppState::new(store, settings));

    log::info!("Starting AC24DIA HTTP Server on http://{}", addr);
    axum::Server::bind(&addr)
        .serve(app.into_make_service())
        .await?;
    Ok(())
}
