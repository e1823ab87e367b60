use std::sync::Arc;

use hansom::config::Config;
use hansom::engine::Engine;
use hansom::notify::ChannelBus;
use hansom::payment::FlatRateSettlement;
use hansom::server;
use hansom::store::{DynStore, MemoryStore, PgStore};
use hansom::sweeper::Sweeper;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env().unwrap();

    let store: DynStore = match &config.database_url {
        Some(url) => Arc::new(PgStore::new(url, config.max_connections).await.unwrap()),
        None => {
            tracing::warn!("DATABASE_URL not set, falling back to the in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let (bus, events) = ChannelBus::bounded(1024);
    let notifier = Arc::new(bus);

    // placeholder transport: drain the bus so publishes never back up
    tokio::spawn(async move {
        while let Ok(envelope) = events.recv().await {
            tracing::debug!(topic = %envelope.topic, "event published");
        }
    });

    let sweeper = Sweeper::new(store.clone(), notifier.clone(), config.sweeper.clone());
    tokio::spawn(sweeper.run());

    let engine = Engine::new(
        store,
        notifier,
        Arc::new(FlatRateSettlement::default()),
        config.dispatch.clone(),
    );

    server::serve(engine, config.bind_addr).await;
}
