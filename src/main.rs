use rill::config::Config;
use rill::server;
use rill::store::Store;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::error;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Arc::new(Config::from_args(&args));

    // The keyspace is owned here and shared by reference with every
    // connection task; there is no process-wide singleton.
    let store = Arc::new(RwLock::new(Store::new()));

    if let Err(e) = server::run(store, config.clone()).await {
        error!("failed to bind to {}:{}: {e}", config.bind, config.port);
        std::process::exit(1);
    }
}
