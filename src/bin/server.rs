//! Binary entrypoint for the HTTP surface, gated behind the `server`
//! feature (`required-features = ["server"]` in Cargo.toml).

use log::{info, warn};
use std::sync::Arc;
use threat_signal_coordinator::analysts::{
    ConfigAnalyst, ContextAnalyst, DevopsAnalyst, HistoricalAnalyst, PriorityAnalyst, ReasoningMode,
};
use threat_signal_coordinator::config::{CoordinatorSettings, ReasoningMode as ConfigReasoningMode, StoreBacking};
use threat_signal_coordinator::reasoning::ReasoningProvider;
use threat_signal_coordinator::store::SharedStore;
use threat_signal_coordinator::web::start_server;
use threat_signal_coordinator::{Coordinator, InMemoryKnowledgeStore, InProcessStore};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();

    let settings = match std::env::var("COORDINATOR_MODE").as_deref() {
        Ok("live") => CoordinatorSettings::live_defaults(),
        _ => CoordinatorSettings::mock_defaults(),
    };

    let provider: Option<Arc<dyn ReasoningProvider>> = match settings.reasoning.mode {
        ConfigReasoningMode::Mock => None,
        ConfigReasoningMode::Live => live_provider(&settings),
    };

    let store: Arc<dyn SharedStore> = match settings.store.backing {
        StoreBacking::InProcess => Arc::new(InProcessStore::new(settings.store.subscriber_buffer)),
        StoreBacking::Redis => redis_store(&settings).await,
    };

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(InMemoryKnowledgeStore::new()),
        Arc::new(HistoricalAnalyst::new(mode_for(&provider))),
        Arc::new(ConfigAnalyst::new(mode_for(&provider))),
        Arc::new(DevopsAnalyst::new(mode_for(&provider))),
        Arc::new(ContextAnalyst::new(mode_for(&provider))),
        Arc::new(PriorityAnalyst::new(mode_for(&provider))),
        store.clone(),
        settings.coordinator,
    ));

    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    info!("starting threat-coordinator-server on {bind_address}");
    start_server(coordinator, store, &bind_address).await
}

fn mode_for(provider: &Option<Arc<dyn ReasoningProvider>>) -> ReasoningMode {
    match provider {
        Some(p) => ReasoningMode::Live(p.clone()),
        None => ReasoningMode::Mock,
    }
}

#[cfg(feature = "live-reasoning")]
fn live_provider(settings: &CoordinatorSettings) -> Option<Arc<dyn ReasoningProvider>> {
    use threat_signal_coordinator::reasoning::LiveReasoningProvider;
    let endpoint = std::env::var("REASONING_ENDPOINT").unwrap_or_else(|_| "http://127.0.0.1:9000/generate".to_string());
    Some(Arc::new(LiveReasoningProvider::new(endpoint, settings.reasoning.clone())))
}

#[cfg(not(feature = "live-reasoning"))]
fn live_provider(_settings: &CoordinatorSettings) -> Option<Arc<dyn ReasoningProvider>> {
    warn!("COORDINATOR_MODE=live requested but the live-reasoning feature is not compiled in; falling back to mock");
    None
}

#[cfg(feature = "redis-store")]
async fn redis_store(settings: &CoordinatorSettings) -> Arc<dyn SharedStore> {
    use threat_signal_coordinator::store::RedisStore;
    let broker_url = settings.store.broker_url.clone().expect("store.broker_url is required for the redis backing");
    Arc::new(
        RedisStore::connect(&broker_url, settings.store.subscriber_buffer)
            .await
            .expect("failed to connect to the redis broker"),
    )
}

#[cfg(not(feature = "redis-store"))]
async fn redis_store(_settings: &CoordinatorSettings) -> Arc<dyn SharedStore> {
    panic!("store.backing = Redis requires the redis-store feature");
}
