//! # dfs3-node
//!
//! Composition root for a dfs3 storage node: loads configuration, unseals
//! (or mints) the node's identity, opens local storage, wires every
//! component crate's concrete adapters together, and serves the HTTP API
//! alongside the bus-listener and heartbeat background tasks.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use dfs3_api::AppState;
use dfs3_auth::AuthService;
use dfs3_bus::{BusListener, MqttBusClient};
use dfs3_events::{EventDispatcher, EventIndex, EventListener, EventPublisher};
use dfs3_ledger::HttpLedgerClient;
use dfs3_registry::{NodeRegistry, UserRegistry};
use dfs3_store::{ClonePolicy, FileMetadataStore, HttpPeerFetcher};
use dfs3_types::{Alias, EventType, Hostname, NodeRegisteredPayload, Tag};

use dfs3_node::adapters::{HttpCloneCoordinator, PublisherReplicationAnnouncer, RegistryNodeLocator};
use dfs3_node::bootstrap::init_or_load_identity;
use dfs3_node::config::NodeConfig;
use dfs3_node::system;
use dfs3_node::{heartbeat, sync};

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    tracing::subscriber::set_global_default(subscriber).context("failed to install logging")?;

    info!("===========================================");
    info!("  dfs3 node starting");
    info!("===========================================");

    if let Err(e) = run().await {
        tracing::error!(error = %e, "fatal error during node startup");
        return Err(e);
    }
    Ok(())
}

async fn run() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/config.toml".to_string());
    let config = NodeConfig::load(Path::new(&config_path)).context("failed to load configuration")?;

    std::fs::create_dir_all(&config.storage.data_dir)?;
    let identity_path = Path::new(&config.storage.config_path);
    let identity = init_or_load_identity(identity_path).context("failed to bootstrap node identity")?;
    let node_id = dfs3_types::NodeId::try_from(identity.sealed.node_id.clone())
        .map_err(|e| anyhow::anyhow!("invalid node_id derived at bootstrap: {e}"))?;

    info!(node_id = %node_id, alias = %identity.alias, "node identity ready");

    let key_pair = Arc::new(identity.key_pair);

    let node_registry = Arc::new(NodeRegistry::open(Connection::open(&config.storage.db_file)?)?);
    let user_registry = Arc::new(UserRegistry::open(Connection::open(&config.storage.db_file)?)?);
    let event_index = Arc::new(EventIndex::open(Connection::open(&config.storage.db_file)?)?);
    let file_store = Arc::new(FileMetadataStore::new(
        config.storage.meta_dir.clone(),
        config.storage.users_dir.clone(),
    ));
    let blob_store = Arc::new(dfs3_store::BlobStore::new(config.storage.storage_dir.clone()));

    let ledger = Arc::new(HttpLedgerClient::new(config.ledger.iota_node_url.clone())?);
    let (bus_client, bus_eventloop) = MqttBusClient::connect(
        &config.network.mqtt_broker,
        config.network.mqtt_port,
        node_id.as_str(),
        &config.network.mqtt_topic,
    );
    let bus_client = Arc::new(bus_client);
    bus_client.subscribe().await.context("failed to subscribe to bus topic")?;

    let publisher = Arc::new(EventPublisher::new(
        ledger.clone(),
        bus_client.clone(),
        event_index.clone(),
        key_pair.clone(),
        node_id.clone(),
    ));

    let locator = Arc::new(RegistryNodeLocator::new(node_registry.clone()));
    let fetcher: Arc<dyn dfs3_store::PeerFetcher> = Arc::new(HttpPeerFetcher::new(locator)?);
    let announcer = Arc::new(PublisherReplicationAnnouncer::new(publisher.clone()));
    let clone_coordinator = Arc::new(HttpCloneCoordinator::new(fetcher.clone(), blob_store.clone(), announcer));

    let dispatcher = Arc::new(EventDispatcher::new(
        node_registry.clone(),
        user_registry.clone(),
        file_store.clone(),
        node_id.clone(),
        ClonePolicy::Scored,
        clone_coordinator,
    ));

    let listener = Arc::new(EventListener::new(
        ledger.clone(),
        event_index.clone(),
        node_registry.clone(),
        dispatcher,
    ));

    let auth = Arc::new(AuthService::new(user_registry.clone(), publisher.clone()));

    if let Some(seed_url) = config.sync.seed_node_url.clone() {
        match sync::sync_from_seed(&seed_url, Duration::from_secs(30), &listener).await {
            Ok(count) => info!(count, "synced event history from seed node"),
            Err(e) => warn!(error = %e, "failed to sync from seed node, continuing with empty state"),
        }
    }

    publish_self(
        &publisher,
        &identity.alias,
        &identity.tags,
        &identity.sealed.public_key_b64,
        &config,
    )
    .await?;

    let cancel = CancellationToken::new();

    let bus_task = {
        let listener = listener.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = listener.run(BusListener::new(bus_eventloop)) => {}
            }
        })
    };

    let heartbeat_task = tokio::spawn(heartbeat::run(
        publisher.clone(),
        Duration::from_secs(config.sync.update_status_interval_secs),
        config.storage.data_dir.clone(),
        config.network.api_port,
        cancel.clone(),
    ));

    let state = AppState {
        auth,
        publisher,
        event_index,
        nodes: node_registry,
        users: user_registry,
        files: file_store,
        blobs: blob_store,
        fetcher,
        local_node_id: node_id,
    };
    let app = dfs3_api::router(state);

    let listener_addr = format!("0.0.0.0:{}", config.network.api_port);
    let tcp_listener = tokio::net::TcpListener::bind(&listener_addr)
        .await
        .with_context(|| format!("failed to bind {listener_addr}"))?;
    info!(addr = %listener_addr, "serving API");

    let serve = axum::serve(tcp_listener, app).with_graceful_shutdown(shutdown_signal(cancel.clone()));

    serve.await.context("API server exited with an error")?;

    cancel.cancel();
    let _ = bus_task.await;
    let _ = heartbeat_task.await;

    info!("node shut down cleanly");
    Ok(())
}

async fn publish_self(
    publisher: &EventPublisher,
    alias: &str,
    tags: &[String],
    public_key_b64: &str,
    config: &NodeConfig,
) -> Result<()> {
    let tags: Vec<Tag> = tags
        .iter()
        .filter_map(|t| Tag::try_from(t.clone()).ok())
        .collect();
    let payload = NodeRegisteredPayload {
        alias: Alias::try_from(alias.to_string()).map_err(|e| anyhow::anyhow!("invalid alias: {e}"))?,
        hostname: Hostname::try_from(system::hostname()).unwrap_or_else(|_| {
            Hostname::try_from("localhost".to_string()).expect("'localhost' is always a valid hostname")
        }),
        public_key: public_key_b64.to_string(),
        platform: system::platform(),
        software_version: env!("CARGO_PKG_VERSION").to_string(),
        uptime: system::uptime_seconds(),
        total_space: system::total_disk_space(&config.storage.data_dir),
        ip: system::local_ip(),
        port: config.network.api_port,
        tags,
        version: 1,
    };
    publisher
        .publish(EventType::NodeRegistered, payload)
        .await
        .context("failed to publish node_registered")?;
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    let _ = tokio::signal::ctrl_c().await;
    info!("ctrl-c received, shutting down gracefully...");
    cancel.cancel();
}
