use anyhow::{Context, Result};
use board_node::{
    api::{create_board_router, AppState},
    config::BoardConfig,
    store::{EntityReader, EntityWriter, InMemoryEntityStore, RpcEntityStore},
};
use clap::Parser;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Board Server Arguments
#[derive(Parser)]
#[clap(name = "board-server")]
#[clap(about = "Message board and declaration signing API over an entity store")]
struct Args {
    /// Address to listen on
    #[clap(long, default_value = "0.0.0.0:3000")]
    bind: SocketAddr,

    /// Entity store JSON-RPC endpoint, overrides ARKIV_RPC_URL
    #[clap(long)]
    rpc_url: Option<String>,

    /// Keep entities in process memory instead of the chain
    #[clap(long)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let mut config = BoardConfig::from_env().context("Failed to load configuration")?;
    if let Some(rpc_url) = args.rpc_url {
        config.rpc_url = rpc_url;
    }
    if !config.writes_enabled() {
        warn!("ARKIV_PRIVATE_KEY not set, POST endpoints will answer 500");
    }

    let (reader, writer, backend): (Arc<dyn EntityReader>, Arc<dyn EntityWriter>, String) =
        if args.in_memory {
            let store = Arc::new(InMemoryEntityStore::new());
            (
                store.clone() as Arc<dyn EntityReader>,
                store as Arc<dyn EntityWriter>,
                "in-memory".to_string(),
            )
        } else {
            let store = Arc::new(
                RpcEntityStore::new(config.rpc_url.clone())
                    .context("Failed to build entity store client")?,
            );
            let backend = store.rpc_url().to_string();
            (
                store.clone() as Arc<dyn EntityReader>,
                store as Arc<dyn EntityWriter>,
                backend,
            )
        };

    info!(
        "Starting board server on {} (spaces: {:?}, store: {})",
        args.bind,
        config.read_partitions(),
        backend
    );

    let app = create_board_router(AppState::new(config, reader, writer));

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    axum::serve(listener, app).await?;

    Ok(())
}
