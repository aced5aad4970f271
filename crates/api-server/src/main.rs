use std::net::SocketAddr;
use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::config::{ApiConfig, DEFAULT_BIND_ADDR, load_dotenv};
use shared::knowledge::PineconeStore;
use shared::llm::OpenAiGateway;
use shared::pipeline::ReplyPipeline;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    if let Err(err) = load_dotenv() {
        eprintln!("{err}");
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "api_server=info,shared=info,axum=info".to_string()),
        )
        .json()
        .flatten_event(true)
        .with_current_span(true)
        .init();

    let config = match ApiConfig::from_env() {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "failed to read config");
            std::process::exit(1);
        }
    };

    let store = match PineconeStore::connect(config.knowledge.clone()).await {
        Ok(store) => store,
        Err(err) => {
            error!(error = %err, index = %config.knowledge.index_name, "failed to connect to pinecone");
            std::process::exit(1);
        }
    };

    let gateway = match OpenAiGateway::new(config.generation.clone()) {
        Ok(gateway) => gateway,
        Err(err) => {
            error!(error = %err, "failed to initialize generation gateway");
            std::process::exit(1);
        }
    };

    info!(
        namespace = %config.pipeline.namespace,
        top_k = config.pipeline.top_k,
        model = %config.generation.model,
        "reply pipeline configured"
    );
    let app = build_router(AppState {
        pipeline: ReplyPipeline::new(Arc::new(store), Arc::new(gateway), config.pipeline),
    });

    let addr: SocketAddr = match config.bind_addr.parse() {
        Ok(addr) => addr,
        Err(_) => {
            warn!(
                bind_addr = %config.bind_addr,
                "invalid API_BIND_ADDR; falling back to {DEFAULT_BIND_ADDR}"
            );
            DEFAULT_BIND_ADDR
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!(error = %err, %addr, "failed to bind listener");
            std::process::exit(1);
        }
    };

    info!(
        "api server listening on {}",
        listener.local_addr().unwrap_or(addr)
    );
    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "api server stopped with error");
        std::process::exit(1);
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
