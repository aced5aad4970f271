#![allow(dead_code)]

use std::sync::Arc;

use api_server::http::{AppState, build_router};
use shared::knowledge::KnowledgeStore;
use shared::llm::LlmGateway;
use shared::pipeline::{PipelineSettings, ReplyPipeline};

pub fn build_test_router(
    store: Arc<dyn KnowledgeStore>,
    gateway: Arc<dyn LlmGateway>,
) -> axum::Router {
    build_router(AppState {
        pipeline: ReplyPipeline::new(store, gateway, PipelineSettings::default()),
    })
}

pub struct LiveApiServer {
    pub chat_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl LiveApiServer {
    pub async fn start(app: axum::Router) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("api listener should bind");
        let bind_addr = listener
            .local_addr()
            .expect("api listener local address should exist");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("api server should run");
        });

        Self {
            chat_url: format!("http://{bind_addr}/api/chat"),
            handle,
        }
    }
}

impl Drop for LiveApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
