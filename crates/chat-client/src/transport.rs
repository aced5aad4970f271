use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;
use shared::models::{ChatRequest, KoaReply, Message, MiniPractice};
use thiserror::Error;
use tracing::debug;

pub type ChatTransportFuture<'a> =
    Pin<Box<dyn Future<Output = Result<KoaReply, TransportError>> + Send + 'a>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chat request could not be sent: {0}")]
    Network(String),
    #[error("chat endpoint returned status {status}")]
    Status { status: u16 },
    #[error("chat endpoint returned an unreadable body: {0}")]
    InvalidBody(String),
}

pub trait ChatTransport: Send + Sync {
    fn send<'a>(&'a self, messages: &'a [Message]) -> ChatTransportFuture<'a>;
}

#[derive(Debug, Clone)]
pub struct HttpChatTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpChatTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), url)
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, messages: &[Message]) -> Result<KoaReply, TransportError> {
        let request = ChatRequest {
            messages: messages.to_vec(),
        };

        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|err| TransportError::Network(err.to_string()))?;
        let payload: ReplyPayload = serde_json::from_str(&body)
            .map_err(|err| TransportError::InvalidBody(err.to_string()))?;
        debug!(
            status = status.as_u16(),
            has_mini_practice = payload.mini_practice.is_some(),
            "chat reply received"
        );

        Ok(KoaReply {
            reply: payload.reply.unwrap_or_default(),
            mini_practice: payload.mini_practice,
        })
    }
}

impl ChatTransport for HttpChatTransport {
    fn send<'a>(&'a self, messages: &'a [Message]) -> ChatTransportFuture<'a> {
        Box::pin(self.post(messages))
    }
}

/// Reply body as read by the client; a missing `reply` is left for the
/// session to replace with its placeholder.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplyPayload {
    #[serde(default)]
    reply: Option<String>,
    #[serde(default)]
    mini_practice: Option<MiniPractice>,
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use shared::models::{EnergyLevel, Message};
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    use super::{ChatTransport, HttpChatTransport, TransportError};

    struct MockServer {
        url: String,
        shutdown: Option<oneshot::Sender<()>>,
        handle: tokio::task::JoinHandle<()>,
    }

    impl MockServer {
        async fn start(app: Router) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0")
                .await
                .expect("listener should bind");
            let addr = listener.local_addr().expect("local addr");
            let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
            let handle = tokio::spawn(async move {
                axum::serve(listener, app)
                    .with_graceful_shutdown(async {
                        let _ = shutdown_rx.await;
                    })
                    .await
                    .expect("mock server should run");
            });

            Self {
                url: format!("http://{addr}/api/chat"),
                shutdown: Some(shutdown_tx),
                handle,
            }
        }

        async fn stop(mut self) {
            if let Some(shutdown) = self.shutdown.take() {
                let _ = shutdown.send(());
            }
            let _ = self.handle.await;
        }
    }

    #[tokio::test]
    async fn posts_history_and_decodes_practice() {
        let app = Router::new().route(
            "/api/chat",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(
                    body,
                    json!({ "messages": [{ "role": "user", "content": "so tired" }] })
                );
                Json(json!({
                    "reply": "Let's wake the body up gently.",
                    "miniPractice": {
                        "title": "Desk stretch",
                        "moodTags": ["tired"],
                        "energyLevel": "low",
                        "environment": "at_desk",
                        "duration": "1 minute",
                        "steps": ["Stand up", "Reach overhead"]
                    }
                }))
            }),
        );
        let server = MockServer::start(app).await;
        let transport = HttpChatTransport::new(server.url.clone());

        let reply = transport
            .send(&[Message::user("so tired")])
            .await
            .expect("send should succeed");

        assert_eq!(reply.reply, "Let's wake the body up gently.");
        let practice = reply.mini_practice.expect("practice should decode");
        assert_eq!(practice.energy_level, EnergyLevel::Low);
        assert_eq!(practice.steps.len(), 2);

        server.stop().await;
    }

    #[tokio::test]
    async fn missing_reply_text_decodes_as_empty() {
        let app = Router::new().route("/api/chat", post(|| async { Json(json!({})) }));
        let server = MockServer::start(app).await;
        let transport = HttpChatTransport::new(server.url.clone());

        let reply = transport
            .send(&[Message::user("hi")])
            .await
            .expect("send should succeed");

        assert!(reply.reply.is_empty());
        assert!(reply.mini_practice.is_none());

        server.stop().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_error_even_with_a_reply_body() {
        let app = Router::new().route(
            "/api/chat",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "reply": "sorry", "miniPractice": null })),
                )
            }),
        );
        let server = MockServer::start(app).await;
        let transport = HttpChatTransport::new(server.url.clone());

        let err = transport
            .send(&[Message::user("hi")])
            .await
            .expect_err("500 should fail");

        assert!(matches!(err, TransportError::Status { status: 500 }));

        server.stop().await;
    }

    #[tokio::test]
    async fn unreadable_body_is_an_error() {
        let app = Router::new().route("/api/chat", post(|| async { "not json" }));
        let server = MockServer::start(app).await;
        let transport = HttpChatTransport::new(server.url.clone());

        let err = transport
            .send(&[Message::user("hi")])
            .await
            .expect_err("plain text should fail");

        assert!(matches!(err, TransportError::InvalidBody(_)));

        server.stop().await;
    }
}
