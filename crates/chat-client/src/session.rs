use chrono::{DateTime, Utc};
use shared::models::{KoaReply, Message, MiniPractice, Role};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::transport::{ChatTransport, TransportError};

/// Shown when the backend answered but the reply text was empty.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "I'm here with you. Could you tell me a bit more?";

pub const SEND_FAILURE_REPLY: &str =
    "Sorry, I couldn't reach Koa just now. Please check your connection and try again.";

#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub mini_practice: Option<MiniPractice>,
    pub created_at: DateTime<Utc>,
}

impl ChatTurn {
    fn new(role: Role, content: String, mini_practice: Option<MiniPractice>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content,
            mini_practice,
            created_at: Utc::now(),
        }
    }

    pub fn to_message(&self) -> Message {
        Message::new(self.role, self.content.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitRejection {
    EmptyInput,
    Busy,
}

/// History captured when a submit starts; send it, then hand the result to
/// [`ChatSession::complete_submit`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSend {
    pub messages: Vec<Message>,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Replied,
    Failed(TransportError),
    EmptyInput,
    Busy,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
    input: String,
    loading: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last_turn(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn history(&self) -> Vec<Message> {
        self.turns.iter().map(ChatTurn::to_message).collect()
    }

    /// Appends the user turn, clears the input and raises the loading flag.
    pub fn begin_submit(&mut self) -> Result<PendingSend, SubmitRejection> {
        if self.loading {
            return Err(SubmitRejection::Busy);
        }

        let text = self.input.trim();
        if text.is_empty() {
            return Err(SubmitRejection::EmptyInput);
        }

        let turn = ChatTurn::new(Role::User, text.to_string(), None);
        self.turns.push(turn);
        self.input.clear();
        self.loading = true;

        Ok(PendingSend {
            messages: self.history(),
        })
    }

    /// Appends exactly one assistant turn and always clears the loading flag.
    pub fn complete_submit(&mut self, result: Result<KoaReply, TransportError>) -> SubmitOutcome {
        self.loading = false;

        match result {
            Ok(reply) => {
                let content = if reply.reply.trim().is_empty() {
                    EMPTY_REPLY_PLACEHOLDER.to_string()
                } else {
                    reply.reply
                };
                debug!(
                    turns = self.turns.len() + 1,
                    has_mini_practice = reply.mini_practice.is_some(),
                    "assistant turn appended"
                );
                self.turns
                    .push(ChatTurn::new(Role::Assistant, content, reply.mini_practice));
                SubmitOutcome::Replied
            }
            Err(err) => {
                warn!(error = %err, "chat send failed");
                self.turns.push(ChatTurn::new(
                    Role::Assistant,
                    SEND_FAILURE_REPLY.to_string(),
                    None,
                ));
                SubmitOutcome::Failed(err)
            }
        }
    }

    pub async fn submit(&mut self, transport: &dyn ChatTransport) -> SubmitOutcome {
        let pending = match self.begin_submit() {
            Ok(pending) => pending,
            Err(SubmitRejection::EmptyInput) => return SubmitOutcome::EmptyInput,
            Err(SubmitRejection::Busy) => return SubmitOutcome::Busy,
        };

        let result = transport.send(&pending.messages).await;
        self.complete_submit(result)
    }
}
