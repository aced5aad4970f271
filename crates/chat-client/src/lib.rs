pub mod cli;
pub mod render;
pub mod session;
pub mod transport;

pub use session::{ChatSession, ChatTurn, SubmitOutcome};
pub use transport::{ChatTransport, HttpChatTransport, TransportError};
