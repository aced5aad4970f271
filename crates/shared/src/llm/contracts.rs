use schemars::schema_for;
use serde_json::Value;
use thiserror::Error;

use crate::models::{KoaReply, MiniPractice};

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("reply contract payload is invalid: {0}")]
    Deserialize(#[from] serde_json::Error),
    #[error("reply contract has an empty reply text")]
    EmptyReply,
}

pub fn reply_output_schema() -> Value {
    serde_json::to_value(schema_for!(KoaReply)).expect("koa reply schema should be serializable")
}

pub fn practice_output_schema() -> Value {
    serde_json::to_value(schema_for!(MiniPractice))
        .expect("mini practice schema should be serializable")
}

pub fn parse_reply_contract(payload: Value) -> Result<KoaReply, ContractError> {
    let reply: KoaReply = serde_json::from_value(payload)?;
    if reply.reply.trim().is_empty() {
        return Err(ContractError::EmptyReply);
    }
    Ok(reply)
}
