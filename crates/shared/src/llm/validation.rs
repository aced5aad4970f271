use std::collections::BTreeSet;
use std::sync::LazyLock;

use jsonschema::JSONSchema;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use super::contracts::{
    ContractError, parse_reply_contract, practice_output_schema, reply_output_schema,
};
use crate::models::{KoaReply, MiniPractice, MoodTag};

const PRACTICE_FIELD: &str = "miniPractice";
const MOOD_TAGS_FIELD: &str = "moodTags";

#[derive(Debug, Error)]
pub enum ReplyValidationError {
    #[error("generated reply is not valid json: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("reply schema failed to compile: {0}")]
    SchemaCompile(String),
    #[error("generated reply failed schema validation: {0:?}")]
    SchemaViolation(Vec<String>),
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl ReplyValidationError {
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "invalid_json",
            Self::SchemaCompile(_) => "schema_compile",
            Self::SchemaViolation(_) => "schema_violation",
            Self::Contract(_) => "contract_violation",
        }
    }
}

pub fn validate_reply_json(raw_json: &str) -> Result<KoaReply, ReplyValidationError> {
    let payload: Value = serde_json::from_str(raw_json)?;
    validate_reply_value(&payload)
}

/// Only the `reply` text is mandatory. The practice is kept when it fits the
/// practice schema after unknown mood tags are dropped, and nulled otherwise.
pub fn validate_reply_value(payload: &Value) -> Result<KoaReply, ReplyValidationError> {
    let Value::Object(fields) = payload else {
        return Err(ReplyValidationError::SchemaViolation(vec![
            "reply payload must be a JSON object".to_string(),
        ]));
    };

    let mut envelope = fields.clone();
    let raw_practice = envelope.insert(PRACTICE_FIELD.to_string(), Value::Null);
    let envelope = Value::Object(envelope);
    check_schema(&REPLY_VALIDATOR, &envelope)?;

    let mut reply = parse_reply_contract(envelope)?;
    reply.mini_practice = match raw_practice {
        Some(raw) if !raw.is_null() => salvage_practice(raw)?,
        _ => None,
    };
    Ok(reply)
}

fn salvage_practice(mut raw: Value) -> Result<Option<MiniPractice>, ReplyValidationError> {
    let dropped = drop_unknown_mood_tags(&mut raw);
    if !dropped.is_empty() {
        warn!(dropped_mood_tags = ?dropped, "dropped unknown mood tags from generated practice");
    }

    if let Err(err) = check_schema(&PRACTICE_VALIDATOR, &raw) {
        match err {
            ReplyValidationError::SchemaViolation(errors) => {
                warn!(errors = ?errors, "generated practice discarded, reply text kept");
                return Ok(None);
            }
            other => return Err(other),
        }
    }

    match serde_json::from_value::<MiniPractice>(raw) {
        Ok(practice) => Ok(Some(practice)),
        Err(err) => {
            warn!(error = %err, "generated practice discarded, reply text kept");
            Ok(None)
        }
    }
}

/// Removes tags outside [`MoodTag`] and repeated tags. Returns what was removed.
fn drop_unknown_mood_tags(practice: &mut Value) -> Vec<String> {
    let Some(Value::Array(tags)) = practice.get_mut(MOOD_TAGS_FIELD) else {
        return Vec::new();
    };

    let mut seen = BTreeSet::new();
    let mut dropped = Vec::new();
    tags.retain(|tag| {
        let keep = serde_json::from_value::<MoodTag>(tag.clone())
            .is_ok_and(|mood| seen.insert(mood));
        if !keep {
            dropped.push(tag.to_string());
        }
        keep
    });
    dropped
}

fn check_schema(
    validator: &LazyLock<Result<JSONSchema, String>>,
    payload: &Value,
) -> Result<(), ReplyValidationError> {
    let validator = validator
        .as_ref()
        .map_err(|message| ReplyValidationError::SchemaCompile(message.clone()))?;

    if let Err(validation_errors) = validator.validate(payload) {
        let errors = validation_errors
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(ReplyValidationError::SchemaViolation(errors));
    }
    Ok(())
}

static REPLY_VALIDATOR: LazyLock<Result<JSONSchema, String>> = LazyLock::new(|| {
    JSONSchema::compile(&reply_output_schema()).map_err(|err| err.to_string())
});

static PRACTICE_VALIDATOR: LazyLock<Result<JSONSchema, String>> = LazyLock::new(|| {
    JSONSchema::compile(&practice_output_schema()).map_err(|err| err.to_string())
});
