pub mod contracts;
pub mod gateway;
pub mod observability;
pub mod openai;
pub mod prompts;
pub mod validation;

pub use contracts::{
    ContractError, parse_reply_contract, practice_output_schema, reply_output_schema,
};
pub use gateway::{
    LlmGateway, LlmGatewayError, LlmGatewayFuture, LlmGatewayRequest, LlmGatewayResponse,
    LlmTokenUsage,
};
pub use observability::{LlmTelemetryEvent, generate_with_telemetry, log_telemetry};
pub use openai::{OpenAiGateway, OpenAiGatewayConfig};
pub use prompts::{APOLOGY_REPLY, NO_CONTEXT_NOTICE, build_generation_messages};
pub use validation::{ReplyValidationError, validate_reply_json, validate_reply_value};
