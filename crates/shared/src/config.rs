use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use thiserror::Error;

use crate::config_env::optional_trimmed_env;
use crate::knowledge::PineconeConfig;
use crate::llm::OpenAiGatewayConfig;
use crate::pipeline::{
    DEFAULT_KNOWLEDGE_NAMESPACE, DEFAULT_RETRIEVAL_TOP_K, GENERATION_TEMPERATURE,
    PipelineSettings,
};

pub const DEFAULT_BIND_ADDR: SocketAddr =
    SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 8080));

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: String,
    pub knowledge: PineconeConfig,
    pub generation: OpenAiGatewayConfig,
    pub pipeline: PipelineSettings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var {0}")]
    MissingVar(String),
    #[error("invalid integer in env var {0}")]
    ParseInt(String),
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("failed to load .env file: {0}")]
    Dotenv(String),
}

impl ApiConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            bind_addr: optional_trimmed_env("API_BIND_ADDR")
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            knowledge: PineconeConfig::from_env()?,
            generation: OpenAiGatewayConfig::from_env()?,
            pipeline: PipelineSettings {
                namespace: optional_trimmed_env("PINECONE_NAMESPACE")
                    .unwrap_or_else(|| DEFAULT_KNOWLEDGE_NAMESPACE.to_string()),
                top_k: DEFAULT_RETRIEVAL_TOP_K,
                temperature: GENERATION_TEMPERATURE,
            },
        })
    }
}

/// Loads a `.env` file from the working directory when one exists.
pub fn load_dotenv() -> Result<(), ConfigError> {
    match dotenvy::dotenv() {
        Ok(_) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::Dotenv(err.to_string())),
    }
}
