pub mod config;
mod config_env;
pub mod knowledge;
pub mod llm;
pub mod models;
pub mod pipeline;
