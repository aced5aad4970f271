use serial_test::serial;
use shared::config::{ApiConfig, ConfigError, DEFAULT_BIND_ADDR};

const MANAGED_KEYS: &[&str] = &[
    "API_BIND_ADDR",
    "PINECONE_API_KEY",
    "PINECONE_INDEX",
    "PINECONE_INDEX_HOST",
    "PINECONE_CONTROL_URL",
    "PINECONE_NAMESPACE",
    "PINECONE_API_VERSION",
    "PINECONE_TIMEOUT_MS",
    "OPENAI_API_KEY",
    "OPENAI_CHAT_COMPLETIONS_URL",
    "OPENAI_MODEL",
    "OPENAI_TIMEOUT_MS",
    "KOA_RETRIEVAL_TOP_K",
];

fn reset_env(values: &[(&str, &str)]) {
    // SAFETY: every test in this file is #[serial], so no other thread reads
    // the environment while it is being mutated.
    unsafe {
        for key in MANAGED_KEYS {
            std::env::remove_var(key);
        }
        for (key, value) in values {
            std::env::set_var(key, value);
        }
    }
}

#[test]
#[serial]
fn defaults_apply_when_optional_vars_are_unset() {
    reset_env(&[
        ("PINECONE_API_KEY", "pc-key"),
        ("PINECONE_INDEX", "koa-index"),
        ("OPENAI_API_KEY", "sk-test"),
        ("PINECONE_NAMESPACE", "   "),
    ]);

    let config = ApiConfig::from_env().expect("config should load");

    assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR.to_string());
    assert_eq!(config.pipeline.namespace, "koa-knowledge");
    assert_eq!(config.pipeline.top_k, 5);
    assert!((config.pipeline.temperature - 0.7).abs() < f32::EPSILON);
    assert_eq!(config.knowledge.index_name, "koa-index");
    assert!(config.knowledge.index_host.is_none());
    assert_eq!(config.knowledge.control_url, "https://api.pinecone.io");
    assert_eq!(
        config.generation.chat_completions_url,
        "https://api.openai.com/v1/chat/completions"
    );
    assert_eq!(config.generation.model, "gpt-4o-mini");
    assert!(config.generation.timeout_ms.is_none());
}

#[test]
#[serial]
fn overrides_are_read_and_trimmed_but_retrieval_depth_stays_fixed() {
    reset_env(&[
        ("API_BIND_ADDR", "0.0.0.0:3000"),
        ("PINECONE_API_KEY", " pc-key "),
        ("PINECONE_INDEX", "koa-index"),
        ("PINECONE_INDEX_HOST", "koa-index-abc.svc.pinecone.io"),
        ("PINECONE_NAMESPACE", "wellbeing"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_MODEL", "gpt-4o"),
        ("OPENAI_TIMEOUT_MS", "20000"),
        ("KOA_RETRIEVAL_TOP_K", "3"),
    ]);

    let config = ApiConfig::from_env().expect("config should load");

    assert_eq!(config.bind_addr, "0.0.0.0:3000");
    assert_eq!(config.knowledge.api_key, "pc-key");
    assert_eq!(
        config.knowledge.index_host.as_deref(),
        Some("koa-index-abc.svc.pinecone.io")
    );
    assert_eq!(config.pipeline.namespace, "wellbeing");
    assert_eq!(config.pipeline.top_k, 5);
    assert_eq!(config.generation.model, "gpt-4o");
    assert_eq!(config.generation.timeout_ms, Some(20_000));
}

#[test]
#[serial]
fn missing_credentials_are_reported() {
    reset_env(&[("PINECONE_API_KEY", "pc-key"), ("PINECONE_INDEX", "koa-index")]);

    let err = ApiConfig::from_env().expect_err("missing openai key must fail");
    assert!(matches!(err, ConfigError::MissingVar(ref key) if key == "OPENAI_API_KEY"));
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    reset_env(&[
        ("PINECONE_API_KEY", "pc-key"),
        ("PINECONE_INDEX", "koa-index"),
        ("OPENAI_API_KEY", "sk-test"),
        ("PINECONE_TIMEOUT_MS", "soon"),
    ]);
    let err = ApiConfig::from_env().expect_err("non-integer timeout must fail");
    assert!(matches!(err, ConfigError::ParseInt(ref key) if key == "PINECONE_TIMEOUT_MS"));

    reset_env(&[
        ("PINECONE_API_KEY", "pc-key"),
        ("PINECONE_INDEX", "koa-index"),
        ("OPENAI_API_KEY", "sk-test"),
        ("OPENAI_CHAT_COMPLETIONS_URL", "api.openai.com/v1/chat/completions"),
    ]);
    let err = ApiConfig::from_env().expect_err("scheme-less url must fail");
    assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
}
