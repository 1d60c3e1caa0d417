use std::io::Write;

use serial_test::serial;

use super::*;

const ENV_KEYS: [&str; 18] = [
    "REPORAG_CONFIG",
    "REPORAG_LLM_PROVIDER",
    "REPORAG_LLM_BASE_URL",
    "REPORAG_LLM_MODEL",
    "REPORAG_LLM_EMBEDDING_MODEL",
    "REPORAG_LLM_API_VERSION",
    "REPORAG_LLM_MAX_TOKENS",
    "REPORAG_LLM_API_KEY",
    "OPENAI_API_KEY",
    "REPORAG_STORE_BACKEND",
    "REPORAG_SQLITE_PATH",
    "REPORAG_QDRANT_URL",
    "REPORAG_QDRANT_COLLECTION",
    "REPORAG_EMBEDDING_DIMENSIONS",
    "REPORAG_CHUNK_TOKENS",
    "REPORAG_CHUNK_OVERLAP",
    "REPORAG_SOURCE_MAX_FILE_BYTES",
    "RUST_LOG",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

#[test]
#[serial]
fn defaults_when_file_missing() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/reporag.toml")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
    assert_eq!(config.llm.embedding_model, "text-embedding-ada-002");
    assert_eq!(config.store.backend, StoreBackend::Sqlite);
    assert_eq!(config.store.dimensions, 1536);
    assert_eq!(config.chunking.chunk_tokens, 900);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.chunking.whole_file_tokens, 1500);
    assert_eq!(config.source.max_file_bytes, 1024 * 1024);
    assert!(config.secrets.api_key.is_none());
}

#[test]
#[serial]
fn parse_valid_toml() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("reporag.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(
        f,
        r#"
[llm]
provider = "azure"
base_url = "https://example.openai.azure.com"
model = "gpt35"
embedding_model = "ada"
api_version = "2023-05-15"

[store]
backend = "memory"
dimensions = 8

[chunking]
chunk_tokens = 500
chunk_overlap = 50
"#
    )
    .unwrap();

    clear_env();

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Azure);
    assert_eq!(config.llm.model, "gpt35");
    assert_eq!(config.llm.api_version, "2023-05-15");
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.store.dimensions, 8);
    assert_eq!(config.chunking.chunk_tokens, 500);
    assert_eq!(config.chunking.generic_chunk_tokens, 1500);
    assert_eq!(config.store.collection, "reporag_chunks");
}

#[test]
#[serial]
fn invalid_toml_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.toml");
    std::fs::write(&path, "[store\nbackend = ").unwrap();
    clear_env();
    let err = Config::load(&path).unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
#[serial]
fn env_overrides_file_values() {
    clear_env();
    unsafe {
        std::env::set_var("REPORAG_LLM_PROVIDER", "ollama");
        std::env::set_var("REPORAG_LLM_MODEL", "llama3");
        std::env::set_var("REPORAG_STORE_BACKEND", "qdrant");
        std::env::set_var("REPORAG_EMBEDDING_DIMENSIONS", "768");
        std::env::set_var("REPORAG_CHUNK_OVERLAP", "64");
        std::env::set_var("REPORAG_LLM_MAX_TOKENS", "not-a-number");
    }

    let config = Config::load(Path::new("/nonexistent")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::Ollama);
    assert_eq!(config.llm.model, "llama3");
    assert_eq!(config.store.backend, StoreBackend::Qdrant);
    assert_eq!(config.store.dimensions, 768);
    assert_eq!(config.chunking.chunk_overlap, 64);
    assert_eq!(config.llm.max_tokens, 1024);

    clear_env();
}

#[test]
#[serial]
fn invalid_provider_env_is_ignored() {
    clear_env();
    unsafe { std::env::set_var("REPORAG_LLM_PROVIDER", "claude") };
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    assert_eq!(config.llm.provider, ProviderKind::OpenAi);
    clear_env();
}

#[test]
#[serial]
fn api_key_prefers_reporag_variable() {
    clear_env();
    unsafe {
        std::env::set_var("OPENAI_API_KEY", "sk-openai");
        std::env::set_var("REPORAG_LLM_API_KEY", "sk-reporag");
    }
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    assert_eq!(config.secrets.api_key.as_deref(), Some("sk-reporag"));
    assert!(!format!("{:?}", config.secrets).contains("sk-reporag"));

    unsafe { std::env::remove_var("REPORAG_LLM_API_KEY") };
    let config = Config::load(Path::new("/nonexistent")).unwrap();
    assert_eq!(config.secrets.api_key.as_deref(), Some("sk-openai"));
    clear_env();
}

#[test]
#[serial]
fn validate_rejects_bad_values() {
    clear_env();
    let mut config = Config::load(Path::new("/nonexistent")).unwrap();
    config.secrets.api_key = Some("k".into());
    assert!(config.validate().is_ok());

    config.chunking.chunk_overlap = config.chunking.chunk_tokens;
    assert!(config.validate().is_err());
    config.chunking.chunk_overlap = 100;

    config.store.dimensions = 0;
    assert!(config.validate().is_err());
    config.store.dimensions = 1536;

    // The key is only needed once a provider is built; `stats` never builds one.
    config.secrets.api_key = None;
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn config_path_resolution_order() {
    clear_env();
    assert_eq!(
        resolve_config_path(Some(Path::new("/etc/reporag.toml"))),
        PathBuf::from("/etc/reporag.toml")
    );
    assert_eq!(resolve_config_path(None), PathBuf::from("config/default.toml"));
    unsafe { std::env::set_var("REPORAG_CONFIG", "/tmp/custom.toml") };
    assert_eq!(resolve_config_path(None), PathBuf::from("/tmp/custom.toml"));
    clear_env();
}
