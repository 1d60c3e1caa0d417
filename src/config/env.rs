use super::Config;

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("REPORAG_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid REPORAG_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_EMBEDDING_MODEL") {
            self.llm.embedding_model = v;
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_API_VERSION") {
            self.llm.api_version = v;
        }
        if let Ok(v) = std::env::var("REPORAG_LLM_MAX_TOKENS")
            && let Ok(n) = v.parse::<u32>()
        {
            self.llm.max_tokens = n;
        }
        if let Ok(v) = std::env::var("REPORAG_STORE_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.store.backend = backend;
            } else {
                tracing::warn!("ignoring invalid REPORAG_STORE_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("REPORAG_SQLITE_PATH") {
            self.store.sqlite_path = v;
        }
        if let Ok(v) = std::env::var("REPORAG_QDRANT_URL") {
            self.store.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("REPORAG_QDRANT_COLLECTION") {
            self.store.collection = v;
        }
        if let Ok(v) = std::env::var("REPORAG_EMBEDDING_DIMENSIONS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.store.dimensions = n;
        }
        if let Ok(v) = std::env::var("REPORAG_CHUNK_TOKENS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_tokens = n;
        }
        if let Ok(v) = std::env::var("REPORAG_CHUNK_OVERLAP")
            && let Ok(n) = v.parse::<usize>()
        {
            self.chunking.chunk_overlap = n;
        }
        if let Ok(v) = std::env::var("REPORAG_SOURCE_MAX_FILE_BYTES")
            && let Ok(n) = v.parse::<u64>()
        {
            self.source.max_file_bytes = n;
        }

        self.secrets.api_key = std::env::var("REPORAG_LLM_API_KEY")
            .or_else(|_| std::env::var("OPENAI_API_KEY"))
            .ok()
            .filter(|k| !k.is_empty());
    }
}
