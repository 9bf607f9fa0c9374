use std::env;

use anyhow::{anyhow, Result};

/// Process configuration, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub mongodb_uri: String,
    pub mongodb_db: String,
    pub mongodb_collection: String,
    pub ollama_url: String,
    pub ollama_model: String,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub bind_addr: String,
    pub max_result_docs: i64,
}

fn default_mongodb_db() -> &'static str {
    "qms"
}

fn default_mongodb_collection() -> &'static str {
    "cuttinginspections"
}

fn default_ollama_url() -> &'static str {
    "http://localhost:11434"
}

fn default_ollama_model() -> &'static str {
    "llama3.2:1b"
}

fn default_gemini_model() -> &'static str {
    "gemini-1.5-flash"
}

fn default_bind_addr() -> &'static str {
    "127.0.0.1:5002"
}

fn default_max_result_docs() -> i64 {
    500
}

impl AppConfig {
    /// Build the configuration from environment variables.
    /// MONGODB_URI has no fallback; everything else defaults.
    pub fn from_env() -> Result<Self> {
        let mongodb_uri = env::var("MONGODB_URI")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| anyhow!("MONGODB_URI must be set to a MongoDB connection string"))?;

        let max_result_docs = match env::var("MAX_RESULT_DOCS") {
            Ok(raw) => raw
                .parse::<i64>()
                .map_err(|_| anyhow!("MAX_RESULT_DOCS must be an integer, got {:?}", raw))?,
            Err(_) => default_max_result_docs(),
        };
        if max_result_docs <= 0 {
            return Err(anyhow!("MAX_RESULT_DOCS must be positive"));
        }

        Ok(Self {
            mongodb_uri,
            mongodb_db: env_or("MONGODB_DB", default_mongodb_db()),
            mongodb_collection: env_or("MONGODB_COLLECTION", default_mongodb_collection()),
            ollama_url: env_or("OLLAMA_URL", default_ollama_url()),
            ollama_model: env_or("OLLAMA_MODEL", default_ollama_model()),
            gemini_api_key: env::var("GEMINI_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            gemini_model: env_or("GEMINI_MODEL", default_gemini_model()),
            bind_addr: env_or("BIND_ADDR", default_bind_addr()),
            max_result_docs,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
