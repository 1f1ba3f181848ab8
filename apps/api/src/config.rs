use anyhow::{bail, Context, Result};

const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";
const DEFAULT_LOCAL_EMBEDDING_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_API_URL: &str = "https://api.openai.com/v1/embeddings";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Which backend turns normalized text into sentence embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingProvider {
    /// BERT sentence encoder run in-process with candle.
    Local,
    /// OpenAI-compatible `/v1/embeddings` endpoint.
    OpenAi,
}

impl EmbeddingProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingProvider::Local => "local",
            EmbeddingProvider::OpenAi => "openai",
        }
    }

    /// Model used when `EMBEDDING_MODEL` is unset: a hub id for the local encoder,
    /// an API model name for the remote endpoint.
    pub fn default_model(&self) -> &'static str {
        match self {
            EmbeddingProvider::Local => DEFAULT_LOCAL_EMBEDDING_MODEL,
            EmbeddingProvider::OpenAi => DEFAULT_OPENAI_EMBEDDING_MODEL,
        }
    }
}

impl std::str::FromStr for EmbeddingProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "local" | "candle" => Ok(EmbeddingProvider::Local),
            "openai" => Ok(EmbeddingProvider::OpenAi),
            other => bail!("Unknown EMBEDDING_PROVIDER '{other}' (expected 'local' or 'openai')"),
        }
    }
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Clone)]
pub struct Config {
    pub llm_api_key: String,
    pub llm_api_url: String,
    pub llm_model: String,
    pub llm_temperature: f32,
    pub llm_timeout_secs: u64,
    pub embedding_provider: EmbeddingProvider,
    pub embedding_model: String,
    pub embedding_api_key: Option<String>,
    pub embedding_api_url: String,
    pub scoring_timeout_secs: u64,
    pub allowed_origins: Vec<String>,
    pub max_upload_bytes: usize,
    pub port: u16,
    pub rust_log: String,
}

// Hand-written so the credentials never end up in logs.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("llm_api_url", &self.llm_api_url)
            .field("llm_model", &self.llm_model)
            .field("llm_temperature", &self.llm_temperature)
            .field("llm_timeout_secs", &self.llm_timeout_secs)
            .field("embedding_provider", &self.embedding_provider)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_api_url", &self.embedding_api_url)
            .field("scoring_timeout_secs", &self.scoring_timeout_secs)
            .field("allowed_origins", &self.allowed_origins)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let embedding_provider: EmbeddingProvider = env_or("EMBEDDING_PROVIDER", "local").parse()?;

        Ok(Config {
            llm_api_key: require_env("LLM_API_KEY")?,
            llm_api_url: env_or("LLM_API_URL", DEFAULT_LLM_API_URL),
            llm_model: env_or("LLM_MODEL", DEFAULT_LLM_MODEL),
            llm_temperature: parse_env("LLM_TEMPERATURE", 0.1)?,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            embedding_provider,
            embedding_model: env_or("EMBEDDING_MODEL", embedding_provider.default_model()),
            embedding_api_key: std::env::var("EMBEDDING_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            embedding_api_url: env_or("EMBEDDING_API_URL", DEFAULT_EMBEDDING_API_URL),
            scoring_timeout_secs: parse_env("SCORING_TIMEOUT_SECS", 30)?,
            allowed_origins: parse_origins(&env_or("ALLOWED_ORIGINS", DEFAULT_ALLOWED_ORIGINS)),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 50 * 1024 * 1024)?,
            port: parse_env("PORT", 8000)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    /// Credential for the embedding endpoint. Falls back to the LLM key.
    pub fn embedding_key(&self) -> &str {
        self.embedding_api_key
            .as_deref()
            .unwrap_or(self.llm_api_key.as_str())
    }
}

fn require_env(key: &str) -> Result<String> {
    let value = std::env::var(key)
        .with_context(|| format!("Required environment variable '{key}' is not set"))?;
    if value.trim().is_empty() {
        bail!("Required environment variable '{key}' is empty");
    }
    Ok(value)
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value: '{raw}'")),
        Err(_) => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}

#[cfg(test)]
impl Config {
    /// Fully populated config for handler tests. Never touches the environment.
    pub fn for_tests() -> Self {
        Config {
            llm_api_key: "test-key".to_string(),
            llm_api_url: DEFAULT_LLM_API_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_temperature: 0.1,
            llm_timeout_secs: 5,
            embedding_provider: EmbeddingProvider::Local,
            embedding_model: "test-model".to_string(),
            embedding_api_key: None,
            embedding_api_url: DEFAULT_EMBEDDING_API_URL.to_string(),
            scoring_timeout_secs: 5,
            allowed_origins: parse_origins(DEFAULT_ALLOWED_ORIGINS),
            max_upload_bytes: 1024 * 1024,
            port: 8000,
            rust_log: "info".to_string(),
        }
    }
}
