/// Configuration system for repo-index
///
/// Supports loading from multiple sources with priority:
/// Process environment > .env file at the repository root > Config file > Defaults
///
/// Secrets (API keys) are never read from the config file.
use crate::error::{ConfigError, IndexError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Optional TOML config file, looked up at the repository root
pub const CONFIG_FILE_NAME: &str = "repo-index.toml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Fallback chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// File scanner configuration
    #[serde(default)]
    pub scanner: ScannerConfig,
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// API key, environment only (GEMINI_API_KEY)
    #[serde(skip)]
    pub api_key: String,

    /// Embedding model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Output dimensionality requested from the service
    #[serde(default = "default_dimension")]
    pub dimension: usize,

    /// Number of chunks embedded per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Delay between batches, in milliseconds
    #[serde(default = "default_rate_limit_ms")]
    pub rate_limit_ms: u64,
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// API key, environment only (PINECONE_API_KEY)
    #[serde(skip)]
    pub api_key: String,

    /// Index endpoint URL (PINECONE_HOST)
    #[serde(default)]
    pub host: String,

    /// Index name
    #[serde(default = "default_index")]
    pub index: String,

    /// Maximum vectors per upsert request
    #[serde(default = "default_upsert_batch_size")]
    pub upsert_batch_size: usize,
}

/// Fallback chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Character threshold at which a fixed-size chunk is emitted
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Character budget re-included as trailing overlap
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

/// File scanner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Glob patterns selecting indexable files
    #[serde(default = "default_include_patterns")]
    pub include_patterns: Vec<String>,

    /// Glob patterns excluded even when included above
    #[serde(default = "default_exclude_patterns")]
    pub exclude_patterns: Vec<String>,

    /// Maximum file size to index (in bytes)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

// Default value functions

fn default_model() -> String {
    "text-embedding-004".to_string()
}

fn default_dimension() -> usize {
    512
}

fn default_batch_size() -> usize {
    100
}

fn default_rate_limit_ms() -> u64 {
    100
}

fn default_index() -> String {
    "codebase".to_string()
}

fn default_upsert_batch_size() -> usize {
    100
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_include_patterns() -> Vec<String> {
    vec![
        "apps/**/*.{ts,tsx,js,jsx}".to_string(),
        "packages/**/*.{ts,tsx,js,jsx}".to_string(),
        "docs/**/*.md".to_string(),
        "*.md".to_string(),
    ]
}

fn default_exclude_patterns() -> Vec<String> {
    vec![
        "**/node_modules/**".to_string(),
        "**/dist/**".to_string(),
        "**/build/**".to_string(),
        "**/target/**".to_string(),
        "**/coverage/**".to_string(),
        "**/test-results/**".to_string(),
        "**/*.gen.ts".to_string(),
        "**/.env*".to_string(),
        "**/*.log".to_string(),
        "**/*.lock".to_string(),
        "**/.git/**".to_string(),
        "**/.vscode/**".to_string(),
        "**/.idea/**".to_string(),
        // keep the indexer from embedding itself
        "tools/repo-index/**".to_string(),
    ]
}

fn default_max_file_size() -> u64 {
    1_048_576 // 1 MB
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            dimension: default_dimension(),
            batch_size: default_batch_size(),
            rate_limit_ms: default_rate_limit_ms(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            host: String::new(),
            index: default_index(),
            upsert_batch_size: default_upsert_batch_size(),
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            include_patterns: default_include_patterns(),
            exclude_patterns: default_exclude_patterns(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Environment source discovered by walking parent directories for a `.env`
/// file. The directory containing the file becomes the repository root.
///
/// Lookups always prefer the process environment over the file contents.
#[derive(Debug, Clone)]
pub struct DotEnv {
    root: PathBuf,
    vars: HashMap<String, String>,
}

impl DotEnv {
    /// Walk up from `start` until a `.env` file is found
    pub fn discover(start: impl AsRef<Path>) -> Self {
        let start = start.as_ref().to_path_buf();
        let mut dir = start.clone();
        loop {
            let candidate = dir.join(".env");
            if candidate.is_file() {
                match fs::read_to_string(&candidate) {
                    Ok(content) => {
                        tracing::info!("loading .env from {}", candidate.display());
                        return Self {
                            root: dir,
                            vars: parse_env_lines(&content),
                        };
                    }
                    Err(error) => {
                        tracing::warn!("failed to read {}: {}", candidate.display(), error);
                    }
                }
            }
            if !dir.pop() {
                break;
            }
        }
        tracing::warn!("no .env file found, using process environment only");
        Self {
            root: start,
            vars: HashMap::new(),
        }
    }

    /// Build from explicit values instead of the filesystem
    pub fn from_vars(root: impl Into<PathBuf>, vars: HashMap<String, String>) -> Self {
        Self {
            root: root.into(),
            vars,
        }
    }

    /// The repository root (directory containing the `.env` file)
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Look up a variable, preferring the process environment
    pub fn get(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .filter(|value| !value.is_empty())
            .or_else(|| self.vars.get(key).cloned())
    }
}

/// Parse `KEY=VALUE` lines, skipping blanks and `#` comments
fn parse_env_lines(content: &str) -> HashMap<String, String> {
    let mut vars = HashMap::new();
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = trimmed.split_once('=') {
            let key = key.trim();
            if !key.is_empty() {
                vars.insert(key.to_string(), value.trim().to_string());
            }
        }
    }
    vars
}

impl Config {
    /// Load configuration for the repository described by `env`
    pub fn load(env: &DotEnv) -> Result<Self, IndexError> {
        let config_path = env.root().join(CONFIG_FILE_NAME);
        let mut config = if config_path.is_file() {
            tracing::info!("loading config from {}", config_path.display());
            Self::from_file(&config_path)?
        } else {
            Self::default()
        };
        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, IndexError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::LoadFailed(format!("failed to read config file: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed(format!("invalid TOML: {}", e)))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env(&mut self, env: &DotEnv) {
        if let Some(key) = env.get("GEMINI_API_KEY") {
            self.embedding.api_key = key;
        }
        if let Some(model) = env.get("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(dimension) = env.get("EMBEDDING_DIMENSION")
            && let Ok(parsed) = dimension.parse()
        {
            self.embedding.dimension = parsed;
        }
        if let Some(batch_size) = env.get("EMBEDDING_BATCH_SIZE")
            && let Ok(parsed) = batch_size.parse()
        {
            self.embedding.batch_size = parsed;
        }
        if let Some(delay) = env.get("EMBEDDING_RATE_LIMIT_MS")
            && let Ok(parsed) = delay.parse()
        {
            self.embedding.rate_limit_ms = parsed;
        }
        if let Some(key) = env.get("PINECONE_API_KEY") {
            self.store.api_key = key;
        }
        if let Some(host) = env.get("PINECONE_HOST") {
            self.store.host = host;
        }
        if let Some(index) = env.get("PINECONE_INDEX") {
            self.store.index = index;
        }
        if let Some(size) = env.get("CHUNK_SIZE")
            && let Ok(parsed) = size.parse()
        {
            self.chunking.chunk_size = parsed;
        }
        if let Some(overlap) = env.get("CHUNK_OVERLAP")
            && let Ok(parsed) = overlap.parse()
        {
            self.chunking.chunk_overlap = parsed;
        }
    }

    /// Validate configuration values; missing secrets are fatal at startup
    pub fn validate(&self) -> Result<(), IndexError> {
        if self.embedding.api_key.is_empty() {
            return Err(ConfigError::MissingRequired("GEMINI_API_KEY".to_string()).into());
        }
        if self.store.api_key.is_empty() {
            return Err(ConfigError::MissingRequired("PINECONE_API_KEY".to_string()).into());
        }
        if self.store.host.is_empty() {
            return Err(ConfigError::MissingRequired("PINECONE_HOST".to_string()).into());
        }
        if !self.store.host.starts_with("http://") && !self.store.host.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "store.host".to_string(),
                reason: format!("must be an http(s) URL, got '{}'", self.store.host),
            }
            .into());
        }
        if self.embedding.dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.dimension".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "embedding.batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.store.upsert_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "store.upsert_batch_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.chunking.chunk_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "chunking.chunk_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(ConfigError::InvalidValue {
                key: "chunking.chunk_overlap".to_string(),
                reason: format!(
                    "must be smaller than chunk_size ({})",
                    self.chunking.chunk_size
                ),
            }
            .into());
        }
        if self.scanner.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scanner.max_file_size".to_string(),
                reason: "must be greater than 0".to_string(),
            }
            .into());
        }
        Ok(())
    }
}
