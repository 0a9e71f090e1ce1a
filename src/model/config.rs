use serde::Deserialize;
use std::fs;
use std::path::Path;
use url::Url;

const ENV_CONFIG_PATH: &str = "SENGOL_CONFIG_PATH";
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const ENV_EMBEDDING_BASE_URL: &str = "SENGOL_EMBEDDING_BASE_URL";
const ENV_EMBEDDING_MODEL: &str = "SENGOL_EMBEDDING_MODEL";
const ENV_EMBEDDING_DIMENSIONS: &str = "SENGOL_EMBEDDING_DIMENSIONS";
const ENV_QDRANT_URL: &str = "SENGOL_QDRANT_URL";
const ENV_QDRANT_COLLECTION: &str = "SENGOL_QDRANT_COLLECTION";

const DEFAULT_EMBEDDING_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
const DEFAULT_QDRANT_URL: &str = "http://127.0.0.1:6333";
const DEFAULT_QDRANT_COLLECTION: &str = "sengol_incidents_full";

/// Tunables for incident similarity search
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Matches below this cosine similarity are dropped after retrieval
    pub min_similarity: f64,
    /// topK used when the caller does not pass a limit
    pub default_limit: usize,
    /// Hard ceiling on topK; larger requests are clamped
    pub max_top_k: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            min_similarity: 0.65,
            default_limit: 25,
            max_top_k: 1000,
        }
    }
}

/// Embedding API coordinates
#[derive(Debug, Clone)]
pub struct EmbeddingConfig {
    pub base_url: Url,
    pub model: String,
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_EMBEDDING_BASE_URL).expect("valid default URL"),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Vector index coordinates
#[derive(Debug, Clone)]
pub struct QdrantConfig {
    pub base_url: Url,
    pub collection: String,
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_QDRANT_URL).expect("valid default URL"),
            collection: DEFAULT_QDRANT_COLLECTION.to_string(),
        }
    }
}

/// YAML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub search: SearchConfig,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub embedding: EmbeddingConfig,
    pub qdrant: QdrantConfig,
    pub search: SearchConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            embedding: EmbeddingConfig::default(),
            qdrant: QdrantConfig::default(),
            search: SearchConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment and config file
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let embedding = EmbeddingConfig {
            base_url: env_url(ENV_EMBEDDING_BASE_URL, DEFAULT_EMBEDDING_BASE_URL),
            model: std::env::var(ENV_EMBEDDING_MODEL)
                .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string()),
            dimensions: std::env::var(ENV_EMBEDDING_DIMENSIONS)
                .ok()
                .and_then(|d| d.parse().ok())
                .unwrap_or(DEFAULT_EMBEDDING_DIMENSIONS),
        };

        let qdrant = QdrantConfig {
            base_url: env_url(ENV_QDRANT_URL, DEFAULT_QDRANT_URL),
            collection: std::env::var(ENV_QDRANT_COLLECTION)
                .unwrap_or_else(|_| DEFAULT_QDRANT_COLLECTION.to_string()),
        };

        let config_path =
            std::env::var(ENV_CONFIG_PATH).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let search = Self::load_config_file(&config_path)
            .map(|cf| cf.search)
            .unwrap_or_default();

        Self {
            host,
            port,
            embedding,
            qdrant,
            search,
        }
    }

    /// Load configuration from YAML file
    fn load_config_file(path: &str) -> Option<ConfigFile> {
        let path = Path::new(path);

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return None;
        }

        match fs::read_to_string(path) {
            Ok(contents) => {
                let contents = contents.trim();
                if contents.is_empty() {
                    tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
                    return Some(ConfigFile::default());
                }

                match serde_yaml::from_str(contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded configuration from file");
                        Some(config)
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file, using defaults");
                        None
                    }
                }
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read config file, using defaults");
                None
            }
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_url(var: &str, default: &str) -> Url {
    std::env::var(var)
        .ok()
        .and_then(|v| match Url::parse(&v) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!(var = %var, error = %e, "Invalid URL in environment, using default");
                None
            }
        })
        .unwrap_or_else(|| Url::parse(default).expect("valid default URL"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_config_defaults_are_bounded() {
        let search = SearchConfig::default();
        assert!(search.min_similarity > 0.0 && search.min_similarity < 1.0);
        assert!(search.default_limit <= search.max_top_k);
    }

    #[test]
    fn config_file_parses_partial_yaml() {
        let cf: ConfigFile = serde_yaml::from_str("search:\n  min_similarity: 0.7\n").unwrap();
        assert_eq!(cf.search.min_similarity, 0.7);
        assert_eq!(
            cf.search.default_limit,
            SearchConfig::default().default_limit
        );
    }
}
