//! Generation result cache
//!
//! Memoizes generated question sets behind a keyed-cache trait so the
//! storage engine is swappable: Redis in deployments, an in-process map in
//! tests. Entries are whole-value upserts keyed by request fingerprint;
//! concurrent writers for the same fingerprint write the same value, so
//! last-write-wins is safe and no mutual exclusion is needed.

use std::collections::HashMap;
use std::env;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use crate::model::GenerationCacheEntry;

// Environment variable names
const ENV_REDIS_HOST: &str = "SENGOL_REDIS_HOST";
const ENV_REDIS_PORT: &str = "SENGOL_REDIS_PORT";
const ENV_REDIS_PASSWORD: &str = "SENGOL_REDIS_PASSWORD";
const ENV_REDIS_DB: &str = "SENGOL_REDIS_DB";
const ENV_CACHE_TTL: &str = "SENGOL_CACHE_TTL";

// Default values
const DEFAULT_REDIS_HOST: &str = "127.0.0.1";
const DEFAULT_REDIS_PORT: &str = "6379";
const DEFAULT_REDIS_DB: &str = "0";
const DEFAULT_TTL_SECONDS: u64 = 3600; // 1 hour

const PREFIX_QUESTIONS: &str = "questions:";

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    Connection(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Keyed cache for generated question sets
#[async_trait]
pub trait GenerationCache: Send + Sync {
    async fn get(&self, fingerprint: &str) -> Result<Option<GenerationCacheEntry>, CacheError>;
    async fn put(&self, entry: &GenerationCacheEntry) -> Result<(), CacheError>;
}

/// Redis-backed generation cache
#[derive(Clone)]
pub struct RedisGenerationCache {
    client: Client,
    ttl_seconds: u64,
}

impl RedisGenerationCache {
    /// Create a new cache instance and verify connection
    ///
    /// Configuration via environment variables:
    /// - `SENGOL_REDIS_HOST` - Redis host (default: 127.0.0.1)
    /// - `SENGOL_REDIS_PORT` - Redis port (default: 6379)
    /// - `SENGOL_REDIS_PASSWORD` - Redis password (default: none)
    /// - `SENGOL_REDIS_DB` - Redis database number (default: 0)
    /// - `SENGOL_CACHE_TTL` - Cache TTL in seconds (default: 3600)
    pub async fn new() -> Result<Self, CacheError> {
        let host = env::var(ENV_REDIS_HOST).unwrap_or_else(|_| DEFAULT_REDIS_HOST.to_string());
        let port = env::var(ENV_REDIS_PORT).unwrap_or_else(|_| DEFAULT_REDIS_PORT.to_string());
        let password = env::var(ENV_REDIS_PASSWORD).ok();
        let db = env::var(ENV_REDIS_DB).unwrap_or_else(|_| DEFAULT_REDIS_DB.to_string());

        let ttl_seconds = env::var(ENV_CACHE_TTL)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_TTL_SECONDS);

        // Build Redis URL: redis://[password@]host:port/db
        let redis_url = match password {
            Some(pwd) if !pwd.is_empty() => format!("redis://:{}@{}:{}/{}", pwd, host, port, db),
            _ => format!("redis://{}:{}/{}", host, port, db),
        };

        tracing::debug!(host = %host, port = %port, db = %db, "Connecting to Redis");

        let client = Client::open(redis_url)?;

        // Test the connection by pinging Redis
        let mut conn = client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;

        tracing::info!(host = %host, port = %port, "Redis connection established");

        Ok(Self {
            client,
            ttl_seconds,
        })
    }
}

#[async_trait]
impl GenerationCache for RedisGenerationCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<GenerationCacheEntry>, CacheError> {
        let key = format!("{}{}", PREFIX_QUESTIONS, fingerprint);
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let data: Option<String> = conn.get(&key).await?;

        match data {
            Some(json) => serde_json::from_str(&json)
                .map(Some)
                .map_err(|e| CacheError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn put(&self, entry: &GenerationCacheEntry) -> Result<(), CacheError> {
        let key = format!("{}{}", PREFIX_QUESTIONS, entry.fingerprint);
        let json = serde_json::to_string(entry)
            .map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(&key, json, self.ttl_seconds).await?;

        tracing::debug!(key = %key, ttl = self.ttl_seconds, "Cached generation result");
        Ok(())
    }
}

/// In-process generation cache honoring the same TTL semantics
pub struct MemoryGenerationCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, (Instant, GenerationCacheEntry)>>,
}

impl MemoryGenerationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GenerationCache for MemoryGenerationCache {
    async fn get(&self, fingerprint: &str) -> Result<Option<GenerationCacheEntry>, CacheError> {
        let entries = self.entries.read().expect("cache lock poisoned");
        Ok(entries.get(fingerprint).and_then(|(written, entry)| {
            (written.elapsed() < self.ttl).then(|| entry.clone())
        }))
    }

    async fn put(&self, entry: &GenerationCacheEntry) -> Result<(), CacheError> {
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(entry.fingerprint.clone(), (Instant::now(), entry.clone()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(fingerprint: &str) -> GenerationCacheEntry {
        GenerationCacheEntry {
            fingerprint: fingerprint.to_string(),
            risk_questions: vec![],
            compliance_questions: vec![],
            incident_summary: None,
            generated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn memory_cache_round_trips() {
        let cache = MemoryGenerationCache::new(Duration::from_secs(60));
        cache.put(&entry("fp-1")).await.unwrap();

        let hit = cache.get("fp-1").await.unwrap();
        assert_eq!(hit.unwrap().fingerprint, "fp-1");
        assert!(cache.get("fp-2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let cache = MemoryGenerationCache::new(Duration::ZERO);
        cache.put(&entry("fp-1")).await.unwrap();
        assert!(cache.get("fp-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn puts_are_last_write_wins() {
        let cache = MemoryGenerationCache::new(Duration::from_secs(60));
        let mut first = entry("fp-1");
        first.generated_at = Utc::now();
        cache.put(&first).await.unwrap();

        let second = entry("fp-1");
        cache.put(&second).await.unwrap();

        let hit = cache.get("fp-1").await.unwrap().unwrap();
        assert_eq!(hit.generated_at, second.generated_at);
    }
}
