//! Application state and service initialization
//!
//! This module centralizes all service initialization and dependency injection,
//! making it easier to manage the application lifecycle and test services.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::QuestionCatalog;
use crate::db::repository::AssessmentRepository;
use crate::model::Config;
use crate::service::generator::enrichment::NarrativeEnricher;
use crate::service::{
    DynamicQuestionGenerator, GenerationCache, IncidentSearchService, OpenAiEmbeddingClient,
    QdrantIndexClient, RedisGenerationCache,
};

const ENV_CATALOG_PATH: &str = "SENGOL_CATALOG_PATH";

/// Application state containing all services and shared resources
///
/// This struct centralizes service initialization and makes it easy to inject
/// dependencies into Actix-web handlers.
pub struct AppState {
    /// Database connection pool
    pub db_pool: PgPool,
    /// Generation cache (optional)
    pub cache: Option<Arc<dyn GenerationCache>>,
    /// Incident similarity search service
    pub incident_search: IncidentSearchService,
    /// Evidence-weighted question generator
    pub generator: DynamicQuestionGenerator,
    /// Persisted assessment question sets
    pub repository: AssessmentRepository,
}

impl AppState {
    /// Initialize all services and build application state
    ///
    /// This performs:
    /// 1. Database connection and schema initialization
    /// 2. Redis cache initialization (optional)
    /// 3. Embedding and vector index client construction (requires OPENAI_API_KEY)
    /// 4. Catalog loading and generator construction
    pub async fn new(config: Config) -> Result<Self, AppError> {
        // Initialize PostgreSQL database
        let db_pool = crate::db::create_pool()
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Initialize database schema
        crate::db::init_schema(&db_pool)
            .await
            .map_err(|e| AppError::DatabaseInit(e.to_string()))?;

        // Initialize Redis cache (optional - will log warning if Redis is unavailable)
        let cache: Option<Arc<dyn GenerationCache>> = match RedisGenerationCache::new().await {
            Ok(cache) => {
                tracing::info!("Redis cache enabled");
                Some(Arc::new(cache))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Redis cache unavailable, running without cache");
                None
            }
        };

        // The embedding client and the narrative enricher share one key
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| AppError::MissingConfig("OPENAI_API_KEY"))?;

        let embedder = OpenAiEmbeddingClient::new(config.embedding.clone(), api_key.clone());
        let index = QdrantIndexClient::new(
            config.qdrant.clone(),
            config.embedding.dimensions,
            config.search.max_top_k,
        );

        let incident_search = IncidentSearchService::new(
            Arc::new(embedder),
            Arc::new(index),
            config.search.clone(),
        );

        let catalog = Self::load_catalog()?;
        tracing::info!(
            questions = catalog.len(),
            version = catalog.version(),
            "Question catalog loaded"
        );

        // Narrative enrichment is best effort; a bad key disables it
        let enricher = match NarrativeEnricher::new(&api_key) {
            Ok(enricher) => Some(enricher),
            Err(e) => {
                tracing::warn!(error = %e, "LLM client unavailable, narrative enrichment disabled");
                None
            }
        };

        let mut generator = DynamicQuestionGenerator::new(catalog, incident_search.clone());
        if let Some(cache) = &cache {
            generator = generator.with_cache(Arc::clone(cache));
        }
        if let Some(enricher) = enricher {
            generator = generator.with_enricher(enricher);
        }

        let repository = AssessmentRepository::new(db_pool.clone());

        Ok(Self {
            db_pool,
            cache,
            incident_search,
            generator,
            repository,
        })
    }

    /// Load the question catalog from file when configured, else the builtin bank
    fn load_catalog() -> Result<QuestionCatalog, AppError> {
        match std::env::var(ENV_CATALOG_PATH) {
            Ok(path) => {
                let yaml = std::fs::read_to_string(&path)
                    .map_err(|e| AppError::CatalogInit(format!("{}: {}", path, e)))?;
                QuestionCatalog::from_yaml_str(&yaml)
                    .map_err(|e| AppError::CatalogInit(e.to_string()))
            }
            Err(_) => Ok(QuestionCatalog::builtin()),
        }
    }
}

/// Application-level errors
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AppError {
    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInit(String),

    /// Question catalog failed to load or validate
    #[error("Question catalog initialization failed: {0}")]
    CatalogInit(String),

    /// Missing required configuration
    #[error("Missing required configuration: {0}")]
    MissingConfig(&'static str),
}
