pub mod cache;
pub mod embedding;
pub mod generator;
pub mod incident_search;
pub mod retry;
pub mod vector_index;

pub use cache::{GenerationCache, MemoryGenerationCache, RedisGenerationCache};
pub use embedding::OpenAiEmbeddingClient;
pub use generator::DynamicQuestionGenerator;
pub use incident_search::IncidentSearchService;
pub use vector_index::QdrantIndexClient;
