pub mod config;
pub mod incident;
pub mod question;

pub use config::{Config, EmbeddingConfig, QdrantConfig, SearchConfig};
pub use incident::*;
pub use question::*;
