//! In-memory hybrid retrieval.
//!
//! - [`scoring`]: tokenization, keyword overlap, cosine similarity
//! - [`HashingEmbedder`]: deterministic feature-hashing embeddings
//! - [`KnowledgeBase`]: [`RetrievalPort`](counsel_application::RetrievalPort)
//!   over the embedding-carrying entities of the record store

mod embedder;
mod knowledge;
pub mod scoring;

pub use embedder::HashingEmbedder;
pub use knowledge::{KnowledgeBase, KnowledgeCollection};
