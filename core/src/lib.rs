//! termspace-core: an n-gram TF-IDF vector-space retrieval engine.
//!
//! Documents are normalized into lowercase alphanumeric tokens, expanded into
//! unigrams/bigrams/trigrams, and weighted with smoothed TF-IDF over two
//! passes. Postings live behind the [`IndexStore`] abstraction (in-memory or
//! sled-backed); queries are ranked by cosine similarity against the stored
//! document weights.
//!
//! A build writes a complete index before anyone reads it; [`IndexHandle`]
//! swaps fully built snapshots atomically so readers never observe a partial
//! rebuild.

pub mod builder;
pub mod error;
pub mod index;
pub mod ngram;
pub mod query;
pub mod store;
pub mod tokenizer;

pub use builder::{build_index, BuildStats};
pub use error::EngineError;
pub use index::{DocId, Document, IndexHandle, Posting, SearchIndex, Vocabulary};
pub use query::{search, SearchHit};
pub use store::{IndexStore, MemoryStore, SledStore};
