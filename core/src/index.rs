use crate::builder::{build_index, BuildStats};
use crate::error::EngineError;
use crate::ngram::expand;
use crate::query::{search, SearchHit};
use crate::store::IndexStore;
use crate::tokenizer::tokenize;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Caller-assigned document id, stable across rebuilds. Ids start at 1.
pub type DocId = u32;

/// One entry in a term's postings list: the weight of that term in one
/// document, plus the term's corpus-wide vocabulary position (metadata, not
/// used in scoring).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub tf_idf: f64,
    pub vocabulary_position: u32,
}

/// A validated document: raw text plus its normalized token sequence.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: DocId,
    pub raw_text: String,
    pub tokens: Vec<String>,
}

impl Document {
    pub fn new(id: DocId, raw_text: impl Into<String>) -> Result<Self, EngineError> {
        if id == 0 {
            return Err(EngineError::InvalidDocument {
                doc_id: id,
                reason: "ids start at 1",
            });
        }
        let raw_text = raw_text.into();
        let tokens = tokenize(&raw_text);
        Ok(Self { id, raw_text, tokens })
    }

    /// The document's full n-gram multiset.
    pub fn terms(&self) -> Vec<String> {
        expand(&self.tokens)
    }
}

/// Insertion-ordered assignment of term -> position. Positions are handed
/// out monotonically from 0 as terms are first sighted and never reused
/// within one build.
#[derive(Debug, Default)]
pub struct Vocabulary {
    positions: HashMap<String, u32>,
    next: u32,
}

impl Vocabulary {
    pub fn position(&self, term: &str) -> Option<u32> {
        self.positions.get(term).copied()
    }

    /// Return the term's position, assigning the next free one on first
    /// sighting.
    pub fn position_or_assign(&mut self, term: &str) -> u32 {
        if let Some(&pos) = self.positions.get(term) {
            return pos;
        }
        let pos = self.next;
        self.next += 1;
        self.positions.insert(term.to_string(), pos);
        pos
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// A fully built, read-only index generation over some [`IndexStore`].
pub struct SearchIndex {
    store: Arc<dyn IndexStore>,
}

impl SearchIndex {
    /// Wrap a store that already holds a completed build (e.g. a sled
    /// directory written by the indexer binary).
    pub fn open(store: Arc<dyn IndexStore>) -> Self {
        Self { store }
    }

    /// Run a full build into `store` from an ordered document sequence and
    /// return the resulting index generation.
    pub fn build(
        store: Arc<dyn IndexStore>,
        corpus: &[(DocId, String)],
    ) -> Result<(Self, BuildStats), EngineError> {
        let stats = build_index(store.as_ref(), corpus)?;
        Ok((Self { store }, stats))
    }

    /// Rank documents against a free-text query by cosine similarity.
    pub fn search(&self, query_text: &str) -> Result<Vec<SearchHit>, EngineError> {
        search(self.store.as_ref(), query_text)
    }

    /// Stored content for one document, `None` if the id was never indexed.
    pub fn document(&self, doc_id: DocId) -> Result<Option<String>, EngineError> {
        self.store.get_document(doc_id)
    }
}

/// Shared handle over the current index generation.
///
/// A rebuild constructs a complete [`SearchIndex`] off to the side and then
/// [`publish`](IndexHandle::publish)es it; readers clone the `Arc` under a
/// short read lock and keep querying the generation they grabbed. Nobody
/// ever sees a half-built index.
pub struct IndexHandle {
    current: RwLock<Arc<SearchIndex>>,
}

impl IndexHandle {
    pub fn new(index: SearchIndex) -> Self {
        Self {
            current: RwLock::new(Arc::new(index)),
        }
    }

    /// The current generation, pinned for the caller's lifetime of use.
    pub fn snapshot(&self) -> Arc<SearchIndex> {
        self.current.read().clone()
    }

    /// Atomically replace the published generation.
    pub fn publish(&self, index: SearchIndex) {
        *self.current.write() = Arc::new(index);
    }
}
