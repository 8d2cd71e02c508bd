use crate::error::EngineError;
use crate::index::{DocId, Posting};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;

/// Key-value abstraction the engine is specified against: term -> postings
/// and doc id -> content.
///
/// The write path is exclusively the builder's; the query engine only reads.
/// A term with no postings list is an absence, not an error.
pub trait IndexStore: Send + Sync {
    fn put_term_postings(&self, term: &str, postings: &[Posting]) -> Result<(), EngineError>;
    fn get_term_postings(&self, term: &str) -> Result<Option<Vec<Posting>>, EngineError>;
    fn put_document(&self, doc_id: DocId, content: &str) -> Result<(), EngineError>;
    fn get_document(&self, doc_id: DocId) -> Result<Option<String>, EngineError>;
    /// Drop all prior contents; invoked at the start of each rebuild.
    fn clear_all(&self) -> Result<(), EngineError>;
}

/// In-process store backed by hash maps. Used by the server's in-place
/// rebuild path and by tests.
#[derive(Default)]
pub struct MemoryStore {
    terms: RwLock<HashMap<String, Vec<Posting>>>,
    docs: RwLock<HashMap<DocId, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All indexed terms, sorted. Introspection for tests and tooling.
    pub fn terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.terms.read().keys().cloned().collect();
        terms.sort();
        terms
    }
}

impl IndexStore for MemoryStore {
    fn put_term_postings(&self, term: &str, postings: &[Posting]) -> Result<(), EngineError> {
        self.terms.write().insert(term.to_string(), postings.to_vec());
        Ok(())
    }

    fn get_term_postings(&self, term: &str) -> Result<Option<Vec<Posting>>, EngineError> {
        Ok(self.terms.read().get(term).cloned())
    }

    fn put_document(&self, doc_id: DocId, content: &str) -> Result<(), EngineError> {
        self.docs.write().insert(doc_id, content.to_string());
        Ok(())
    }

    fn get_document(&self, doc_id: DocId) -> Result<Option<String>, EngineError> {
        Ok(self.docs.read().get(&doc_id).cloned())
    }

    fn clear_all(&self) -> Result<(), EngineError> {
        self.terms.write().clear();
        self.docs.write().clear();
        Ok(())
    }
}

/// Durable store over a sled directory: a `terms` tree of bincode-encoded
/// postings lists and a `docs` tree keyed by big-endian doc id.
///
/// Every sled or codec failure surfaces as the retryable
/// [`EngineError::StoreUnavailable`].
pub struct SledStore {
    db: sled::Db,
    terms: sled::Tree,
    docs: sled::Tree,
}

impl SledStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let db = sled::open(path)?;
        let terms = db.open_tree("terms")?;
        let docs = db.open_tree("docs")?;
        Ok(Self { db, terms, docs })
    }

    /// Flush outstanding writes to disk. The indexer calls this once after
    /// a build so a crash cannot leave a torn index behind.
    pub fn flush(&self) -> Result<(), EngineError> {
        self.db.flush()?;
        Ok(())
    }
}

impl IndexStore for SledStore {
    fn put_term_postings(&self, term: &str, postings: &[Posting]) -> Result<(), EngineError> {
        let bytes = bincode::serialize(postings)?;
        self.terms.insert(term.as_bytes(), bytes)?;
        Ok(())
    }

    fn get_term_postings(&self, term: &str) -> Result<Option<Vec<Posting>>, EngineError> {
        match self.terms.get(term.as_bytes())? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_document(&self, doc_id: DocId, content: &str) -> Result<(), EngineError> {
        self.docs.insert(doc_id.to_be_bytes(), content.as_bytes())?;
        Ok(())
    }

    fn get_document(&self, doc_id: DocId) -> Result<Option<String>, EngineError> {
        match self.docs.get(doc_id.to_be_bytes())? {
            Some(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
            None => Ok(None),
        }
    }

    fn clear_all(&self) -> Result<(), EngineError> {
        self.terms.clear()?;
        self.docs.clear()?;
        Ok(())
    }
}
