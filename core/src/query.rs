use crate::error::EngineError;
use crate::index::{DocId, Posting};
use crate::ngram::expand;
use crate::store::IndexStore;
use crate::tokenizer::tokenize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// One ranked result: the stored document content and its cosine score,
/// rounded to 2 decimal places.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub content: String,
    pub score: f64,
}

/// Rank documents against a free-text query.
///
/// The query is tokenized and n-gram-expanded exactly like documents were.
/// Candidates are the union of doc ids across the postings of every distinct
/// query term, in discovery order. Each candidate is scored by cosine
/// similarity between a query vector (weight 1.0 per distinct query term
/// known to the index) and the document's own stored weights over its own
/// terms. Ties after rounding keep discovery order.
///
/// An empty or entirely-unknown query returns an empty list, not an error.
/// Postings are fetched at most once per term per call, shared between
/// candidate generation and vector construction.
pub fn search(store: &dyn IndexStore, query_text: &str) -> Result<Vec<SearchHit>, EngineError> {
    let expanded = expand(&tokenize(query_text));
    if expanded.is_empty() {
        return Ok(Vec::new());
    }

    // Distinct query terms in first-occurrence order.
    let mut query_terms: Vec<String> = Vec::new();
    let mut seen_terms: HashSet<&str> = HashSet::new();
    for term in &expanded {
        if seen_terms.insert(term.as_str()) {
            query_terms.push(term.clone());
        }
    }

    let mut cache = PostingsCache::default();

    // Candidate union, in discovery order.
    let mut candidates: Vec<DocId> = Vec::new();
    let mut seen_docs: HashSet<DocId> = HashSet::new();
    for term in &query_terms {
        if let Some(plist) = cache.fetch(store, term)? {
            for posting in plist {
                if seen_docs.insert(posting.doc_id) {
                    candidates.push(posting.doc_id);
                }
            }
        }
    }

    // Query vector: weight 1.0 per distinct query term that exists anywhere
    // in the index. Unknown terms are omitted, so the norm only covers terms
    // actually placed in the vector.
    let indexed_query_terms: Vec<String> = query_terms
        .iter()
        .filter(|t| cache.is_indexed(t))
        .cloned()
        .collect();
    let query_norm = (indexed_query_terms.len() as f64).sqrt();

    let mut hits: Vec<SearchHit> = Vec::new();
    for doc_id in candidates {
        let content = store.get_document(doc_id)?.ok_or_else(|| {
            tracing::error!(doc_id, "posting references a document missing from the store");
            EngineError::NotFound { doc_id }
        })?;

        // Document vector: the document's own stored weights, restricted to
        // its own n-gram terms. Weights come from the postings lists, not a
        // recomputation.
        let doc_terms = expand(&tokenize(&content));
        let mut doc_vector: HashMap<&str, f64> = HashMap::new();
        let mut handled: HashSet<&str> = HashSet::new();
        for term in &doc_terms {
            if !handled.insert(term.as_str()) {
                continue;
            }
            if let Some(plist) = cache.fetch(store, term)? {
                if let Some(p) = plist.iter().find(|p| p.doc_id == doc_id) {
                    doc_vector.insert(term.as_str(), p.tf_idf);
                }
            }
        }

        // Query weights are all 1.0; terms present only in the document
        // vector multiply against 0 and drop out of the dot product.
        let dot: f64 = indexed_query_terms
            .iter()
            .filter_map(|t| doc_vector.get(t.as_str()))
            .sum();
        let doc_norm = doc_vector
            .values()
            .map(|w| w * w)
            .sum::<f64>()
            .sqrt();
        if query_norm * doc_norm > 0.0 {
            let score = (dot / (query_norm * doc_norm) * 100.0).round() / 100.0;
            hits.push(SearchHit {
                doc_id,
                content,
                score,
            });
        }
    }

    // Stable sort: equal rounded scores keep discovery order.
    hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    Ok(hits)
}

/// Per-search postings cache so each term hits the store at most once,
/// however many candidates re-reference it.
#[derive(Default)]
struct PostingsCache {
    entries: HashMap<String, Option<Vec<Posting>>>,
}

impl PostingsCache {
    fn fetch(
        &mut self,
        store: &dyn IndexStore,
        term: &str,
    ) -> Result<Option<&[Posting]>, EngineError> {
        if !self.entries.contains_key(term) {
            let fetched = store.get_term_postings(term)?;
            self.entries.insert(term.to_string(), fetched);
        }
        Ok(self.entries[term].as_deref())
    }

    fn is_indexed(&self, term: &str) -> bool {
        matches!(self.entries.get(term), Some(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_index;
    use crate::store::MemoryStore;

    fn built(texts: &[&str]) -> MemoryStore {
        let store = MemoryStore::new();
        let corpus: Vec<(DocId, String)> = texts
            .iter()
            .enumerate()
            .map(|(i, t)| (i as DocId + 1, t.to_string()))
            .collect();
        build_index(&store, &corpus).unwrap();
        store
    }

    #[test]
    fn empty_query_is_not_an_error() {
        let store = built(&["some document"]);
        assert!(search(&store, "").unwrap().is_empty());
        assert!(search(&store, "   ?!.  ").unwrap().is_empty());
    }

    #[test]
    fn unknown_terms_contribute_no_candidates() {
        let store = built(&["some document"]);
        assert!(search(&store, "zebra quagga").unwrap().is_empty());
    }

    #[test]
    fn scores_are_rounded_and_bounded() {
        let store = built(&["red fish", "blue fish", "red red herring"]);
        let hits = search(&store, "red fish").unwrap();
        assert_eq!(hits.len(), 3);
        for hit in &hits {
            assert!(hit.score > 0.0 && hit.score <= 1.0);
            // Already rounded: re-rounding must be a no-op.
            assert_eq!((hit.score * 100.0).round() / 100.0, hit.score);
        }
        // "red fish" matches doc 1 on both words plus the bigram.
        assert_eq!(hits[0].doc_id, 1);
    }

    #[test]
    fn results_are_sorted_descending() {
        let store = built(&["shared term", "shared term shared", "unrelated text"]);
        let hits = search(&store, "shared").unwrap();
        assert_eq!(hits.len(), 2);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn notfound_is_surfaced_when_postings_dangle() {
        // Hand-assemble a store whose posting points at a missing document.
        let store = MemoryStore::new();
        store
            .put_term_postings(
                "ghost",
                &[Posting {
                    doc_id: 9,
                    tf_idf: 1.0,
                    vocabulary_position: 0,
                }],
            )
            .unwrap();
        let err = search(&store, "ghost").unwrap_err();
        assert!(matches!(err, EngineError::NotFound { doc_id: 9 }));
    }
}
