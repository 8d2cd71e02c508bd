use crate::error::EngineError;
use crate::index::{DocId, Document, Posting, Vocabulary};
use crate::store::IndexStore;
use std::collections::{HashMap, HashSet};

/// Outcome of one full build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Documents accepted and indexed.
    pub indexed: u32,
    /// Documents rejected for an invalid or duplicate id.
    pub rejected: u32,
    /// Distinct terms in the vocabulary.
    pub terms: u32,
}

/// Build the inverted index wholesale from an ordered document sequence.
///
/// Two passes over the same ingestion order: pass 1 counts per-term document
/// frequency, pass 2 computes smoothed TF-IDF weights, assigns vocabulary
/// positions at first sighting, and accumulates postings. The finished index
/// is then written through the store in one sweep, after `clear_all`.
///
/// Within a document, distinct terms are processed in first-occurrence order
/// of the n-gram expansion, so two builds from the same input produce
/// byte-identical postings lists.
///
/// Documents with a zero or duplicate id are rejected individually (logged
/// at warn) without aborting the build.
pub fn build_index(
    store: &dyn IndexStore,
    corpus: &[(DocId, String)],
) -> Result<BuildStats, EngineError> {
    store.clear_all()?;

    let mut docs: Vec<Document> = Vec::with_capacity(corpus.len());
    let mut seen_ids: HashSet<DocId> = HashSet::new();
    let mut rejected = 0u32;
    for (id, text) in corpus {
        let doc = match Document::new(*id, text.clone()) {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(doc_id = *id, %err, "rejecting document");
                rejected += 1;
                continue;
            }
        };
        if !seen_ids.insert(doc.id) {
            tracing::warn!(doc_id = doc.id, "rejecting document: duplicate id");
            rejected += 1;
            continue;
        }
        docs.push(doc);
    }
    let num_docs = docs.len();

    // Pass 1: document frequency. One increment per document per term,
    // however often the term repeats inside the document.
    let mut df: HashMap<String, u32> = HashMap::new();
    for doc in &docs {
        let distinct: HashSet<String> = doc.terms().into_iter().collect();
        for term in distinct {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    // Pass 2: weights, vocabulary positions, postings.
    let mut vocabulary = Vocabulary::default();
    let mut postings: HashMap<String, Vec<Posting>> = HashMap::new();
    for doc in &docs {
        let terms = doc.terms();
        let mut freq: HashMap<&str, u32> = HashMap::new();
        for term in &terms {
            *freq.entry(term.as_str()).or_insert(0) += 1;
        }
        // Walk terms in first-occurrence order, once each.
        let mut handled: HashSet<&str> = HashSet::new();
        for term in &terms {
            if !handled.insert(term.as_str()) {
                continue;
            }
            let f = freq[term.as_str()];
            let df_t = *df.get(term.as_str()).ok_or(
                EngineError::InternalInvariantViolation("term missing from pass-1 counts"),
            )?;
            let weight = tf_idf(f, df_t, num_docs)?;
            let position = vocabulary.position_or_assign(term);
            let plist = postings.entry(term.clone()).or_default();
            // Idempotent per (term, doc_id): re-adding is a no-op.
            if plist.iter().all(|p| p.doc_id != doc.id) {
                plist.push(Posting {
                    doc_id: doc.id,
                    tf_idf: weight,
                    vocabulary_position: position,
                });
            }
        }
    }

    for doc in &docs {
        store.put_document(doc.id, &doc.raw_text)?;
    }
    let num_terms = postings.len() as u32;
    for (term, plist) in &postings {
        store.put_term_postings(term, plist)?;
    }

    tracing::info!(
        num_docs,
        num_terms,
        rejected,
        "index build complete"
    );
    Ok(BuildStats {
        indexed: num_docs as u32,
        rejected,
        terms: num_terms,
    })
}

/// Smoothed TF-IDF: `tf = 1 + ln f`, `idf = ln(N / (df + 1)) + 1`.
///
/// The `+1` in the denominator keeps the log argument finite and positive
/// for every reachable input; `f >= 1` and `df >= 1` hold by construction
/// for any term this is called on, and the guard turns a violation into a
/// signal instead of a NaN.
fn tf_idf(f: u32, df: u32, num_docs: usize) -> Result<f64, EngineError> {
    if num_docs == 0 || f == 0 || df == 0 {
        return Err(EngineError::InternalInvariantViolation(
            "tf-idf requires a nonempty corpus and f, df >= 1",
        ));
    }
    let tf = 1.0 + (f as f64).ln();
    let idf = (num_docs as f64 / (df as f64 + 1.0)).ln() + 1.0;
    Ok(tf * idf)
}
