/// Expand a token sequence into unigrams, bigrams, and trigrams.
///
/// The result is a multiset: duplicates are meaningful and feed term
/// frequency counts. Order is fixed (all unigrams in token order, then
/// bigrams, then trigrams by starting position) so vocabulary positions are
/// assigned reproducibly. Fewer than two tokens emit no bigrams, fewer than
/// three no trigrams.
pub fn expand(tokens: &[String]) -> Vec<String> {
    let mut terms: Vec<String> = tokens.to_vec();
    for pair in tokens.windows(2) {
        terms.push(pair.join(" "));
    }
    for triple in tokens.windows(3) {
        terms.push(triple.join(" "));
    }
    terms
}
