//! Word-overlap relevance scoring, independent of embeddings.

/// Split a query into lowercase words strictly longer than `min_len`.
///
/// Short words (articles, prepositions) carry no lexical signal and would
/// otherwise make every chunk "match".
pub fn query_words(query: &str, min_len: usize) -> Vec<String> {
    query
        .split_whitespace()
        .map(|word| word.trim().to_lowercase())
        .filter(|word| word.chars().count() > min_len)
        .collect()
}

/// Count how many query words occur in the chunk (case-insensitive
/// substring match). The chunk text must already be lowercased.
pub fn match_count(chunk_lower: &str, words: &[String]) -> usize {
    words
        .iter()
        .filter(|word| chunk_lower.contains(word.as_str()))
        .count()
}
