//! Coherent excerpt construction: contiguous-chunk merging and preview
//! windowing.

use super::ScoredChunk;

/// Marker inserted between non-adjacent chunks in a merged excerpt.
pub const GAP_MARKER: &str = "\n[...]\n";

/// Ellipsis marker prefixed/suffixed when a preview window cuts text.
pub const ELLIPSIS: &str = "...";

/// Merge a document's selected chunks into one coherent excerpt.
///
/// Chunks are walked in chunk-index order: an index exactly one past the
/// previous chunk's concatenates directly (the text was contiguous in the
/// source document); any larger jump inserts [`GAP_MARKER`] so the reader
/// can see material was skipped.
pub fn merge_contiguous(chunks: &[ScoredChunk]) -> String {
    let mut ordered: Vec<&ScoredChunk> = chunks.iter().collect();
    ordered.sort_by_key(|chunk| chunk.chunk_index);

    let mut excerpt = String::new();
    let mut prev_index: Option<u32> = None;
    for chunk in ordered {
        if let Some(prev) = prev_index
            && chunk.chunk_index != prev + 1
        {
            excerpt.push_str(GAP_MARKER);
        }
        excerpt.push_str(&chunk.content);
        prev_index = Some(chunk.chunk_index);
    }
    excerpt
}

/// Window a long excerpt around the earliest query-word occurrence.
///
/// The window keeps `lead_in` characters before the first match and extends
/// to `max_len` characters total; sides that were cut get an ellipsis. With
/// no query-word occurrence the leading `max_len` characters are kept.
/// Lengths are in characters, not bytes, so multi-byte text never splits.
pub fn preview_window(excerpt: &str, words: &[String], max_len: usize, lead_in: usize) -> String {
    let chars: Vec<char> = excerpt.chars().collect();
    if chars.len() <= max_len {
        return excerpt.to_string();
    }

    let lowered = lower_chars(&chars);
    let earliest = words
        .iter()
        .filter_map(|word| {
            let needle: Vec<char> = word.chars().collect();
            find_chars(&lowered, &needle)
        })
        .min();

    match earliest {
        Some(pos) => {
            let start = pos.saturating_sub(lead_in);
            let end = (start + max_len).min(chars.len());
            let mut preview = String::new();
            if start > 0 {
                preview.push_str(ELLIPSIS);
            }
            preview.extend(&chars[start..end]);
            if end < chars.len() {
                preview.push_str(ELLIPSIS);
            }
            preview
        }
        None => {
            let mut preview: String = chars[..max_len].iter().collect();
            preview.push_str(ELLIPSIS);
            preview
        }
    }
}

// 1:1 per-character lowering keeps positions aligned with the original.
fn lower_chars(chars: &[char]) -> Vec<char> {
    chars
        .iter()
        .map(|c| c.to_lowercase().next().unwrap_or(*c))
        .collect()
}

fn find_chars(haystack: &[char], needle: &[char]) -> Option<usize> {
    if needle.is_empty() || needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
