//! Splitting long transcripts into overlapping, sentence-aligned chunks.
//!
//! Sizes are estimated at four characters per token. Sentences are found with
//! the literal separator `". "`, so abbreviations and decimals followed by a
//! space also end a sentence. A single sentence longer than the budget is kept
//! whole and may exceed it.

use log::debug;

pub const CHARS_PER_TOKEN: usize = 4;
pub const DEFAULT_CHUNK_TOKENS: usize = 2500;
pub const DEFAULT_OVERLAP_TOKENS: usize = 100;
pub const DEFAULT_CHUNKING_THRESHOLD: usize = 6000;

const SENTENCE_SEPARATOR: &str = ". ";

pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count() / CHARS_PER_TOKEN
}

pub fn needs_chunking(text: &str, max_tokens: usize) -> bool {
    estimate_tokens(text) > max_tokens
}

pub fn chunk_text(text: &str, max_tokens: usize, overlap_tokens: usize) -> Vec<String> {
    let max_chars = max_tokens * CHARS_PER_TOKEN;
    let overlap_chars = overlap_tokens * CHARS_PER_TOKEN;

    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;

    for sentence in sentences(text) {
        let sentence_chars = sentence.chars().count();

        if current_chars + sentence_chars > max_chars && !current.is_empty() {
            chunks.push(current.trim().to_string());

            let overlap = tail_chars(&current, overlap_chars).to_string();
            current_chars = overlap.chars().count() + sentence_chars;
            current = overlap;
            current.push_str(sentence);
        } else {
            current.push_str(sentence);
            current_chars += sentence_chars;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }

    debug!(
        "Split {} characters into {} chunks (max {} chars, overlap {} chars)",
        text.chars().count(),
        chunks.len(),
        max_chars,
        overlap_chars
    );

    chunks
}

/// Splits with the default budget of 2500 tokens and 100 tokens of overlap.
pub fn chunk_text_with_defaults(text: &str) -> Vec<String> {
    chunk_text(text, DEFAULT_CHUNK_TOKENS, DEFAULT_OVERLAP_TOKENS)
}

/// Pieces between separators, each still carrying the `". "` that followed it.
fn sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split_inclusive(SENTENCE_SEPARATOR)
}

fn tail_chars(text: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match text.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
