//! Practice Set Builder
//!
//! Builds the word sequence for one session: every base word once, plus up to
//! [`MAX_EXTRA_OCCURRENCES`] extra copies of each struggling word (one per
//! recorded mistake), shuffled and cut to the requested length.
//!
//! When the requested length exceeds the weighted pool the whole pool is
//! returned, so a session may repeat a struggling word while skipping none of
//! the others; when it is shorter, some base words may be left out entirely.

use std::collections::HashMap;

use rand::Rng;

use crate::shuffle::shuffle_in_place;
use crate::types::{MasteryRecord, Word, MAX_EXTRA_OCCURRENCES};

/// Extra copies a word with `mistake_count` misses gets.
pub fn extra_occurrences(mistake_count: u32) -> u32 {
    mistake_count.min(MAX_EXTRA_OCCURRENCES)
}

/// Pre-shuffle multiset: base words in order, followed by the extra copies.
///
/// A record applies to a base word when its `word_id` is the word's id or the
/// word's source id (pool copies). Records for words outside `base_words` are ignored.
pub fn weighted_pool(base_words: &[Word], mastery: &[MasteryRecord]) -> Vec<Word> {
    let mistakes: HashMap<&str, u32> = mastery
        .iter()
        .map(|record| (record.word_id.as_str(), record.mistake_count))
        .collect();

    let mut pool = base_words.to_vec();
    for word in base_words {
        let count = mistakes
            .get(word.id.as_str())
            .or_else(|| {
                word.source_word_id
                    .as_deref()
                    .and_then(|source| mistakes.get(source))
            })
            .copied()
            .unwrap_or(0);
        for _ in 0..extra_occurrences(count) {
            pool.push(word.clone());
        }
    }
    pool
}

/// Session sequence using the supplied generator.
pub fn build_session_with<R: Rng + ?Sized>(
    base_words: &[Word],
    mastery: &[MasteryRecord],
    max_words: usize,
    rng: &mut R,
) -> Vec<Word> {
    let mut pool = weighted_pool(base_words, mastery);
    shuffle_in_place(&mut pool, rng);
    pool.truncate(max_words);
    pool
}

/// Session sequence. Call again for a differently ordered session.
pub fn build_session(base_words: &[Word], mastery: &[MasteryRecord], max_words: usize) -> Vec<Word> {
    build_session_with(base_words, mastery, max_words, &mut rand::thread_rng())
}
