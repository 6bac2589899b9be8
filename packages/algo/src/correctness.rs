//! Spelling Correctness
//!
//! An answer is correct when it equals the target after both are case-folded
//! and stripped of surrounding whitespace. No partial credit.

/// Normalized form used for comparison.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Whether `input` spells `target`. Pure and total.
pub fn is_correct(input: &str, target: &str) -> bool {
    normalize(input) == normalize(target)
}
