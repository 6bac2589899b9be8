//! Fisher-Yates Shuffle
//!
//! Uniform random permutation. Callers that need reproducible output pass a
//! seeded generator (`ChaCha8Rng::seed_from_u64`); production code uses the
//! thread-local OS-seeded generator.

use rand::Rng;

/// Shuffle `items` in place.
pub fn shuffle_in_place<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}

/// Shuffled copy of `items` using the supplied generator.
pub fn shuffle_with<T: Clone, R: Rng + ?Sized>(items: &[T], rng: &mut R) -> Vec<T> {
    let mut shuffled = items.to_vec();
    shuffle_in_place(&mut shuffled, rng);
    shuffled
}

/// Shuffled copy of `items`.
pub fn shuffle<T: Clone>(items: &[T]) -> Vec<T> {
    shuffle_with(items, &mut rand::thread_rng())
}
