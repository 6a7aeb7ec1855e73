//! Order randomizer
//!
//! Shuffling reassigns sequence positions, and with them the keys and the
//! label fields written downstream.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Uniformly permutes `records` in place.
///
/// With a seed the permutation is reproducible across runs; without one the
/// thread RNG is used.
pub fn shuffle_records<T>(records: &mut [T], seed: Option<u64>) {
    match seed {
        Some(seed) => records.shuffle(&mut StdRng::seed_from_u64(seed)),
        None => records.shuffle(&mut rand::thread_rng()),
    }
}
