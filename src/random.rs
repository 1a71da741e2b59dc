//! Seed plumbing for everything that must replay identically.
//!
//! The room seed is fixed at setup and never re-seeded. Every randomized step
//! (theme draws, deck shuffles) derives a local seed by mixing the room seed
//! with a salt, so each step is distinct but fully reproducible from the room
//! seed alone. No wall-clock or host entropy below `fresh_room_seed`.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};

/// Mix a room seed with a salt (round number, fixed offset, card count)
/// into a local seed. splitmix64 finalizer, so small salts still land far
/// apart in seed space.
pub fn mix_seed(seed: u64, salt: u64) -> u64 {
    let mut z = seed ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Shuffle in place, deterministically for a given seed.
pub fn seeded_shuffle<T>(items: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);
}

/// Pick one element, deterministically for a given seed.
pub fn seeded_pick<T>(items: &[T], seed: u64) -> Option<&T> {
    let mut rng = StdRng::seed_from_u64(seed);
    items.choose(&mut rng)
}

/// Mint a fresh 31-bit room seed. The only host-entropy call in the crate;
/// used once at setup when the driver didn't supply an explicit seed.
pub fn fresh_room_seed() -> u64 {
    rand::rng().random_range(0..(1u64 << 31))
}
