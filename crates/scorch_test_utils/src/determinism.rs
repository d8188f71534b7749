//! Determinism testing utilities.
//!
//! Provides a harness for verifying that duels produce identical results
//! given identical inputs.
//!
//! # Testing Strategy
//!
//! Every participant of a match renders the terrain from the seed alone, so
//! any divergence is a desync. Sources of non-determinism include:
//!
//! - **Terrain arithmetic**: generation runs on [`scorch_core::math::Fixed`]
//!   and a pure per-column hash, never a random stream.
//!
//! - **Unseeded randomness**: spawn x and CPU jitter come from an owned RNG.
//!   Tests seed it through [`Duel::with_rng`] or pin spawns through
//!   [`Duel::from_layout`].
//!
//! - **Iteration order**: combatants are always visited in registration
//!   order.
//!
//! # Test Levels
//!
//! 1. **Unit tests**: individual component determinism (terrain, flight)
//! 2. **Property tests**: random inputs must still produce deterministic outputs
//! 3. **Integration tests**: full matches are reproducible and replayable
//! 4. **Parallel tests**: running N duels on threads all match

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use scorch_core::duel::Duel;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of steps run.
    pub steps: u64,
}

impl DeterminismResult {
    /// Get all unique hashes (should be 1 for a deterministic run).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that the runs were deterministic, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Duel is non-deterministic!\n\
                 Runs: {}\n\
                 Steps: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine multiple times and verify determinism.
///
/// # Arguments
///
/// * `runs` - Number of times to run
/// * `steps` - Number of steps per run
/// * `setup` - Function to create initial state
/// * `step` - Function to advance the state by one step
/// * `hash` - Function to compute state hash
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for _ in 0..steps {
            step(&mut state);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Play one CPU turn if the match is still running.
pub fn play_turn(duel: &mut Duel) {
    if !duel.is_over() {
        if let Err(rejection) = duel.run_cpu_turn() {
            tracing::warn!(%rejection, "Turn rejected during determinism run");
        }
    }
}

/// Run the same duel twice for `turns` CPU turns and compare final hashes.
///
/// The setup must seed the duel's RNG, otherwise CPU jitter differs
/// between runs by construction.
pub fn verify_duel_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> Duel,
{
    verify_determinism(2, turns, &setup_fn, play_turn, Duel::state_hash).is_deterministic
}

/// Result of parallel duel runs.
#[derive(Debug, Clone)]
pub struct ParallelRunResult {
    /// Final state hash from each duel.
    pub hashes: Vec<u64>,
    /// Number of turns each duel ran.
    pub turns: u64,
}

impl ParallelRunResult {
    /// Check if all duels produced identical results.
    #[must_use]
    pub fn is_deterministic(&self) -> bool {
        self.hashes.windows(2).all(|w| w[0] == w[1])
    }
}

/// Run N duels on scoped threads and collect final hashes.
///
/// # Panics
///
/// Panics if a worker thread panics.
pub fn run_parallel_duels<F>(setup_fn: F, num_duels: usize, turns: u64) -> ParallelRunResult
where
    F: Fn() -> Duel + Sync,
{
    let hashes = thread::scope(|s| {
        let handles: Vec<_> = (0..num_duels)
            .map(|_| {
                s.spawn(|| {
                    let mut duel = setup_fn();
                    for _ in 0..turns {
                        play_turn(&mut duel);
                    }
                    duel.state_hash()
                })
            })
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    ParallelRunResult { hashes, turns }
}

/// Compare two duel runs turn-by-turn, finding the first divergence.
///
/// # Returns
///
/// `None` if the runs stay identical, `Some(turn)` at the first turn whose
/// hashes differ (0 for the initial state).
pub fn find_first_divergence<F>(setup_fn: F, turns: u64) -> Option<u64>
where
    F: Fn() -> Duel,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for turn in 1..=turns {
        play_turn(&mut a);
        play_turn(&mut b);

        if a.state_hash() != b.state_hash() {
            tracing::warn!(turn, "Duels diverged");
            return Some(turn);
        }
    }

    None
}

/// Verify that a serialization round trip preserves the state hash.
pub fn verify_serialization_determinism<F>(setup_fn: F, turns: u64) -> bool
where
    F: Fn() -> Duel,
{
    let mut duel = setup_fn();
    for _ in 0..turns {
        play_turn(&mut duel);
    }

    let hash_before = duel.state_hash();

    let Ok(bytes) = duel.serialize() else {
        return false;
    };
    let Ok(restored) = Duel::deserialize(&bytes) else {
        return false;
    };

    hash_before == restored.state_hash()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for determinism testing.
pub mod strategies {
    use proptest::prelude::*;
    use scorch_core::math::Point;

    /// Any terrain seed.
    pub fn arb_seed() -> impl Strategy<Value = u64> {
        any::<u64>()
    }

    /// Field sizes small enough for fast property runs.
    pub fn arb_field_size() -> impl Strategy<Value = (u32, u32)> {
        (16u32..320, 16u32..240)
    }

    /// Angles including out-of-range values to exercise clamping.
    pub fn arb_angle() -> impl Strategy<Value = f64> {
        -45.0f64..225.0
    }

    /// Powers including out-of-range values to exercise clamping.
    pub fn arb_power() -> impl Strategy<Value = f64> {
        0.0f64..200.0
    }

    /// A point anywhere in (and slightly around) a `width x height` field.
    pub fn arb_point(width: u32, height: u32) -> impl Strategy<Value = Point> {
        let w = f64::from(width);
        let h = f64::from(height);
        (-20.0..w + 20.0, -20.0..h + 20.0).prop_map(|(x, y)| Point::new(x, y))
    }

    /// An erosion: center and radius.
    pub fn arb_erosion(width: u32, height: u32) -> impl Strategy<Value = (Point, f64)> {
        (arb_point(width, height), 0.0f64..60.0)
    }

    /// A sequence of erosions.
    pub fn arb_erosions(
        width: u32,
        height: u32,
        max_len: usize,
    ) -> impl Strategy<Value = Vec<(Point, f64)>> {
        proptest::collection::vec(arb_erosion(width, height), 0..max_len)
    }

    /// Alive flags for a roster of 2 to 4 combatants.
    pub fn arb_alive_mask() -> impl Strategy<Value = Vec<bool>> {
        proptest::collection::vec(any::<bool>(), 2..=4)
    }

    /// A sequence of `(angle, power)` aims.
    pub fn arb_aims(max_len: usize) -> impl Strategy<Value = Vec<(f64, f64)>> {
        proptest::collection::vec((arb_angle(), arb_power()), 1..max_len)
    }
}

#[cfg(test)]
mod tests {
    use super::strategies::*;
    use super::*;
    use crate::fixtures::{cpu_duel, humans, seeded_duel};
    use proptest::prelude::*;
    use scorch_core::terrain::TerrainField;

    // =========================================================================
    // Basic determinism tests
    // =========================================================================

    #[test]
    fn test_verify_determinism_simple() {
        let result = verify_determinism(3, 100, || 0u64, |n| *n += 1, |n| *n);

        assert!(result.is_deterministic);
        assert_eq!(result.hashes, vec![100, 100, 100]);
    }

    #[test]
    fn test_cpu_duel_determinism() {
        assert!(verify_duel_determinism(|| cpu_duel(2, 42, 7), 20));
        assert!(verify_duel_determinism(|| cpu_duel(4, 1234, 99), 30));
    }

    #[test]
    fn test_find_divergence_on_deterministic_duel() {
        let divergence = find_first_divergence(|| cpu_duel(3, 5, 5), 25);
        assert!(divergence.is_none(), "Expected no divergence");
    }

    #[test]
    fn test_find_divergence_reports_unseeded_spawns() {
        let divergence = find_first_divergence(
            || {
                let (duel, _) = scorch_core::duel::Duel::initialize(
                    scorch_core::config::EngineConfig::default(),
                    &humans(2),
                    5,
                )
                .unwrap();
                duel
            },
            1,
        );
        assert_eq!(divergence, Some(0));
    }

    #[test]
    fn test_parallel_duels_match() {
        let result = run_parallel_duels(|| cpu_duel(2, 77, 3), 4, 15);
        assert!(result.is_deterministic());
        assert_eq!(result.hashes.len(), 4);
    }

    // =========================================================================
    // Serialization round-trip tests
    // =========================================================================

    #[test]
    fn test_serialization_preserves_fresh_duel() {
        assert!(verify_serialization_determinism(
            || seeded_duel(&humans(2), 9, 9),
            0
        ));
    }

    #[test]
    fn test_serialization_preserves_played_duel() {
        assert!(verify_serialization_determinism(|| cpu_duel(4, 31, 8), 12));
    }

    // =========================================================================
    // Property-based determinism tests
    // =========================================================================

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_terrain_generation_is_pure(seed in arb_seed(), (w, h) in arb_field_size()) {
            let a = TerrainField::generate(seed, w, h);
            let b = TerrainField::generate(seed, w, h);
            prop_assert_eq!(compute_hash(&a), compute_hash(&b));
        }

        #[test]
        fn prop_seeded_cpu_duels_agree(seed in arb_seed(), rng_seed in any::<u64>()) {
            prop_assert!(verify_duel_determinism(|| cpu_duel(2, seed, rng_seed), 6));
        }
    }
}
