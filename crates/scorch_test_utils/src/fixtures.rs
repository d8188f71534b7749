//! Test fixtures and helpers.
//!
//! Pre-built rosters, terrain and duels for consistent testing.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use scorch_core::combatants::Participant;
use scorch_core::config::EngineConfig;
use scorch_core::duel::Duel;
use scorch_core::math::Point;
use scorch_core::terrain::TerrainField;

/// `n` human participants with ids `1..=n`.
#[must_use]
pub fn humans(n: u32) -> Vec<Participant> {
    (1..=n)
        .map(|i| Participant::human(i, format!("Player {i}")))
        .collect()
}

/// `n` CPU participants with ids `1..=n`.
#[must_use]
pub fn cpus(n: u32) -> Vec<Participant> {
    (1..=n)
        .map(|i| Participant::cpu(i, format!("CPU {i}")))
        .collect()
}

/// A field whose every column has its surface at `surface`.
#[must_use]
pub fn flat_field(width: u32, height: u32, surface: u32) -> TerrainField {
    TerrainField::from_surface(width, height, |_| surface)
}

/// A duel whose spawn x and CPU jitter come from `rng_seed`.
///
/// # Panics
///
/// Panics if the participants are not a valid roster.
#[must_use]
pub fn seeded_duel(participants: &[Participant], seed: u64, rng_seed: u64) -> Duel {
    let (duel, _) = Duel::with_rng(
        EngineConfig::default(),
        participants,
        seed,
        Pcg32::seed_from_u64(rng_seed),
    )
    .expect("fixture roster is valid");
    duel
}

/// An all-CPU duel with reproducible aim.
#[must_use]
pub fn cpu_duel(players: u32, seed: u64, rng_seed: u64) -> Duel {
    seeded_duel(&cpus(players), seed, rng_seed)
}

/// Spawn layout with combatant 1 hovering `gap` pixels straight above
/// combatant 2, which sits on the surface at column `x`.
#[must_use]
pub fn stacked_layout(seed: u64, config: &EngineConfig, x: f64, gap: f64) -> Vec<Point> {
    let field = TerrainField::generate(seed, config.field.width, config.field.height);
    let ground = f64::from(field.surface_y(x.floor() as i64));
    vec![Point::new(x, ground - gap), Point::new(x, ground)]
}
