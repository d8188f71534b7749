//! Destructible terrain: seeded generation, point queries and erosion.
//!
//! The field is a row-major bitset, one bit per pixel, set where terrain is
//! solid. It is generated once per match from `(seed, width, height)` and
//! afterwards only ever loses mass through [`TerrainField::erode`].
//!
//! # Determinism
//!
//! Every participant of a match renders the same seed, so generation must be
//! bit-reproducible:
//! - The height walk runs in fixed-point ([`Fixed`])
//! - Per-column randomness is a pure hash of `seed + column`, never a stream
//! - No state is carried between matches

use serde::{Deserialize, Serialize};

use crate::math::{Fixed, Point};

const WORD_BITS: usize = 64;

/// Seeded pseudo-random value in `[0, 1)`.
///
/// A splitmix64 finalizer over `key`; the upper 32 bits become the
/// fractional part of a [`Fixed`], so the result is exact on every platform.
#[must_use]
pub fn seeded_unit(key: u64) -> Fixed {
    let mut z = key.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    Fixed::from_bits((z >> 32) as i64)
}

/// Solidity mask over a fixed `width x height` domain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TerrainField {
    /// Seed the field was generated from (0 for hand-built fields).
    seed: u64,
    /// Width in pixels.
    width: u32,
    /// Height in pixels.
    height: u32,
    /// Row-major solidity bits.
    words: Vec<u64>,
}

impl TerrainField {
    /// Create a field with no solid cells.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        let cells = width as usize * height as usize;
        Self {
            seed: 0,
            width,
            height,
            words: vec![0; cells.div_ceil(WORD_BITS)],
        }
    }

    /// Generate the terrain for a match.
    ///
    /// A slope-perturbed random walk produces one surface height per column:
    /// slope changes by up to ±1 per column, is re-rolled when it exceeds
    /// ±3.5, and flips sign when the surface leaves the band between `0.3H`
    /// (peak) and `0.7H` (valley). Every cell at or below the surface is
    /// solid.
    #[must_use]
    pub fn generate(seed: u64, width: u32, height: u32) -> Self {
        let slope_change = Fixed::ONE;
        let two = Fixed::from_num(2);
        let max_slope = Fixed::from_num(3.5);
        let h = Fixed::from_num(height);
        let valley = h * Fixed::from_num(7) / Fixed::from_num(10);
        let peak = h * Fixed::from_num(3) / Fixed::from_num(10);

        let mut field = Self::empty(width, height);
        field.seed = seed;

        let mut slope = seeded_unit(seed) * slope_change - slope_change;
        let mut level = h / two;

        for column in 0..width {
            let i = u64::from(column);
            level += slope;
            slope += seeded_unit(seed.wrapping_add(i)) * slope_change * two - slope_change;

            if slope > max_slope || slope < -max_slope {
                slope = seeded_unit(seed.wrapping_add(i.wrapping_mul(2))) * slope_change * two
                    - slope_change;
            }
            if level > valley {
                slope = -slope;
                level -= two;
            } else if level < peak {
                slope = -slope;
                slope += two;
            }

            let top = level.ceil().to_num::<i64>().clamp(0, i64::from(height)) as u32;
            field.fill_column(column, top);
        }

        field
    }

    /// Build a field from an explicit surface profile.
    ///
    /// `surface(x)` is the topmost solid row of column `x`; values at or past
    /// `height` leave the column empty.
    #[must_use]
    pub fn from_surface(width: u32, height: u32, surface: impl Fn(u32) -> u32) -> Self {
        let mut field = Self::empty(width, height);
        for x in 0..width {
            field.fill_column(x, surface(x).min(height));
        }
        field
    }

    fn fill_column(&mut self, x: u32, top: u32) {
        for y in top..self.height {
            let idx = self.index(x, y);
            self.words[idx / WORD_BITS] |= 1u64 << (idx % WORD_BITS);
        }
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Seed the field was generated from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Whether the cell at `(x, y)` is solid. Cells outside the field are not.
    #[must_use]
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        if !self.in_bounds(x, y) {
            return false;
        }
        let idx = self.index(x as u32, y as u32);
        self.words[idx / WORD_BITS] & (1u64 << (idx % WORD_BITS)) != 0
    }

    /// Whether the cell containing `point` is solid.
    #[must_use]
    pub fn is_solid_at(&self, point: Point) -> bool {
        point.cell().is_some_and(|(x, y)| self.is_solid(x, y))
    }

    /// Topmost solid row of column `x`.
    ///
    /// Falls back to mid-field when the column is empty or outside the
    /// field, so spawn placement and CPU targeting always get a usable row.
    #[must_use]
    pub fn surface_y(&self, x: i64) -> u32 {
        if x >= 0 && x < i64::from(self.width) {
            if let Some(y) = (0..self.height).find(|&y| self.is_solid(x, i64::from(y))) {
                return y;
            }
        }
        self.height / 2
    }

    /// Surface row of every column (`height` for empty columns).
    ///
    /// Rendering snapshot; unlike [`surface_y`](Self::surface_y) there is no
    /// mid-field fallback.
    #[must_use]
    pub fn column_heights(&self) -> Vec<u32> {
        (0..self.width)
            .map(|x| {
                (0..self.height)
                    .find(|&y| self.is_solid(i64::from(x), i64::from(y)))
                    .unwrap_or(self.height)
            })
            .collect()
    }

    /// Clear every cell within `radius` of `center`.
    ///
    /// Returns the number of cells that were solid before the call. Eroding
    /// the same region twice clears nothing the second time.
    pub fn erode(&mut self, center: Point, radius: f64) -> u32 {
        if radius.is_nan() || radius <= 0.0 || !center.x.is_finite() || !center.y.is_finite() {
            return 0;
        }

        let r2 = radius * radius;
        let x_min = (center.x - radius).floor().max(0.0) as i64;
        let y_min = (center.y - radius).floor().max(0.0) as i64;
        let x_max = (center.x + radius).ceil().min(f64::from(self.width) - 1.0) as i64;
        let y_max = (center.y + radius).ceil().min(f64::from(self.height) - 1.0) as i64;

        let mut cleared = 0;
        for y in y_min..=y_max {
            for x in x_min..=x_max {
                let dx = x as f64 - center.x;
                let dy = y as f64 - center.y;
                if dx * dx + dy * dy >= r2 || !self.in_bounds(x, y) {
                    continue;
                }
                let idx = self.index(x as u32, y as u32);
                let bit = 1u64 << (idx % WORD_BITS);
                let word = &mut self.words[idx / WORD_BITS];
                if *word & bit != 0 {
                    *word &= !bit;
                    cleared += 1;
                }
            }
        }

        cleared
    }

    /// Number of solid cells.
    #[must_use]
    pub fn solid_count(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Whether every solid cell of `self` is also solid in `other`.
    #[must_use]
    pub fn is_subset_of(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(mine, theirs)| mine & !theirs == 0)
    }
}
