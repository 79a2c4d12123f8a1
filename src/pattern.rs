//! Master Pattern Generation and Query
//!
//! The master pattern is the seed-derived, parameter-independent backbone
//! of a bassline: 64 abstract step descriptors plus two priority orderings
//! that decide which bar positions activate first as density rises and
//! which scale degrees unlock first as spread rises.
//!
//! Density and spread are NOT baked into the stored data. Each step keeps a
//! pool rank and two pre-drawn probability rolls, and [`MasterPattern::resolve`]
//! reinterprets them against the live knob values on every query. That is
//! what lets the density/spread/accent/slide knobs act in real time without
//! regenerating anything.

use crate::rng::Sfc32;
use std::cmp::Ordering;

/// Fixed step capacity. This is a load-bearing ceiling (snapshot layout,
/// UI paging), not an arbitrary limit.
pub const MAX_STEPS: usize = 64;

/// Steps per bar; the density control activates bar positions.
pub const BAR_LEN: usize = 16;

/// Size of the scale-degree priority pool driven by the spread control.
pub const DEGREE_POOL: usize = 7;

/// One abstract step of the master pattern.
///
/// `pool_index` is a rank into the pattern's scale priority order, NOT a
/// scale degree itself. The rolls are pre-drawn thresholds compared against
/// the live accent/slide density parameters at query time.
///
/// The PRNG's 1.0 rounding edge means generation can, on the order of one
/// draw in 2^25, store `pool_index == 7` or `octave == +2`. The pool index
/// is guarded by the `min()` in [`MasterPattern::scale_degree`] before any
/// array access; the octave only ever transposes voltage, so the stray +2
/// is audible but harmless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MasterStep {
    /// Rank into `scale_priority_order`, 0 = highest priority note
    pub pool_index: u8,
    /// Octave offset for this step: -1, 0, or +1
    pub octave: i8,
    /// Pre-drawn accent threshold in [0, 1)
    pub accent_roll: f32,
    /// Pre-drawn slide threshold in [0, 1)
    pub slide_roll: f32,
}

impl Default for MasterStep {
    fn default() -> Self {
        Self {
            pool_index: 0,
            octave: 0,
            accent_roll: 0.5,
            slide_roll: 0.5,
        }
    }
}

/// Live control parameters applied at query time. All are percentages in
/// `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolveParams {
    /// Fraction of the 16 bar positions that are active
    pub density: f64,
    /// How many of the 7 priority slots are eligible
    pub spread: f64,
    /// Probability threshold for accents
    pub accent_density: f64,
    /// Probability threshold for slides
    pub slide_density: f64,
}

impl Default for ResolveParams {
    fn default() -> Self {
        Self {
            density: 50.0,
            spread: 50.0,
            accent_density: 25.0,
            slide_density: 15.0,
        }
    }
}

/// The concrete musical event a step resolves to under the current
/// parameters. Ephemeral: recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedStep {
    /// Scale degree, or `None` for a rest
    pub degree: Option<u8>,
    /// Octave offset: -1, 0, or +1
    pub octave: i8,
    /// Accent flag for this step
    pub accent: bool,
    /// Slide flag: the NEXT note glides in instead of retriggering
    pub slide: bool,
}

impl ResolvedStep {
    /// A rest: no note, no accent, no slide.
    pub const REST: ResolvedStep = ResolvedStep {
        degree: None,
        octave: 0,
        accent: false,
        slide: false,
    };

    pub fn is_rest(&self) -> bool {
        self.degree.is_none()
    }
}

/// The seed-derived backbone of a generated bassline.
///
/// Created by [`MasterPattern::generate`], mutated only by regeneration
/// (which replaces everything and clears mutes) or by user mute toggles
/// (which leave the generated data untouched).
#[derive(Debug, Clone, PartialEq)]
pub struct MasterPattern {
    /// Order in which bar positions activate as density rises;
    /// index 0 = first to activate (typically the "one")
    pub bar_activation_order: [u8; BAR_LEN],

    /// Order in which scale degrees unlock as spread rises;
    /// index 0 = highest priority (the root, by construction)
    pub scale_priority_order: [u8; DEGREE_POOL],

    /// Step data for all 64 steps
    pub steps: [MasterStep; MAX_STEPS],

    /// Per-step user mute mask; a muted step is forced to rest
    pub muted: [bool; MAX_STEPS],
}

impl Default for MasterPattern {
    fn default() -> Self {
        let mut bar_activation_order = [0u8; BAR_LEN];
        for (i, slot) in bar_activation_order.iter_mut().enumerate() {
            *slot = i as u8;
        }
        let mut scale_priority_order = [0u8; DEGREE_POOL];
        for (i, slot) in scale_priority_order.iter_mut().enumerate() {
            *slot = i as u8;
        }
        Self {
            bar_activation_order,
            scale_priority_order,
            steps: [MasterStep::default(); MAX_STEPS],
            muted: [false; MAX_STEPS],
        }
    }
}

/// Sort index/weight pairs by weight descending. Stable, so equal weights
/// keep their index order and generation stays deterministic even on ties.
fn sort_by_weight_desc(entries: &mut [(u8, f32)]) {
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}

impl MasterPattern {
    /// Generate a complete master pattern from a seed.
    ///
    /// The draw order (scale weights, then bar weights, then per-step
    /// content) is part of the determinism contract and must not be
    /// reordered. The returned pattern has a cleared mute mask.
    pub fn generate(seed: u32) -> Self {
        let mut rng = Sfc32::new(seed);
        let mut pattern = Self::default();

        // Scale degree priorities. Heavy bias keeps the root first; a
        // smaller bias usually ranks the fifth second.
        let mut weighted_degrees = [(0u8, 0f32); DEGREE_POOL];
        for (i, entry) in weighted_degrees.iter_mut().enumerate() {
            let mut weight = rng.next();
            if i == 0 {
                weight += 999.0;
            }
            if i == 4 {
                weight += 0.5;
            }
            *entry = (i as u8, weight);
        }
        sort_by_weight_desc(&mut weighted_degrees);
        for (slot, entry) in pattern
            .scale_priority_order
            .iter_mut()
            .zip(weighted_degrees.iter())
        {
            *slot = entry.0;
        }

        // Bar position activation order. Downbeats get a boost, and the
        // "one" gets an extra boost on top.
        let mut weighted_positions = [(0u8, 0f32); BAR_LEN];
        for (i, entry) in weighted_positions.iter_mut().enumerate() {
            let mut weight = rng.next();
            if i % 4 == 0 {
                weight += 0.5;
            }
            if i == 0 {
                weight += 0.5;
            }
            *entry = (i as u8, weight);
        }
        sort_by_weight_desc(&mut weighted_positions);
        for (slot, entry) in pattern
            .bar_activation_order
            .iter_mut()
            .zip(weighted_positions.iter())
        {
            *slot = entry.0;
        }

        // Step content. Pool indices span the full pool; spread constrains
        // them at query time, not here.
        for (i, step) in pattern.steps.iter_mut().enumerate() {
            let downbeat = i % 4 == 0;
            let pool_index = if downbeat && rng.next() > 0.3 {
                0
            } else {
                rng.random_int(0, DEGREE_POOL as i32 - 1) as u8
            };

            *step = MasterStep {
                pool_index,
                octave: rng.random_int(-1, 1) as i8,
                accent_roll: rng.next(),
                slide_roll: rng.next(),
            };
        }

        pattern
    }

    /// Whether a step's bar position is active at the given density.
    pub fn is_step_active(&self, step: usize, density: f64) -> bool {
        let bar_pos = (step % BAR_LEN) as u8;
        let active_count = ((BAR_LEN as f64 * density / 100.0).round() as i64)
            .clamp(0, BAR_LEN as i64) as usize;

        self.bar_activation_order[..active_count].contains(&bar_pos)
    }

    /// The scale degree a step maps to at the given spread.
    ///
    /// A pool index beyond the spread window quantizes to the root
    /// (priority slot 0) so the pool only ever grows as spread rises.
    pub fn scale_degree(&self, step: usize, spread: f64) -> u8 {
        let ms = &self.steps[step % MAX_STEPS];
        let spread_count = ((DEGREE_POOL as f64 * spread / 100.0).round() as usize).max(1);

        // min() guards pool indices from a damaged snapshot
        let rank = (ms.pool_index as usize).min(DEGREE_POOL - 1);
        if rank < spread_count {
            self.scale_priority_order[rank]
        } else {
            self.scale_priority_order[0]
        }
    }

    /// Find the priority rank holding a given scale degree, or 0 (the
    /// root's slot) if the degree is not in the order. Used by pattern
    /// editors translating degrees back into stored pool indices.
    pub fn pool_index_for_degree(&self, degree: u8) -> u8 {
        self.scale_priority_order
            .iter()
            .position(|&d| d == degree)
            .unwrap_or(0) as u8
    }

    /// Resolve a step into a concrete event under the live parameters.
    ///
    /// Pure and allocation-free; called at least twice per clock edge and
    /// once per sample for the slide output. Check order: user mute, then
    /// density, then spread, then the accent/slide rolls.
    pub fn resolve(&self, step: usize, params: &ResolveParams) -> ResolvedStep {
        let step = step % MAX_STEPS;

        if self.muted[step] {
            return ResolvedStep::REST;
        }

        if !self.is_step_active(step, params.density) {
            return ResolvedStep::REST;
        }

        let ms = &self.steps[step];
        ResolvedStep {
            degree: Some(self.scale_degree(step, params.spread)),
            octave: ms.octave,
            accent: (ms.accent_roll as f64) < params.accent_density / 100.0,
            slide: (ms.slide_roll as f64) < params.slide_density / 100.0,
        }
    }

    /// Set a step's mute flag. Out-of-range steps are ignored.
    pub fn set_muted(&mut self, step: usize, muted: bool) {
        if let Some(slot) = self.muted.get_mut(step) {
            *slot = muted;
        }
    }

    /// Toggle a step's mute flag. Out-of-range steps are ignored.
    pub fn toggle_muted(&mut self, step: usize) {
        if let Some(slot) = self.muted.get_mut(step) {
            *slot = !*slot;
        }
    }

    /// Clear all mutes. Called when generating a brand-new pattern, not
    /// when restoring from a snapshot.
    pub fn clear_mutes(&mut self) {
        self.muted = [false; MAX_STEPS];
    }
}
