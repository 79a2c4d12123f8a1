//! # Acidline
//!
//! A deterministic acid bassline generator and step sequencer for
//! voltage-controlled instruments.
//!
//! The crate splits the classic 303-style workflow into two independent
//! layers:
//!
//! - **Generation** ([`pattern`]): a seeded PRNG ([`rng`]) produces a
//!   64-step *master pattern* of abstract scale degrees, octave offsets,
//!   and accent/slide rolls. The master pattern is parameter-free; the
//!   seed alone reproduces it exactly.
//! - **Interpretation**: density, spread, accent, and slide knobs
//!   reinterpret the stored pattern at query time. Turning a knob reshapes
//!   the groove instantly and reversibly, without regenerating.
//!
//! The playback layer ([`engine`]) advances the pattern against an
//! external clock and renders 1V/oct pitch, gate, accent, and slide
//! outputs with hardware-faithful behavior: constant-rate portamento,
//! tied gates across chained slides, and retrigger gaps. Scales and the
//! voltage mapping live in [`scale`], signal conventions in [`port`], and
//! patch persistence in [`serialize`].
//!
//! ## Quick Start
//!
//! ```
//! use acidline::prelude::*;
//!
//! let mut seq = AcidSequencer::new(48_000.0);
//! seq.set_param(PARAM_DENSITY, 80.0);
//! seq.set_param(PARAM_SCALE, Scale::Phrygian.index() as f64);
//!
//! // Drive the sequencer one sample at a time: a clock edge advances it.
//! let mut inputs = PortValues::new();
//! let mut outputs = PortValues::new();
//! inputs.set(IN_CLOCK, 5.0);
//! seq.tick(&inputs, &mut outputs);
//!
//! assert_eq!(seq.current_step(), 0);
//! let pitch = outputs.get_or(OUT_PITCH, 0.0);
//! assert!((-2.0..=3.0).contains(&pitch));
//! ```
//!
//! ## Determinism
//!
//! Pattern generation is bit-exact: the same seed yields the same master
//! pattern on every platform, so a patch only needs to store the seed (the
//! full pattern is still backed up to preserve user edits and mutes).

pub mod engine;
pub mod pattern;
pub mod port;
pub mod rng;
pub mod scale;
pub mod serialize;

/// Common imports for working with the sequencer.
pub mod prelude {
    pub use crate::engine::{
        AcidSequencer, EdgeDetector, PulseGenerator, IN_CLOCK, IN_GENERATE, IN_OCTAVE_DOWN,
        IN_OCTAVE_UP, IN_RESET, OUT_ACCENT, OUT_GATE, OUT_PITCH, OUT_SLIDE, PARAM_ACCENT_DENSITY,
        PARAM_DENSITY, PARAM_OCTAVE, PARAM_PATTERN_LENGTH, PARAM_ROOT_NOTE, PARAM_SCALE,
        PARAM_SLIDE_DENSITY, PARAM_SPREAD,
    };
    pub use crate::pattern::{
        MasterPattern, MasterStep, ResolveParams, ResolvedStep, BAR_LEN, DEGREE_POOL, MAX_STEPS,
    };
    pub use crate::port::{
        GraphModule, ParamDef, ParamId, PortDef, PortId, PortSpec, PortValues, SignalKind,
    };
    pub use crate::rng::{derive_seed, Sfc32};
    pub use crate::scale::{degree_to_semitones, degree_to_voct, Scale, NUM_SCALES};
    pub use crate::serialize::{
        PatternSnapshot, SequencerSnapshot, SlideSnapshot, StepSnapshot, SNAPSHOT_VERSION,
    };
}

pub use prelude::*;
