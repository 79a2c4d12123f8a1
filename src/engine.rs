//! Playback Engine
//!
//! The sequencer engine advances one step per external clock edge, asks
//! the master pattern for the current step under the live knob values, and
//! turns the result into pitch CV, gate, accent, and slide outputs with
//! 303-style behavior: constant-rate portamento into slide-flagged notes,
//! tied gates across chained slides, and a forced-low retrigger gap when a
//! new note attacks while the gate is still high.
//!
//! One `tick` call per audio sample on a single thread. Nothing in the
//! per-sample path allocates, blocks, or locks.

use crate::pattern::{MasterPattern, ResolveParams, ResolvedStep, MAX_STEPS};
use crate::port::{
    GraphModule, ParamDef, ParamId, PortDef, PortSpec, PortValues, SignalKind,
};
use crate::rng::{derive_seed, system_time_seconds};
use crate::scale::{degree_to_voct, Scale, NUM_SCALES};
use crate::serialize::SequencerSnapshot;

/// Gate/trigger high level in volts.
const GATE_HIGH: f64 = 5.0;

/// Rising-edge threshold shared by all trigger inputs.
const EDGE_THRESHOLD: f64 = 2.5;

/// Portamento time for slide-in notes, in seconds (~303 glide).
const GLIDE_TIME: f64 = 0.05;

/// Gate length for plain (non-slide) notes, in seconds.
const GATE_TIME: f64 = 0.02;

/// Forced-low gap inserted before a retrigger, in seconds.
const RETRIGGER_GAP_TIME: f64 = 0.001;

/// Slide-flagged gates stretch past the next clock edge by this ratio so
/// the notes tie.
const TIE_RATIO: f64 = 1.1;

/// Clock period measurements outside this window are discarded.
const MIN_CLOCK_PERIOD: f64 = 0.01;
const MAX_CLOCK_PERIOD: f64 = 2.0;

/// Default period estimate before any clock arrives: 16ths at 120 BPM.
const DEFAULT_CLOCK_PERIOD: f64 = 0.125;

// Input port ids
pub const IN_CLOCK: u32 = 0;
pub const IN_RESET: u32 = 1;
pub const IN_GENERATE: u32 = 2;
pub const IN_OCTAVE_UP: u32 = 3;
pub const IN_OCTAVE_DOWN: u32 = 4;

// Output port ids
pub const OUT_PITCH: u32 = 10;
pub const OUT_GATE: u32 = 11;
pub const OUT_ACCENT: u32 = 12;
pub const OUT_SLIDE: u32 = 13;

// Parameter ids
pub const PARAM_DENSITY: ParamId = 0;
pub const PARAM_SPREAD: ParamId = 1;
pub const PARAM_ACCENT_DENSITY: ParamId = 2;
pub const PARAM_SLIDE_DENSITY: ParamId = 3;
pub const PARAM_PATTERN_LENGTH: ParamId = 4;
pub const PARAM_ROOT_NOTE: ParamId = 5;
pub const PARAM_SCALE: ParamId = 6;
pub const PARAM_OCTAVE: ParamId = 7;

/// Countdown pulse generator for gate and accent outputs.
///
/// `trigger` (re)arms a fixed-duration high window from now; `process`
/// advances the internal clock by one sample and reports whether the
/// window is still open.
#[derive(Debug, Clone, Copy, Default)]
pub struct PulseGenerator {
    remaining: f64,
}

impl PulseGenerator {
    pub fn trigger(&mut self, duration: f64) {
        self.remaining = duration;
    }

    pub fn process(&mut self, dt: f64) -> bool {
        if self.remaining > 0.0 {
            self.remaining -= dt;
            true
        } else {
            false
        }
    }

    /// Whether the window is open without advancing time.
    pub fn is_high(&self) -> bool {
        self.remaining > 0.0
    }

    pub fn reset(&mut self) {
        self.remaining = 0.0;
    }
}

/// Rising-edge detector for trigger/clock/gate inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeDetector {
    last: f64,
}

impl EdgeDetector {
    /// Returns true exactly once per low-to-high transition.
    pub fn process(&mut self, value: f64) -> bool {
        let rising = value > EDGE_THRESHOLD && self.last <= EDGE_THRESHOLD;
        self.last = value;
        rising
    }

    pub fn reset(&mut self) {
        self.last = 0.0;
    }
}

/// Acid bassline sequencer.
///
/// Generates a deterministic master pattern from a seed and plays it back
/// against an external clock, emitting 1V/oct pitch, gate, accent, and
/// slide outputs. Density, spread, accent density, and slide density
/// reinterpret the stored pattern in real time; generation only happens on
/// an explicit generate trigger.
pub struct AcidSequencer {
    spec: PortSpec,
    param_defs: Vec<ParamDef>,
    sample_rate: f64,

    // Pattern
    pattern: MasterPattern,
    seed: u32,

    // Control parameters
    density: f64,
    spread: f64,
    accent_density: f64,
    slide_density: f64,
    pattern_length: usize,
    root_note: i32,
    scale: Scale,
    octave_offset: i32,

    // Playback state; current_step == -1 means not yet started
    current_step: i32,
    current_pitch: f64,
    slide_target: f64,
    slide_rate: f64,
    current_slide_active: bool,

    // Clock period measurement
    time_since_clock: f64,
    clock_period: f64,

    // Gate shaping
    retrigger_gap: f64,
    gate: PulseGenerator,
    accent: PulseGenerator,

    // Edge detection
    clock_edge: EdgeDetector,
    reset_edge: EdgeDetector,
    generate_edge: EdgeDetector,
    octave_up_edge: EdgeDetector,
    octave_down_edge: EdgeDetector,

    // Injectable wall clock for seed derivation
    time_source: fn() -> u32,
}

impl AcidSequencer {
    pub fn new(sample_rate: f64) -> Self {
        let seed = 12345;
        Self {
            spec: PortSpec {
                inputs: vec![
                    PortDef::new(IN_CLOCK, "clock", SignalKind::Clock),
                    PortDef::new(IN_RESET, "reset", SignalKind::Trigger),
                    PortDef::new(IN_GENERATE, "generate", SignalKind::Trigger),
                    PortDef::new(IN_OCTAVE_UP, "octave_up", SignalKind::Trigger),
                    PortDef::new(IN_OCTAVE_DOWN, "octave_down", SignalKind::Trigger),
                ],
                outputs: vec![
                    PortDef::new(OUT_PITCH, "pitch", SignalKind::VoltPerOctave),
                    PortDef::new(OUT_GATE, "gate", SignalKind::Gate),
                    PortDef::new(OUT_ACCENT, "accent", SignalKind::Gate),
                    PortDef::new(OUT_SLIDE, "slide", SignalKind::Gate),
                ],
            },
            param_defs: vec![
                ParamDef::new(PARAM_DENSITY, "density", 0.0, 100.0, 50.0),
                ParamDef::new(PARAM_SPREAD, "spread", 0.0, 100.0, 50.0),
                ParamDef::new(PARAM_ACCENT_DENSITY, "accent_density", 0.0, 100.0, 25.0),
                ParamDef::new(PARAM_SLIDE_DENSITY, "slide_density", 0.0, 100.0, 15.0),
                ParamDef::new(PARAM_PATTERN_LENGTH, "pattern_length", 1.0, 64.0, 16.0),
                ParamDef::new(PARAM_ROOT_NOTE, "root_note", 0.0, 11.0, 0.0),
                ParamDef::new(PARAM_SCALE, "scale", 0.0, (NUM_SCALES - 1) as f64, 1.0),
                ParamDef::new(PARAM_OCTAVE, "octave", -2.0, 2.0, 0.0),
            ],
            sample_rate,
            pattern: MasterPattern::generate(seed),
            seed,
            density: 50.0,
            spread: 50.0,
            accent_density: 25.0,
            slide_density: 15.0,
            pattern_length: 16,
            root_note: 0,
            scale: Scale::Minor,
            octave_offset: 0,
            current_step: -1,
            current_pitch: 0.0,
            slide_target: 0.0,
            slide_rate: 0.0,
            current_slide_active: false,
            time_since_clock: 0.0,
            clock_period: DEFAULT_CLOCK_PERIOD,
            retrigger_gap: 0.0,
            gate: PulseGenerator::default(),
            accent: PulseGenerator::default(),
            clock_edge: EdgeDetector::default(),
            reset_edge: EdgeDetector::default(),
            generate_edge: EdgeDetector::default(),
            octave_up_edge: EdgeDetector::default(),
            octave_down_edge: EdgeDetector::default(),
            time_source: system_time_seconds,
        }
    }

    /// Replace the wall-clock source used for seed derivation. Tests
    /// inject a fixed value to make generate triggers deterministic.
    pub fn with_time_source(mut self, source: fn() -> u32) -> Self {
        self.time_source = source;
        self
    }

    /// Derive a fresh seed and regenerate the master pattern, clearing any
    /// user mutes from the previous one.
    pub fn generate_pattern(&mut self) {
        self.seed = derive_seed(self.seed, (self.time_source)());
        self.pattern = MasterPattern::generate(self.seed);
    }

    /// Regenerate deterministically from an explicit seed. Used by the
    /// snapshot fallback path; also handy for hosts that let users type a
    /// seed in.
    pub fn regenerate_from_seed(&mut self, seed: u32) {
        self.seed = seed;
        self.pattern = MasterPattern::generate(seed);
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn pattern(&self) -> &MasterPattern {
        &self.pattern
    }

    /// Replace the master pattern wholesale (pattern editors).
    pub fn set_pattern(&mut self, pattern: MasterPattern) {
        self.pattern = pattern;
    }

    pub fn set_muted(&mut self, step: usize, muted: bool) {
        self.pattern.set_muted(step, muted);
    }

    pub fn toggle_muted(&mut self, step: usize) {
        self.pattern.toggle_muted(step);
    }

    /// Current step index; -1 before the first clock edge.
    pub fn current_step(&self) -> i32 {
        self.current_step
    }

    pub fn current_pitch(&self) -> f64 {
        self.current_pitch
    }

    pub fn slide_rate(&self) -> f64 {
        self.slide_rate
    }

    /// Last accepted clock period estimate, in seconds.
    pub fn clock_period(&self) -> f64 {
        self.clock_period
    }

    /// Resolve a step under the current knob values, for display. Does not
    /// touch playback state.
    pub fn resolve_step(&self, step: usize) -> ResolvedStep {
        self.pattern.resolve(step, &self.resolve_params())
    }

    fn resolve_params(&self) -> ResolveParams {
        ResolveParams {
            density: self.density,
            spread: self.spread,
            accent_density: self.accent_density,
            slide_density: self.slide_density,
        }
    }

    fn do_reset(&mut self) {
        // Step becomes 0 on the next clock edge.
        self.current_step = -1;
        self.current_slide_active = false;
        self.slide_rate = 0.0;
        self.retrigger_gap = 0.0;
    }

    fn on_clock_edge(&mut self) {
        // Adopt the measured period only inside the sanity window; a
        // missing or glitchy clock keeps the previous estimate.
        if (MIN_CLOCK_PERIOD..=MAX_CLOCK_PERIOD).contains(&self.time_since_clock) {
            self.clock_period = self.time_since_clock;
        }
        self.time_since_clock = 0.0;

        let length = self.pattern_length.max(1);
        self.current_step += 1;
        if self.current_step as usize >= length {
            self.current_step = 0;
        }
        let step = self.current_step as usize % length;

        let params = self.resolve_params();
        let resolved = self.pattern.resolve(step, &params);

        let degree = match resolved.degree {
            Some(degree) => degree,
            None => {
                // Rest: no gate, hold the last voltage, break any slide chain.
                self.current_slide_active = false;
                return;
            }
        };

        let voltage = degree_to_voct(
            degree as usize,
            self.scale,
            self.root_note,
            resolved.octave as i32 + self.octave_offset,
        );

        // Did the previous played step flag a slide into this one?
        let prev = (step + length - 1) % length;
        let prev_resolved = self.pattern.resolve(prev, &params);
        let slide_in = !prev_resolved.is_rest() && prev_resolved.slide;

        if slide_in {
            // Glide to the new pitch over a fixed time; no retrigger.
            self.slide_target = voltage;
            self.slide_rate = (voltage - self.current_pitch) / (GLIDE_TIME * self.sample_rate);

            if resolved.slide {
                // Chained slide: stretch the gate past the next edge so the
                // notes tie.
                self.gate.trigger(self.clock_period * TIE_RATIO);
            }
            // Otherwise the previous gate decays on its own.
        } else {
            // Plain attack: jump to the pitch and retrigger.
            self.current_pitch = voltage;
            self.slide_target = voltage;
            self.slide_rate = 0.0;

            if self.gate.is_high() {
                self.retrigger_gap = RETRIGGER_GAP_TIME;
            }

            let gate_time = if resolved.slide {
                self.clock_period * TIE_RATIO
            } else {
                GATE_TIME
            };
            self.gate.trigger(gate_time);

            if resolved.accent {
                self.accent.trigger(gate_time);
            }
        }

        self.current_slide_active = resolved.slide;
    }
}

impl Default for AcidSequencer {
    fn default() -> Self {
        Self::new(44100.0)
    }
}

impl GraphModule for AcidSequencer {
    fn port_spec(&self) -> &PortSpec {
        &self.spec
    }

    fn tick(&mut self, inputs: &PortValues, outputs: &mut PortValues) {
        let dt = 1.0 / self.sample_rate;

        if self.generate_edge.process(inputs.get_or(IN_GENERATE, 0.0)) {
            self.generate_pattern();
        }
        if self.octave_up_edge.process(inputs.get_or(IN_OCTAVE_UP, 0.0)) {
            self.octave_offset = (self.octave_offset + 1).min(2);
        }
        if self
            .octave_down_edge
            .process(inputs.get_or(IN_OCTAVE_DOWN, 0.0))
        {
            self.octave_offset = (self.octave_offset - 1).max(-2);
        }
        if self.reset_edge.process(inputs.get_or(IN_RESET, 0.0)) {
            self.do_reset();
        }

        self.time_since_clock += dt;
        if self.clock_edge.process(inputs.get_or(IN_CLOCK, 0.0)) {
            self.on_clock_edge();
        }

        // Advance the portamento ramp. The rate rarely divides the
        // distance evenly, so detect arrival direction-aware instead of by
        // equality.
        if self.slide_rate != 0.0 {
            self.current_pitch += self.slide_rate;
            let arrived = (self.slide_rate > 0.0 && self.current_pitch >= self.slide_target)
                || (self.slide_rate < 0.0 && self.current_pitch <= self.slide_target);
            if arrived {
                self.current_pitch = self.slide_target;
                self.slide_rate = 0.0;
            }
        }

        outputs.set(OUT_PITCH, self.current_pitch);

        let gate_high = self.gate.process(dt);
        if self.retrigger_gap > 0.0 {
            // Force the gate low so a downstream envelope reliably sees a
            // fresh attack.
            self.retrigger_gap -= dt;
            outputs.set(OUT_GATE, 0.0);
        } else {
            outputs.set(OUT_GATE, if gate_high { GATE_HIGH } else { 0.0 });
        }

        let accent_high = self.accent.process(dt);
        outputs.set(OUT_ACCENT, if accent_high { GATE_HIGH } else { 0.0 });

        // Slide output reflects the currently playing step's flag, for
        // driving an external portamento circuit.
        let slide_out = if self.current_step >= 0 {
            let step = self.current_step as usize % self.pattern_length.max(1);
            if self.pattern.resolve(step, &self.resolve_params()).slide {
                GATE_HIGH
            } else {
                0.0
            }
        } else {
            0.0
        };
        outputs.set(OUT_SLIDE, slide_out);
    }

    fn reset(&mut self) {
        self.do_reset();
        self.current_pitch = 0.0;
        self.slide_target = 0.0;
        self.time_since_clock = 0.0;
        self.clock_period = DEFAULT_CLOCK_PERIOD;
        self.gate.reset();
        self.accent.reset();
        self.clock_edge.reset();
        self.reset_edge.reset();
        self.generate_edge.reset();
        self.octave_up_edge.reset();
        self.octave_down_edge.reset();
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
    }

    fn params(&self) -> &[ParamDef] {
        &self.param_defs
    }

    fn get_param(&self, id: ParamId) -> Option<f64> {
        match id {
            PARAM_DENSITY => Some(self.density),
            PARAM_SPREAD => Some(self.spread),
            PARAM_ACCENT_DENSITY => Some(self.accent_density),
            PARAM_SLIDE_DENSITY => Some(self.slide_density),
            PARAM_PATTERN_LENGTH => Some(self.pattern_length as f64),
            PARAM_ROOT_NOTE => Some(self.root_note as f64),
            PARAM_SCALE => Some(self.scale.index() as f64),
            PARAM_OCTAVE => Some(self.octave_offset as f64),
            _ => None,
        }
    }

    fn set_param(&mut self, id: ParamId, value: f64) {
        match id {
            PARAM_DENSITY => self.density = value.clamp(0.0, 100.0),
            PARAM_SPREAD => self.spread = value.clamp(0.0, 100.0),
            PARAM_ACCENT_DENSITY => self.accent_density = value.clamp(0.0, 100.0),
            PARAM_SLIDE_DENSITY => self.slide_density = value.clamp(0.0, 100.0),
            PARAM_PATTERN_LENGTH => {
                // A length change takes effect on the next step advance via
                // the modulo wrap; no state fixup needed here.
                self.pattern_length = (value.round() as i64).clamp(1, MAX_STEPS as i64) as usize;
            }
            PARAM_ROOT_NOTE => self.root_note = (value.round() as i64).clamp(0, 11) as i32,
            PARAM_SCALE => self.scale = Scale::from_index(value.round().max(0.0) as usize),
            PARAM_OCTAVE => self.octave_offset = (value.round() as i64).clamp(-2, 2) as i32,
            _ => {}
        }
    }

    fn type_id(&self) -> &'static str {
        "acid_sequencer"
    }

    fn serialize_state(&self) -> Option<serde_json::Value> {
        serde_json::to_value(self.snapshot()).ok()
    }

    fn deserialize_state(&mut self, state: &serde_json::Value) -> Result<(), String> {
        let snapshot: SequencerSnapshot =
            serde_json::from_value(state.clone()).map_err(|e| e.to_string())?;
        self.restore(&snapshot);
        Ok(())
    }
}

impl AcidSequencer {
    /// Capture the persistable state: seed, playback position, the full
    /// master pattern, and in-flight slide state so a restore resumes
    /// mid-glide instead of snapping.
    pub fn snapshot(&self) -> SequencerSnapshot {
        SequencerSnapshot::capture(
            self.seed,
            self.current_step,
            &self.pattern,
            self.current_slide_active,
            self.current_pitch,
            self.slide_target,
            self.slide_rate,
        )
    }

    /// Restore from a snapshot. Older snapshots without a pattern backup
    /// regenerate deterministically from the stored seed; out-of-range
    /// values are clamped, never rejected.
    pub fn restore(&mut self, snapshot: &SequencerSnapshot) {
        self.seed = snapshot.seed;
        self.current_step = snapshot.current_step.clamp(-1, MAX_STEPS as i32 - 1);

        match snapshot.pattern_backup() {
            Some(backup) => {
                let mut pattern = MasterPattern::default();
                backup.apply(&mut pattern);
                self.pattern = pattern;
            }
            None => {
                self.pattern = MasterPattern::generate(self.seed);
            }
        }

        self.current_slide_active = snapshot.slide.active;
        self.current_pitch = snapshot.slide.current_pitch;
        self.slide_target = snapshot.slide.target_pitch;
        self.slide_rate = snapshot.slide.rate;
    }
}
