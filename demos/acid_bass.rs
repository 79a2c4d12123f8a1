//! Acid bassline demo: generate a pattern, print the step grid, then
//! drive the sequencer with a synthetic 16th-note clock at 120 BPM and
//! show the voltages it emits.
//!
//! Run with: cargo run --example acid_bass

use acidline::prelude::*;

const SAMPLE_RATE: f64 = 48_000.0;
const BPM: f64 = 120.0;

fn note_name(semitones: i32) -> String {
    const NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    let idx = semitones.rem_euclid(12) as usize;
    let octave = 2 + semitones.div_euclid(12);
    format!("{}{}", NAMES[idx], octave)
}

fn print_pattern(seq: &AcidSequencer, scale: Scale, steps: usize) {
    println!(
        "seed {:>10}  scale {}  ({} steps)",
        seq.seed(),
        scale.name(),
        steps
    );
    println!("step : note  oct  accent slide");
    for i in 0..steps {
        let step = seq.resolve_step(i);
        match step.degree {
            Some(degree) => {
                let semis = degree_to_semitones(degree as usize, scale, 0, step.octave as i32);
                println!(
                    "{:>4} : {:<5} {:>3}  {:<6} {}",
                    i,
                    note_name(semis),
                    step.octave,
                    if step.accent { "ACC" } else { "." },
                    if step.slide { "SLD" } else { "." },
                );
            }
            None => println!("{:>4} : ----", i),
        }
    }
}

fn main() {
    let mut seq = AcidSequencer::new(SAMPLE_RATE);

    seq.set_param(PARAM_DENSITY, 75.0);
    seq.set_param(PARAM_SPREAD, 60.0);
    seq.set_param(PARAM_ACCENT_DENSITY, 30.0);
    seq.set_param(PARAM_SLIDE_DENSITY, 25.0);
    seq.set_param(PARAM_SCALE, Scale::Phrygian.index() as f64);

    let scale = Scale::Phrygian;
    println!("=== Master pattern under current knobs ===");
    print_pattern(&seq, scale, 16);

    // One bar of 16ths at 120 BPM.
    let step_period = 60.0 / BPM / 4.0;
    let samples_per_step = (step_period * SAMPLE_RATE) as usize;
    let pulse_samples = samples_per_step / 8;

    println!();
    println!("=== Playback (one bar of 16ths at {} BPM) ===", BPM);
    println!("step : pitch     gate accent slide");

    let mut inputs = PortValues::new();
    let mut outputs = PortValues::new();

    for _ in 0..16 {
        let mut peak_gate: f64 = 0.0;
        let mut peak_accent: f64 = 0.0;
        let mut peak_slide: f64 = 0.0;

        for s in 0..samples_per_step {
            inputs.set(IN_CLOCK, if s < pulse_samples { 5.0 } else { 0.0 });
            seq.tick(&inputs, &mut outputs);

            peak_gate = peak_gate.max(outputs.get_or(OUT_GATE, 0.0));
            peak_accent = peak_accent.max(outputs.get_or(OUT_ACCENT, 0.0));
            peak_slide = peak_slide.max(outputs.get_or(OUT_SLIDE, 0.0));
        }

        println!(
            "{:>4} : {:>+7.3} V {:<4} {:<6} {}",
            seq.current_step(),
            outputs.get_or(OUT_PITCH, 0.0),
            if peak_gate > 2.5 { "on" } else { "-" },
            if peak_accent > 2.5 { "ACC" } else { "." },
            if peak_slide > 2.5 { "SLD" } else { "." },
        );
    }

    // Roll a new pattern and show how the same knobs reshape it.
    println!();
    println!("=== After a generate trigger ===");
    inputs.clear();
    inputs.set(IN_GENERATE, 5.0);
    seq.tick(&inputs, &mut outputs);
    print_pattern(&seq, scale, 16);
}
