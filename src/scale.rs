//! Musical Scales and Voltage Mapping
//!
//! A compiled-in library of scales (interval sets), the degree-to-semitone
//! mapping used to turn abstract scale degrees into concrete notes, and the
//! 1V/octave conversion used for the pitch CV output. Everything here is a
//! pure function over static data; no state, no allocation.

/// Number of scales in the library.
pub const NUM_SCALES: usize = 24;

/// Musical scales available for quantizing generated patterns.
///
/// The first seven are the diatonic modes; the rest are harmonic/melodic
/// variants, exotic scales, and pentatonics common in acid and techno
/// basslines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Major,
    Minor,
    Dorian,
    Mixolydian,
    Lydian,
    Phrygian,
    Locrian,
    HarmonicMinor,
    HarmonicMajor,
    DorianSharp4,
    PhrygianDominant,
    MelodicMinor,
    LydianAugmented,
    LydianDominant,
    HungarianMinor,
    SuperLocrian,
    Spanish,
    Bhairav,
    PentatonicMinor,
    PentatonicMajor,
    BluesMinor,
    WholeTone,
    Chromatic,
    JapaneseInSen,
}

impl Scale {
    /// All scales in index order. The order is part of the external
    /// contract: hosts address scales by index 0..23.
    pub const ALL: [Scale; NUM_SCALES] = [
        Scale::Major,
        Scale::Minor,
        Scale::Dorian,
        Scale::Mixolydian,
        Scale::Lydian,
        Scale::Phrygian,
        Scale::Locrian,
        Scale::HarmonicMinor,
        Scale::HarmonicMajor,
        Scale::DorianSharp4,
        Scale::PhrygianDominant,
        Scale::MelodicMinor,
        Scale::LydianAugmented,
        Scale::LydianDominant,
        Scale::HungarianMinor,
        Scale::SuperLocrian,
        Scale::Spanish,
        Scale::Bhairav,
        Scale::PentatonicMinor,
        Scale::PentatonicMajor,
        Scale::BluesMinor,
        Scale::WholeTone,
        Scale::Chromatic,
        Scale::JapaneseInSen,
    ];

    /// Look up a scale by index, clamping out-of-range values to the last
    /// scale. Never panics regardless of host input.
    pub fn from_index(index: usize) -> Scale {
        Scale::ALL[index.min(NUM_SCALES - 1)]
    }

    /// The scale's position in [`Scale::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the semitone offsets for this scale, relative to the root.
    ///
    /// Offsets are non-decreasing and within `[0, 11]`; lengths range from
    /// 5 (pentatonics) to 12 (chromatic).
    pub fn intervals(self) -> &'static [i32] {
        match self {
            Scale::Major => &[0, 2, 4, 5, 7, 9, 11],
            Scale::Minor => &[0, 2, 3, 5, 7, 8, 10],
            Scale::Dorian => &[0, 2, 3, 5, 7, 9, 10],
            Scale::Mixolydian => &[0, 2, 4, 5, 7, 9, 10],
            Scale::Lydian => &[0, 2, 4, 6, 7, 9, 11],
            Scale::Phrygian => &[0, 1, 3, 5, 7, 8, 10],
            Scale::Locrian => &[0, 1, 3, 5, 6, 8, 10],
            Scale::HarmonicMinor => &[0, 2, 3, 5, 7, 8, 11],
            Scale::HarmonicMajor => &[0, 2, 4, 5, 7, 8, 11],
            Scale::DorianSharp4 => &[0, 2, 3, 6, 7, 9, 10],
            Scale::PhrygianDominant => &[0, 1, 4, 5, 7, 8, 10],
            Scale::MelodicMinor => &[0, 2, 3, 5, 7, 9, 11],
            Scale::LydianAugmented => &[0, 2, 4, 6, 8, 9, 11],
            Scale::LydianDominant => &[0, 2, 4, 6, 7, 9, 10],
            Scale::HungarianMinor => &[0, 2, 3, 6, 7, 8, 11],
            Scale::SuperLocrian => &[0, 1, 3, 4, 6, 8, 10],
            Scale::Spanish => &[0, 1, 4, 5, 7, 9, 10],
            Scale::Bhairav => &[0, 1, 4, 5, 7, 8, 11],
            Scale::PentatonicMinor => &[0, 3, 5, 7, 10],
            Scale::PentatonicMajor => &[0, 2, 4, 7, 9],
            Scale::BluesMinor => &[0, 3, 5, 6, 7, 10],
            Scale::WholeTone => &[0, 2, 4, 6, 8, 10],
            Scale::Chromatic => &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11],
            Scale::JapaneseInSen => &[0, 1, 5, 7, 10],
        }
    }

    /// Display name for UI collaborators.
    pub fn name(self) -> &'static str {
        match self {
            Scale::Major => "Major",
            Scale::Minor => "Minor",
            Scale::Dorian => "Dorian",
            Scale::Mixolydian => "Mixolydian",
            Scale::Lydian => "Lydian",
            Scale::Phrygian => "Phrygian",
            Scale::Locrian => "Locrian",
            Scale::HarmonicMinor => "Harmonic Minor",
            Scale::HarmonicMajor => "Harmonic Major",
            Scale::DorianSharp4 => "Dorian #4",
            Scale::PhrygianDominant => "Phrygian Dominant",
            Scale::MelodicMinor => "Melodic Minor",
            Scale::LydianAugmented => "Lydian Augmented",
            Scale::LydianDominant => "Lydian Dominant",
            Scale::HungarianMinor => "Hungarian Minor",
            Scale::SuperLocrian => "Super Locrian",
            Scale::Spanish => "Spanish",
            Scale::Bhairav => "Bhairav",
            Scale::PentatonicMinor => "Pentatonic Minor",
            Scale::PentatonicMajor => "Pentatonic Major",
            Scale::BluesMinor => "Blues Minor",
            Scale::WholeTone => "Whole Tone",
            Scale::Chromatic => "Chromatic",
            Scale::JapaneseInSen => "Japanese In-Sen",
        }
    }
}

impl Default for Scale {
    fn default() -> Self {
        Scale::Minor
    }
}

/// Convert a scale degree to a semitone offset from C of the reference
/// octave.
///
/// The degree may exceed the scale length; it wraps within the scale and
/// carries the overflow into extra octaves, so degree 7 of a 7-note scale
/// is the root one octave up.
///
/// `root` is in semitones from C (0 = C, 1 = C#, ...); `octave` shifts the
/// result in whole octaves.
pub fn degree_to_semitones(degree: usize, scale: Scale, root: i32, octave: i32) -> i32 {
    let intervals = scale.intervals();
    let len = intervals.len();

    let wrapped = degree % len;
    let carry = (degree / len) as i32;

    intervals[wrapped] + root + 12 * (octave + carry)
}

/// Convert a scale degree to a pitch control voltage.
///
/// Follows the 1V/octave standard with 0V = the root C of the reference
/// octave, so each semitone is 1/12 V.
pub fn degree_to_voct(degree: usize, scale: Scale, root: i32, octave: i32) -> f64 {
    degree_to_semitones(degree, scale, root, octave) as f64 / 12.0
}
