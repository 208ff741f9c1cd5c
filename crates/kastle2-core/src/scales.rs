//! Known scale tables and reverse name lookup.
//!
//! Each device family ships a small table of its own plus the shared one;
//! decoding resolves a semitone mask to a display name. The mask values
//! mirror the firmware's parameter maps.

/// A scale with a fixed, known bit pattern.
#[derive(Debug, Clone, Copy)]
pub struct KnownScale {
    pub name: &'static str,
    pub semitones: u16,
}

const fn scale(name: &'static str, semitones: u16) -> KnownScale {
    KnownScale { name, semitones }
}

pub static SHARED_SCALES: &[KnownScale] = &[
    scale("Octave", 0b000000000001),
    scale("Harmonic Minor", 0b110110110101),
    scale("Melodic Minor (Ascending)", 0b101110110101),
    scale("Dorian Electra", 0b011110110101),
    scale("Phrygian", 0b010111010101),
    scale("Lydian", 0b101011110101),
    scale("Mixolydian", 0b101110010101),
    scale("Locrian", 0b010111011001),
    scale("Whole Tone", 0b101001001011),
    scale("Blues", 0b010011101001),
    scale("Bebop Minor", 0b011110111101),
    scale("Hungarian Minor", 0b110111010101),
    scale("Neapolitan Major", 0b101111010011),
    scale("Neapolitan Minor", 0b110111010011),
    scale("Pentatonic", 0b001010010101),
    scale("Dorian", 0b011010101101),
    scale("Locrian", 0b010101101011),
    // Common chords
    scale("Diminished", 0b000010010010),
    scale("Augmented", 0b000100010001),
    scale("Suspended 2", 0b000010100001),
    scale("Suspended 4", 0b000010010101),
    scale("Major 7", 0b100010010001),
    scale("Minor 7", 0b010010010001),
    scale("Diminished 7", 0b100010010010),
    scale("Half-Diminished", 0b010010010010),
    scale("Minor 6", 0b001010010001),
    scale("Minor 9", 0b010010110001),
    scale("Add9", 0b000010110001),
    // Rare chords
    scale("Dominant 11", 0b010110110001),
    scale("Dominant 13", 0b011110110001),
    scale("Diminished Whole Tone (7♯9♯5)", 0b011100110101),
    scale("Augmented Major 7", 0b100100010001),
    scale("Augmented Minor 7", 0b010100010001),
    scale("Suspended 7 (7sus4)", 0b010010010101),
    scale("Hendrix Chord (7♯9)", 0b010010110101),
    scale("Phrygian Chord", 0b010011010001),
    scale("Neapolitan Chord", 0b000110000001),
    scale("Italian Augmented", 0b000110010001),
    scale("German Augmented", 0b010110010001),
    scale("Mystic Chord", 0b101010011011),
    scale("Whole Tone Chord", 0b101010010101),
    scale("Quartal Chord", 0b000110010101),
    scale("So What Chord", 0b001110010101),
];

// Should match the Alchemist firmware: AlchemistParameterMaps.h
pub static ALCHEMIST_SCALES: &[KnownScale] = &[
    scale("Hungarian Minor", 0b100110101101),
    scale("Phrygian", 0b010110101011),
    scale("Aeolian", 0b010110101101),
    scale("Chromatic", 0b111111111111),
    scale("Ionian", 0b101010110101),
    scale("Lydian", 0b101011010101),
    scale("Wholetone", 0b010101010101),
];

pub static WAVE_BARD_SCALES: &[KnownScale] = &[
    scale("Minor Chord", 0b000010001001),
    scale("Minor Pentatonic", 0b010010101001),
    scale("Minor Diatonic", 0b010110101101),
    scale("Chromatic", 0b111111111111),
    scale("Major Diatonic", 0b101010110101),
    scale("Major Pentatonic", 0b001010010101),
    scale("Major Chord", 0b000010010001),
];

/// Resolves a semitone mask to a display name: the device table is searched
/// first, then the shared table. Unmatched masks become "Custom", an empty
/// mask "Invalid"; neither is an error.
pub fn scale_name(semitones: u16, device_scales: &[KnownScale]) -> &'static str {
    if semitones == 0 {
        return "Invalid";
    }
    device_scales
        .iter()
        .chain(SHARED_SCALES)
        .find(|s| s.semitones == semitones)
        .map(|s| s.name)
        .unwrap_or("Custom")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_table_wins_over_shared() {
        assert_eq!(scale_name(0b111111111111, ALCHEMIST_SCALES), "Chromatic");
        assert_eq!(scale_name(0b100110101101, ALCHEMIST_SCALES), "Hungarian Minor");
    }

    #[test]
    fn shared_table_is_searched_second() {
        assert_eq!(scale_name(0b010011101001, ALCHEMIST_SCALES), "Blues");
        assert_eq!(scale_name(0b010011101001, WAVE_BARD_SCALES), "Blues");
    }

    #[test]
    fn unknown_mask_is_custom() {
        assert_eq!(scale_name(0b101010101010, WAVE_BARD_SCALES), "Custom");
    }

    #[test]
    fn empty_mask_is_invalid() {
        assert_eq!(scale_name(0, ALCHEMIST_SCALES), "Invalid");
    }
}
