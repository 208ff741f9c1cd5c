//! In-memory parameter structures the codecs encode and decode.

use crate::colors::lookup_color;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of steps a rhythm mask can address.
pub const RHYTHM_STEPS: u8 = 16;

/// Editor bounds carried over from the device configurations. The codecs
/// only hard-enforce what the wire format can express (u8 count fields);
/// these are the ranges the firmware itself expects.
pub const MIN_SCALES: usize = 3;
pub const MAX_SCALES: usize = 32;
pub const MIN_RHYTHMS: usize = 3;
pub const MAX_RHYTHMS: usize = 64;
pub const MIN_BANKS: usize = 1;
pub const MAX_BANKS: usize = 32;
pub const MIN_SAMPLES_PER_BANK: usize = 3;
pub const MAX_SAMPLES_PER_BANK: usize = 32;

pub const DEFAULT_SEQUENCER_LENGTH: u8 = 16;

/// A musical scale: one bit per semitone of an octave, low 12 bits.
///
/// The name is cosmetic. Decoders resolve it by reverse lookup against the
/// known scale tables and fall back to "Custom" (or "Invalid" for an empty
/// mask); encoders ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Scale {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    pub semitones: u16,
}

/// A sequencer rhythm: one bit per step, low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rhythm {
    pub steps: u16,
}

impl Rhythm {
    pub fn new(steps: u16) -> Self {
        Self { steps }
    }

    fn bit(index: u8) -> u16 {
        assert!(index < RHYTHM_STEPS);
        // Step order is reversed relative to the mask's bit order.
        1 << (RHYTHM_STEPS - 1 - index)
    }

    /// Whether the given visual step is active.
    pub fn step(&self, index: u8) -> bool {
        self.steps & Self::bit(index) != 0
    }

    pub fn set_step(&mut self, index: u8, active: bool) {
        if active {
            self.steps |= Self::bit(index);
        } else {
            self.steps &= !Self::bit(index);
        }
    }
}

/// A bank display color. `real` is what the firmware stores and shows on
/// the hardware LED, `display` is the editor's screen approximation; both
/// are `#RRGGBB` strings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BankColor {
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub display: String,
    pub real: String,
}

impl BankColor {
    /// Resolves decoded RGB bytes against the fixed palette, falling back
    /// to a synthetic "Custom" entry for unknown values.
    pub fn from_rgb(rgb: [u8; 3]) -> Self {
        let hex = format!("#{:02X}{:02X}{:02X}", rgb[0], rgb[1], rgb[2]);
        match lookup_color(&hex) {
            Some(color) => Self {
                name: color.name.to_string(),
                display: color.display.to_string(),
                real: color.real.to_string(),
            },
            None => Self {
                name: "Custom".to_string(),
                display: hex.clone(),
                real: hex,
            },
        }
    }

    /// The RGB bytes stored on the wire. Malformed hex falls back to white.
    pub fn rgb(&self) -> [u8; 3] {
        parse_hex_color(&self.real).unwrap_or([0xFF, 0xFF, 0xFF])
    }
}

fn parse_hex_color(hex: &str) -> Option<[u8; 3]> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// A mono or stereo PCM clip. `data` holds raw samples (interleaved when
/// stereo) at the image-wide bit depth.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sample {
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub stereo: bool,
    pub data: Vec<i16>,
}

impl Sample {
    pub fn channels(&self) -> u8 {
        if self.stereo {
            2
        } else {
            1
        }
    }

    /// Number of per-channel frames in the clip.
    pub fn frame_count(&self) -> usize {
        self.data.len() / self.channels() as usize
    }
}

/// A named, colored group of samples (Wave Bard only).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bank {
    #[cfg_attr(feature = "serde", serde(default))]
    pub label: String,
    pub color: BankColor,
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlchemistParams {
    pub scales: Vec<Scale>,
    pub rhythms: Vec<Rhythm>,
    #[cfg_attr(feature = "serde", serde(default = "default_sequencer_length"))]
    pub sequencer_length: u8,
    /// Fixed delay ratio baked into the firmware. Writers always emit the
    /// constants; readers report what the image declared.
    #[cfg_attr(feature = "serde", serde(default = "default_fx_delay_n"))]
    pub fx_delay_n: u8,
    #[cfg_attr(feature = "serde", serde(default = "default_fx_delay_d"))]
    pub fx_delay_d: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FxWizardParams {
    pub rhythms: Vec<Rhythm>,
    #[cfg_attr(feature = "serde", serde(default = "default_sequencer_length"))]
    pub sequencer_length: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WaveBardParams {
    pub sample_rate: u32,
    pub bit_depth: u8,
    #[cfg_attr(feature = "serde", serde(default = "default_sequencer_length"))]
    pub sequencer_length: u8,
    pub scales: Vec<Scale>,
    pub rhythms: Vec<Rhythm>,
    pub banks: Vec<Bank>,
}

/// Parameters decoded from an image of any known device variant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "device", rename_all = "snake_case"))]
pub enum DeviceParams {
    Alchemist(AlchemistParams),
    FxWizard(FxWizardParams),
    WaveBard(WaveBardParams),
}

#[cfg(feature = "serde")]
fn default_sequencer_length() -> u8 {
    DEFAULT_SEQUENCER_LENGTH
}

#[cfg(feature = "serde")]
fn default_fx_delay_n() -> u8 {
    crate::devices::alchemist::FX_DELAY_NUMERATOR
}

#[cfg(feature = "serde")]
fn default_fx_delay_d() -> u8 {
    crate::devices::alchemist::FX_DELAY_DENOMINATOR
}
