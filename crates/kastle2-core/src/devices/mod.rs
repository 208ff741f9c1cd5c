//! Device payload formats for the Kastle 2 family.
//!
//! All variants run on the same RP2040-based board, so they share the UF2
//! family id and flash layout; they differ in the payload schema stored in
//! the user data region.

pub mod alchemist;
pub mod fx_wizard;
pub mod wave_bard;

pub use alchemist::Alchemist;
pub use fx_wizard::FxWizard;
pub use wave_bard::WaveBard;

/// UF2 family id of every Kastle 2 variant (RP2040).
pub const KASTLE2_FAMILY_ID: u32 = 0xE48BFF56;

/// Flash address where the user data payload begins.
pub const USER_DATA_BEGIN: u32 = 0x1008_0000;

/// Bytes reserved for the firmware program itself; the user data region of
/// a flat image starts at this offset.
pub const PROGRAM_MAX_SIZE: usize = 0x0008_0000;
