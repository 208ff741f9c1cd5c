//! Binary codec for Kastle 2 firmware images.
//!
//! Two layers:
//!
//! - [`uf2`]: the block transport. Firmware travels as 512-byte UF2 blocks;
//!   this layer rebuilds flat images from block streams, wraps flat buffers
//!   into streams, merges streams and validates them.
//! - [`envelope`] + [`devices`]: the device payloads. User-edited
//!   parameters (scales, rhythms, sample banks) are encoded into a framed
//!   payload that lives in the user data region of the flash image. Three
//!   variants share the framing: Alchemist, FX Wizard and Wave Bard.
//!
//! Typical write path: [`envelope::encode_payload`] →
//! [`uf2::write_blocks`] at [`devices::USER_DATA_BEGIN`] →
//! [`uf2::merge_blocks`] with the base firmware → [`uf2::validate`].
//! Read path: [`uf2::read_image`] → [`user_data_region`] →
//! [`decode_user_data`].
//!
//! All operations are pure, synchronous transformations over byte buffers;
//! nothing retries, logs-and-continues, or holds global state.

pub mod colors;
pub mod cursor;
pub mod devices;
pub mod envelope;
pub mod params;
pub mod scales;
pub mod uf2;

use crate::devices::{Alchemist, FxWizard, WaveBard, PROGRAM_MAX_SIZE};
use crate::envelope::{decode_payload, PayloadError, PayloadFormat};
use crate::params::DeviceParams;

pub use crate::envelope::encode_payload;
pub use crate::uf2::Uf2Error;

/// Slices the user data region out of a flat firmware image, i.e.
/// everything past the space reserved for the program itself. Returns
/// `None` for images shorter than the program region.
pub fn user_data_region(image: &[u8]) -> Option<&[u8]> {
    image.get(PROGRAM_MAX_SIZE..)
}

/// Decodes a user data payload of any known device variant, dispatching on
/// the magic header.
pub fn decode_user_data(payload: &[u8]) -> Result<DeviceParams, PayloadError> {
    let magic: [u8; 4] = payload
        .get(..4)
        .and_then(|m| m.try_into().ok())
        .ok_or(PayloadError::UnexpectedEof {
            offset: 0,
            wanted: 4,
        })?;

    match magic {
        Alchemist::MAGIC => decode_payload(&Alchemist, payload).map(DeviceParams::Alchemist),
        FxWizard::MAGIC => decode_payload(&FxWizard, payload).map(DeviceParams::FxWizard),
        WaveBard::MAGIC => decode_payload(&WaveBard, payload).map(DeviceParams::WaveBard),
        _ => Err(PayloadError::UnknownDevice { magic }),
    }
}
