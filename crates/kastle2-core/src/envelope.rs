//! Generic payload envelope shared by all Kastle 2 device formats.
//!
//! Every device payload is framed the same way: a 4-byte ASCII magic
//! identifying the variant, a 20-byte header with a declared total size and
//! element counts, a device-specific body, and a fixed end marker. The
//! device formats plug into [`PayloadFormat`]; [`encode_payload`] and
//! [`decode_payload`] drive the framing.

use crate::cursor::{ByteReader, ByteWriter};
use crate::params::{Rhythm, Scale};
use crate::scales::{scale_name, KnownScale};
use log::debug;
use thiserror::Error;

/// Structural end marker closing every payload. A sanity check, not a
/// checksum.
pub const END_MARKER: [u8; 4] = *b"ahoj";

/// Fixed header region size, magic included, for all current devices.
pub const HEADER_SIZE: usize = 20;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("wrong magic header (expected {}, got {})", String::from_utf8_lossy(.expected), String::from_utf8_lossy(.actual))]
    BadMagic { expected: [u8; 4], actual: [u8; 4] },
    #[error("missing or wrong end marker (got {})", String::from_utf8_lossy(.actual))]
    BadEndMarker { actual: [u8; 4] },
    #[error("payload truncated at offset {offset} ({wanted} more bytes needed)")]
    UnexpectedEof { offset: usize, wanted: usize },
    #[error("{count} {what} exceed the format limit of {max}")]
    TooManyElements {
        what: &'static str,
        count: usize,
        max: usize,
    },
    #[error("all banks must hold the same number of samples (expected {expected}, got {actual})")]
    InconsistentBankSizes { expected: usize, actual: usize },
    #[error("could not determine data length of sample {label:?} from stored length {stored}")]
    UndeterminedSampleLength { label: String, stored: u32 },
    #[error("unsupported bit depth {0}")]
    UnsupportedBitDepth(u8),
    #[error("no device format matches magic {}", String::from_utf8_lossy(.magic))]
    UnknownDevice { magic: [u8; 4] },
}

/// A device-specific payload schema on top of the shared framing.
///
/// `read_header` consumes the header fields after the magic; the driver
/// then seeks to [`Self::HEADER_SIZE`] so formats with reserved trailing
/// header bytes do not have to read them.
pub trait PayloadFormat {
    type Params;
    type Header;

    const MAGIC: [u8; 4];
    const HEADER_SIZE: usize = HEADER_SIZE;

    /// Exact encoded size of `params`, header and end marker included.
    fn payload_size(&self, params: &Self::Params) -> Result<usize, PayloadError>;

    /// Writes the header fields following the magic. `total_size` is the
    /// value of [`Self::payload_size`] for the same params.
    fn write_header(
        &self,
        w: &mut ByteWriter,
        params: &Self::Params,
        total_size: u32,
    ) -> Result<(), PayloadError>;

    fn write_body(&self, w: &mut ByteWriter, params: &Self::Params) -> Result<(), PayloadError>;

    fn read_header(&self, r: &mut ByteReader) -> Result<Self::Header, PayloadError>;

    fn read_body(
        &self,
        r: &mut ByteReader,
        header: &Self::Header,
    ) -> Result<Self::Params, PayloadError>;
}

/// Encodes `params` into a device payload buffer.
pub fn encode_payload<F: PayloadFormat>(
    format: &F,
    params: &F::Params,
) -> Result<Vec<u8>, PayloadError> {
    let total_size = format.payload_size(params)?;

    let mut w = ByteWriter::with_capacity(total_size);
    w.write_bytes(&F::MAGIC);
    format.write_header(&mut w, params, total_size as u32)?;
    w.pad_to(F::HEADER_SIZE);
    format.write_body(&mut w, params)?;
    w.write_bytes(&END_MARKER);

    let buf = w.into_inner();
    debug!("encoded {} payload: {} bytes", String::from_utf8_lossy(&F::MAGIC), buf.len());
    debug_assert_eq!(buf.len(), total_size);
    Ok(buf)
}

/// Decodes a device payload buffer back into parameters.
///
/// Trailing bytes after the end marker are ignored; the user data region
/// sliced out of a flash image is typically much larger than the payload.
pub fn decode_payload<F: PayloadFormat>(
    format: &F,
    payload: &[u8],
) -> Result<F::Params, PayloadError> {
    let mut r = ByteReader::new(payload);

    let magic: [u8; 4] = r.read_array()?;
    if magic != F::MAGIC {
        return Err(PayloadError::BadMagic {
            expected: F::MAGIC,
            actual: magic,
        });
    }

    let header = format.read_header(&mut r)?;
    r.seek_to(F::HEADER_SIZE)?;
    let params = format.read_body(&mut r, &header)?;

    let marker: [u8; 4] = r.read_array()?;
    if marker != END_MARKER {
        return Err(PayloadError::BadEndMarker { actual: marker });
    }
    Ok(params)
}

// Shared field codecs. Scales and rhythms are 4-byte little-endian
// elements on the wire for every device.

pub(crate) fn write_scales(w: &mut ByteWriter, scales: &[Scale]) {
    for scale in scales {
        w.write_u32(scale.semitones as u32 & 0x0FFF);
    }
}

pub(crate) fn read_scales(
    r: &mut ByteReader,
    count: usize,
    device_scales: &'static [KnownScale],
) -> Result<Vec<Scale>, PayloadError> {
    let mut scales = Vec::with_capacity(count);
    for _ in 0..count {
        let semitones = (r.read_u32()? & 0x0FFF) as u16;
        scales.push(Scale {
            name: scale_name(semitones, device_scales).to_string(),
            semitones,
        });
    }
    Ok(scales)
}

pub(crate) fn write_rhythms(w: &mut ByteWriter, rhythms: &[Rhythm]) {
    for rhythm in rhythms {
        w.write_u32(rhythm.steps as u32);
    }
}

pub(crate) fn read_rhythms(r: &mut ByteReader, count: usize) -> Result<Vec<Rhythm>, PayloadError> {
    let mut rhythms = Vec::with_capacity(count);
    for _ in 0..count {
        rhythms.push(Rhythm {
            steps: (r.read_u32()? & 0xFFFF) as u16,
        });
    }
    Ok(rhythms)
}

/// Checks that an element count fits the u8 header field it is declared in.
pub(crate) fn check_count(what: &'static str, count: usize) -> Result<u8, PayloadError> {
    u8::try_from(count).map_err(|_| PayloadError::TooManyElements {
        what,
        count,
        max: u8::MAX as usize,
    })
}
