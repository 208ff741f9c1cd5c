//! Payload codec for the Kastle 2 Alchemist.
//!
//! Header (20 bytes): magic "k2ac", u32 total size, scale count, rhythm
//! count, sequencer length, the fixed delay ratio, zero padding. Body:
//! scales then rhythms.

use crate::cursor::{ByteReader, ByteWriter};
use crate::envelope::{
    check_count, read_rhythms, read_scales, write_rhythms, write_scales, PayloadError,
    PayloadFormat, END_MARKER, HEADER_SIZE,
};
use crate::params::AlchemistParams;
use crate::scales::ALCHEMIST_SCALES;

/// Delay ratio baked into the firmware; not user-editable.
pub const FX_DELAY_NUMERATOR: u8 = 3;
pub const FX_DELAY_DENOMINATOR: u8 = 2;

pub struct Alchemist;

pub struct AlchemistHeader {
    scale_count: u8,
    rhythm_count: u8,
    sequencer_length: u8,
    fx_delay_n: u8,
    fx_delay_d: u8,
}

impl PayloadFormat for Alchemist {
    type Params = AlchemistParams;
    type Header = AlchemistHeader;

    const MAGIC: [u8; 4] = *b"k2ac";

    fn payload_size(&self, params: &Self::Params) -> Result<usize, PayloadError> {
        check_count("scales", params.scales.len())?;
        check_count("rhythms", params.rhythms.len())?;
        Ok(HEADER_SIZE
            + params.scales.len() * 4
            + params.rhythms.len() * 4
            + END_MARKER.len())
    }

    fn write_header(
        &self,
        w: &mut ByteWriter,
        params: &Self::Params,
        total_size: u32,
    ) -> Result<(), PayloadError> {
        w.write_u32(total_size);
        w.write_u8(check_count("scales", params.scales.len())?);
        w.write_u8(check_count("rhythms", params.rhythms.len())?);
        w.write_u8(params.sequencer_length);
        w.write_u8(FX_DELAY_NUMERATOR);
        w.write_u8(FX_DELAY_DENOMINATOR);
        Ok(())
    }

    fn write_body(&self, w: &mut ByteWriter, params: &Self::Params) -> Result<(), PayloadError> {
        write_scales(w, &params.scales);
        write_rhythms(w, &params.rhythms);
        Ok(())
    }

    fn read_header(&self, r: &mut ByteReader) -> Result<Self::Header, PayloadError> {
        let _total_size = r.read_u32()?;
        Ok(AlchemistHeader {
            scale_count: r.read_u8()?,
            rhythm_count: r.read_u8()?,
            sequencer_length: r.read_u8()?,
            fx_delay_n: r.read_u8()?,
            fx_delay_d: r.read_u8()?,
        })
    }

    fn read_body(
        &self,
        r: &mut ByteReader,
        header: &Self::Header,
    ) -> Result<Self::Params, PayloadError> {
        let scales = read_scales(r, header.scale_count as usize, ALCHEMIST_SCALES)?;
        let rhythms = read_rhythms(r, header.rhythm_count as usize)?;
        Ok(AlchemistParams {
            scales,
            rhythms,
            sequencer_length: header.sequencer_length,
            fx_delay_n: header.fx_delay_n,
            fx_delay_d: header.fx_delay_d,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decode_payload, encode_payload};
    use crate::params::{Rhythm, Scale};

    fn scale(semitones: u16) -> Scale {
        Scale {
            name: String::new(),
            semitones,
        }
    }

    fn example_params() -> AlchemistParams {
        AlchemistParams {
            scales: vec![
                scale(0b100110101101),
                scale(0b010110101011),
                scale(0b010110101101),
            ],
            rhythms: vec![Rhythm::new(0b1000000010000000); 3],
            sequencer_length: 16,
            fx_delay_n: FX_DELAY_NUMERATOR,
            fx_delay_d: FX_DELAY_DENOMINATOR,
        }
    }

    #[test]
    fn encoded_layout_matches_format() {
        let payload = encode_payload(&Alchemist, &example_params()).unwrap();

        // 20 header + 3 scales + 3 rhythms + end marker
        assert_eq!(payload.len(), 20 + 3 * 4 + 3 * 4 + 4);
        assert_eq!(&payload[0..4], b"k2ac");
        assert_eq!(payload[4], 48); // declared total size, little-endian
        assert_eq!(&payload[5..8], &[0, 0, 0]);
        assert_eq!(payload[8], 3); // scale count
        assert_eq!(payload[9], 3); // rhythm count
        assert_eq!(payload[10], 16); // sequencer length
        assert_eq!(payload[11], 3); // delay numerator
        assert_eq!(payload[12], 2); // delay denominator
        assert_eq!(&payload[13..20], &[0; 7]); // header padding
        assert_eq!(&payload[44..48], b"ahoj");
    }

    #[test]
    fn round_trip() {
        let params = example_params();
        let payload = encode_payload(&Alchemist, &params).unwrap();
        let decoded = decode_payload(&Alchemist, &payload).unwrap();

        assert_eq!(decoded.sequencer_length, params.sequencer_length);
        assert_eq!(decoded.rhythms, params.rhythms);
        assert_eq!(decoded.fx_delay_n, FX_DELAY_NUMERATOR);
        assert_eq!(decoded.fx_delay_d, FX_DELAY_DENOMINATOR);

        let masks: Vec<u16> = decoded.scales.iter().map(|s| s.semitones).collect();
        assert_eq!(masks, vec![0b100110101101, 0b010110101011, 0b010110101101]);

        assert_eq!(decoded.scales[0].name, "Hungarian Minor");
        assert_eq!(decoded.scales[1].name, "Phrygian");
        assert_eq!(decoded.scales[2].name, "Aeolian");
    }

    #[test]
    fn scale_masks_are_clamped_to_12_bits() {
        let mut params = example_params();
        params.scales[0].semitones = 0xF123;
        let payload = encode_payload(&Alchemist, &params).unwrap();

        // Only the low 12 bits reach the wire.
        assert_eq!(&payload[20..24], &0x0123u32.to_le_bytes());

        let decoded = decode_payload(&Alchemist, &payload).unwrap();
        assert_eq!(decoded.scales[0].semitones, 0x0123);
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut payload = encode_payload(&Alchemist, &example_params()).unwrap();
        payload[..4].copy_from_slice(b"k2fx");
        assert_eq!(
            decode_payload(&Alchemist, &payload).unwrap_err(),
            PayloadError::BadMagic {
                expected: *b"k2ac",
                actual: *b"k2fx",
            }
        );
    }

    #[test]
    fn wrong_end_marker_is_rejected() {
        let mut payload = encode_payload(&Alchemist, &example_params()).unwrap();
        let len = payload.len();
        payload[len - 1] = b'!';
        assert_eq!(
            decode_payload(&Alchemist, &payload).unwrap_err(),
            PayloadError::BadEndMarker { actual: *b"aho!" }
        );
    }

    #[test]
    fn trailing_bytes_after_end_marker_are_ignored() {
        let mut payload = encode_payload(&Alchemist, &example_params()).unwrap();
        payload.extend_from_slice(&[0xFF; 1024]);
        assert!(decode_payload(&Alchemist, &payload).is_ok());
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let payload = encode_payload(&Alchemist, &example_params()).unwrap();
        let err = decode_payload(&Alchemist, &payload[..30]).unwrap_err();
        assert!(matches!(err, PayloadError::UnexpectedEof { .. }));
    }
}
