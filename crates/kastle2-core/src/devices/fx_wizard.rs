//! Payload codec for the Kastle 2 FX Wizard.
//!
//! Header (20 bytes): magic "k2fx", u32 total size, rhythm count, sequencer
//! length, zero padding. Body: rhythms only; the device has no scales.

use crate::cursor::{ByteReader, ByteWriter};
use crate::envelope::{
    check_count, read_rhythms, write_rhythms, PayloadError, PayloadFormat, END_MARKER,
    HEADER_SIZE,
};
use crate::params::FxWizardParams;

pub struct FxWizard;

pub struct FxWizardHeader {
    rhythm_count: u8,
    sequencer_length: u8,
}

impl PayloadFormat for FxWizard {
    type Params = FxWizardParams;
    type Header = FxWizardHeader;

    const MAGIC: [u8; 4] = *b"k2fx";

    fn payload_size(&self, params: &Self::Params) -> Result<usize, PayloadError> {
        check_count("rhythms", params.rhythms.len())?;
        Ok(HEADER_SIZE + params.rhythms.len() * 4 + END_MARKER.len())
    }

    fn write_header(
        &self,
        w: &mut ByteWriter,
        params: &Self::Params,
        total_size: u32,
    ) -> Result<(), PayloadError> {
        w.write_u32(total_size);
        w.write_u8(check_count("rhythms", params.rhythms.len())?);
        w.write_u8(params.sequencer_length);
        Ok(())
    }

    fn write_body(&self, w: &mut ByteWriter, params: &Self::Params) -> Result<(), PayloadError> {
        write_rhythms(w, &params.rhythms);
        Ok(())
    }

    fn read_header(&self, r: &mut ByteReader) -> Result<Self::Header, PayloadError> {
        let _total_size = r.read_u32()?;
        Ok(FxWizardHeader {
            rhythm_count: r.read_u8()?,
            sequencer_length: r.read_u8()?,
        })
    }

    fn read_body(
        &self,
        r: &mut ByteReader,
        header: &Self::Header,
    ) -> Result<Self::Params, PayloadError> {
        let rhythms = read_rhythms(r, header.rhythm_count as usize)?;
        Ok(FxWizardParams {
            rhythms,
            sequencer_length: header.sequencer_length,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decode_payload, encode_payload};
    use crate::params::Rhythm;

    #[test]
    fn round_trip() {
        let params = FxWizardParams {
            rhythms: vec![
                Rhythm::new(0b1000100010001000),
                Rhythm::new(0b1010101010101010),
                Rhythm::new(0b1111000011110000),
            ],
            sequencer_length: 32,
        };
        let payload = encode_payload(&FxWizard, &params).unwrap();
        assert_eq!(payload.len(), 20 + 3 * 4 + 4);
        assert_eq!(&payload[0..4], b"k2fx");
        assert_eq!(payload[8], 3); // rhythm count
        assert_eq!(payload[9], 32); // sequencer length

        let decoded = decode_payload(&FxWizard, &payload).unwrap();
        assert_eq!(decoded, params);
    }

    #[test]
    fn rhythm_count_over_header_field_fails() {
        let params = FxWizardParams {
            rhythms: vec![Rhythm::new(0b1010101010101010); 300],
            sequencer_length: 16,
        };
        assert_eq!(
            encode_payload(&FxWizard, &params).unwrap_err(),
            PayloadError::TooManyElements {
                what: "rhythms",
                count: 300,
                max: 255,
            }
        );
    }

    #[test]
    fn empty_rhythm_list_still_frames() {
        let params = FxWizardParams {
            rhythms: Vec::new(),
            sequencer_length: 16,
        };
        let payload = encode_payload(&FxWizard, &params).unwrap();
        assert_eq!(payload.len(), 24);
        assert_eq!(&payload[20..24], b"ahoj");
        assert_eq!(decode_payload(&FxWizard, &payload).unwrap(), params);
    }
}
