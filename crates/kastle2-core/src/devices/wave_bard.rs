//! Payload codec for the Kastle 2 Wave Bard.
//!
//! Header (20 bytes): magic "k2wb", u32 total size, u32 sample rate, bit
//! depth, bank count, samples per bank, scale count, rhythm count,
//! sequencer length, two reserved bytes. Body: scales, rhythms, then per
//! bank an 8-byte label, RGB color and its samples. Sample data is raw
//! little-endian PCM padded to a 4-byte boundary; the stored length is the
//! padded one, so decoding recovers the real length by trial subtraction.

use crate::cursor::{ByteReader, ByteWriter};
use crate::envelope::{
    check_count, read_rhythms, read_scales, write_rhythms, write_scales, PayloadError,
    PayloadFormat, END_MARKER, HEADER_SIZE,
};
use crate::params::{Bank, BankColor, Sample, WaveBardParams};
use crate::scales::WAVE_BARD_SCALES;
use log::debug;

/// The only bit depth the current firmware understands.
pub const SUPPORTED_BIT_DEPTH: u8 = 16;

const LABEL_LEN: usize = 8;
const BANK_HEADER_LEN: usize = LABEL_LEN + 4; // label + RGB + reserved
const SAMPLE_HEADER_LEN: usize = 4 + 1 + LABEL_LEN + 3; // length + channels + label + reserved

pub struct WaveBard;

pub struct WaveBardHeader {
    sample_rate: u32,
    bit_depth: u8,
    bank_count: u8,
    samples_per_bank: u8,
    scale_count: u8,
    rhythm_count: u8,
    sequencer_length: u8,
}

/// Minimal padding that rounds `len` up to a 4-byte boundary.
fn pad4(len: usize) -> usize {
    (4 - (len % 4)) % 4
}

fn bytes_per_sample(bit_depth: u8) -> Result<usize, PayloadError> {
    if bit_depth != SUPPORTED_BIT_DEPTH {
        return Err(PayloadError::UnsupportedBitDepth(bit_depth));
    }
    Ok(bit_depth as usize / 8)
}

/// Every bank must hold the same number of samples; the count is declared
/// once in the header.
fn samples_per_bank(banks: &[Bank]) -> Result<usize, PayloadError> {
    let expected = banks.first().map(|b| b.samples.len()).unwrap_or(0);
    for bank in banks {
        if bank.samples.len() != expected {
            return Err(PayloadError::InconsistentBankSizes {
                expected,
                actual: bank.samples.len(),
            });
        }
    }
    Ok(expected)
}

fn stored_sample_len(sample: &Sample, bps: usize) -> usize {
    let raw = sample.data.len() * bps;
    raw + pad4(raw)
}

impl PayloadFormat for WaveBard {
    type Params = WaveBardParams;
    type Header = WaveBardHeader;

    const MAGIC: [u8; 4] = *b"k2wb";

    fn payload_size(&self, params: &Self::Params) -> Result<usize, PayloadError> {
        let bps = bytes_per_sample(params.bit_depth)?;
        check_count("scales", params.scales.len())?;
        check_count("rhythms", params.rhythms.len())?;
        check_count("banks", params.banks.len())?;
        check_count("samples per bank", samples_per_bank(&params.banks)?)?;

        let mut total = HEADER_SIZE;
        total += params.scales.len() * 4;
        total += params.rhythms.len() * 4;
        for bank in &params.banks {
            total += BANK_HEADER_LEN;
            for sample in &bank.samples {
                total += SAMPLE_HEADER_LEN + stored_sample_len(sample, bps);
            }
        }
        Ok(total + END_MARKER.len())
    }

    fn write_header(
        &self,
        w: &mut ByteWriter,
        params: &Self::Params,
        total_size: u32,
    ) -> Result<(), PayloadError> {
        w.write_u32(total_size);
        w.write_u32(params.sample_rate);
        w.write_u8(params.bit_depth);
        w.write_u8(check_count("banks", params.banks.len())?);
        w.write_u8(check_count(
            "samples per bank",
            samples_per_bank(&params.banks)?,
        )?);
        w.write_u8(check_count("scales", params.scales.len())?);
        w.write_u8(check_count("rhythms", params.rhythms.len())?);
        w.write_u8(params.sequencer_length);
        w.write_u8(0); // reserved
        w.write_u8(0); // reserved
        Ok(())
    }

    fn write_body(&self, w: &mut ByteWriter, params: &Self::Params) -> Result<(), PayloadError> {
        let bps = bytes_per_sample(params.bit_depth)?;

        write_scales(w, &params.scales);
        write_rhythms(w, &params.rhythms);

        for bank in &params.banks {
            w.write_label(&bank.label, LABEL_LEN);
            let [r, g, b] = bank.color.rgb();
            w.write_u8(r);
            w.write_u8(g);
            w.write_u8(b);
            w.write_u8(0); // reserved

            for sample in &bank.samples {
                let raw = sample.data.len() * bps;
                let stored = stored_sample_len(sample, bps);
                w.write_u32(stored as u32);
                w.write_u8(sample.channels());
                w.write_label(&sample.label, LABEL_LEN);
                w.write_u8(0); // reserved
                w.write_u8(0); // reserved
                w.write_u8(0); // reserved
                for &value in &sample.data {
                    w.write_i16(value);
                }
                for _ in raw..stored {
                    w.write_u8(0);
                }
            }
        }
        Ok(())
    }

    fn read_header(&self, r: &mut ByteReader) -> Result<Self::Header, PayloadError> {
        let _total_size = r.read_u32()?;
        let header = WaveBardHeader {
            sample_rate: r.read_u32()?,
            bit_depth: r.read_u8()?,
            bank_count: r.read_u8()?,
            samples_per_bank: r.read_u8()?,
            scale_count: r.read_u8()?,
            rhythm_count: r.read_u8()?,
            sequencer_length: r.read_u8()?,
        };
        r.skip(2)?; // reserved
        Ok(header)
    }

    fn read_body(
        &self,
        r: &mut ByteReader,
        header: &Self::Header,
    ) -> Result<Self::Params, PayloadError> {
        let bps = bytes_per_sample(header.bit_depth)?;

        let scales = read_scales(r, header.scale_count as usize, WAVE_BARD_SCALES)?;
        let rhythms = read_rhythms(r, header.rhythm_count as usize)?;

        let mut banks = Vec::with_capacity(header.bank_count as usize);
        for _ in 0..header.bank_count {
            let label = r.read_label(LABEL_LEN)?;
            let color = BankColor::from_rgb([r.read_u8()?, r.read_u8()?, r.read_u8()?]);
            r.skip(1)?; // reserved

            let mut samples = Vec::with_capacity(header.samples_per_bank as usize);
            for _ in 0..header.samples_per_bank {
                samples.push(read_sample(r, bps)?);
            }
            banks.push(Bank {
                label,
                color,
                samples,
            });
        }

        debug!(
            "decoded wave bard payload: {} banks, {} scales, {} rhythms",
            banks.len(),
            scales.len(),
            rhythms.len()
        );

        Ok(WaveBardParams {
            sample_rate: header.sample_rate,
            bit_depth: header.bit_depth,
            sequencer_length: header.sequencer_length,
            scales,
            rhythms,
            banks,
        })
    }
}

fn read_sample(r: &mut ByteReader, bps: usize) -> Result<Sample, PayloadError> {
    let stored = r.read_u32()? as usize;
    let channels = r.read_u8()?;
    let label = r.read_label(LABEL_LEN)?;
    r.skip(3)?; // reserved

    // The stored length comes off the wire; reject it before sizing any
    // allocation by it.
    if stored > r.remaining() {
        return Err(PayloadError::UnexpectedEof {
            offset: r.position(),
            wanted: stored,
        });
    }

    // The stored length includes 0-3 padding bytes; recover the real data
    // length by trying each candidate.
    let mut data_len = None;
    for candidate in (stored.saturating_sub(3)..=stored).rev() {
        if candidate % bps == 0 && candidate + pad4(candidate) == stored {
            data_len = Some(candidate);
            break;
        }
    }
    let data_len = data_len.ok_or_else(|| PayloadError::UndeterminedSampleLength {
        label: label.clone(),
        stored: stored as u32,
    })?;

    let mut data = Vec::with_capacity(data_len / bps);
    for _ in 0..data_len / bps {
        data.push(r.read_i16()?);
    }
    r.skip(stored - data_len)?;

    Ok(Sample {
        label,
        stereo: channels == 2,
        data,
    })
}
