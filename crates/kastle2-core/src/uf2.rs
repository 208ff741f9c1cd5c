//! UF2 block transport: reading, generating, merging and validating the
//! 512-byte block streams that bootloaders consume.

use assert_into::AssertInto;
use log::{debug, info};
use static_assertions::const_assert;
use std::mem;
use thiserror::Error;
use zerocopy::little_endian::U32;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

pub const UF2_MAGIC_START0: u32 = 0x0A324655;
pub const UF2_MAGIC_START1: u32 = 0x9E5D5157;
pub const UF2_MAGIC_END: u32 = 0x0AB16F30;

pub const UF2_FLAG_FAMILY_ID_PRESENT: u32 = 0x00002000;

/// Size of one framed block on the wire.
pub const BLOCK_SIZE: usize = 512;
/// Bytes of payload carried per block. The format allows up to 476 but the
/// Kastle 2 bootloader flashes in 256-byte pages.
pub const PAYLOAD_SIZE: usize = 256;

#[derive(Clone, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct Uf2Block {
    pub magic_start0: U32,
    pub magic_start1: U32,
    pub flags: U32,
    pub target_addr: U32,
    pub payload_size: U32,
    pub block_no: U32,
    pub num_blocks: U32,
    pub family_id: U32,
    pub data: [u8; 476],
    pub magic_end: U32,
}

const_assert!(mem::size_of::<Uf2Block>() == BLOCK_SIZE);

impl Uf2Block {
    /// A block with magics, flags, payload size and family id filled in.
    /// Address, sequence number and total count start at zero.
    pub fn prototype(family_id: u32) -> Self {
        Self {
            magic_start0: U32::new(UF2_MAGIC_START0),
            magic_start1: U32::new(UF2_MAGIC_START1),
            flags: U32::new(UF2_FLAG_FAMILY_ID_PRESENT),
            target_addr: U32::new(0),
            payload_size: U32::new(PAYLOAD_SIZE.assert_into()),
            block_no: U32::new(0),
            num_blocks: U32::new(0),
            family_id: U32::new(family_id),
            data: [0; 476],
            magic_end: U32::new(UF2_MAGIC_END),
        }
    }

    fn magic_ok(&self) -> bool {
        self.magic_start0.get() == UF2_MAGIC_START0
            && self.magic_start1.get() == UF2_MAGIC_START1
            && self.magic_end.get() == UF2_MAGIC_END
    }

    fn payload(&self) -> &[u8] {
        &self.data[..PAYLOAD_SIZE]
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Uf2Error {
    #[error("stream length {len} is not a multiple of the {BLOCK_SIZE}-byte block size")]
    MalformedImage { len: usize },
    #[error("block {index} has bad magic numbers")]
    InvalidBlock { index: usize },
    #[error("block {index} has family id {actual:#010x}, expected {expected:#010x}")]
    FamilyMismatch {
        index: usize,
        expected: u32,
        actual: u32,
    },
    #[error("block {index} declares {actual} total blocks, expected {expected}")]
    InconsistentBlockCount {
        index: usize,
        expected: u32,
        actual: u32,
    },
    #[error("block at position {index} declares sequence number {actual}")]
    BlockOutOfSequence { index: usize, actual: u32 },
}

fn parse_blocks(stream: &[u8]) -> Result<Vec<Uf2Block>, Uf2Error> {
    if stream.len() % BLOCK_SIZE != 0 {
        return Err(Uf2Error::MalformedImage { len: stream.len() });
    }

    let mut blocks = Vec::with_capacity(stream.len() / BLOCK_SIZE);
    for (index, raw) in stream.chunks_exact(BLOCK_SIZE).enumerate() {
        let block = Uf2Block::read_from_bytes(raw)
            .expect("chunks_exact yields exactly BLOCK_SIZE bytes");
        if !block.magic_ok() {
            return Err(Uf2Error::InvalidBlock { index });
        }
        blocks.push(block);
    }
    Ok(blocks)
}

/// Reconstructs the flat firmware image covered by a UF2 stream.
///
/// Every block must carry the expected family id. Address gaps between
/// blocks are preserved as zero bytes. An empty stream yields an empty
/// image.
pub fn read_image(stream: &[u8], expected_family: u32) -> Result<Vec<u8>, Uf2Error> {
    let blocks = parse_blocks(stream)?;

    for (index, block) in blocks.iter().enumerate() {
        let actual = block.family_id.get();
        if actual != expected_family {
            return Err(Uf2Error::FamilyMismatch {
                index,
                expected: expected_family,
                actual,
            });
        }
    }

    if blocks.is_empty() {
        return Ok(Vec::new());
    }

    let min_addr = blocks
        .iter()
        .map(|b| b.target_addr.get() as u64)
        .min()
        .expect("blocks is non-empty");
    let max_addr = blocks
        .iter()
        .map(|b| b.target_addr.get() as u64 + PAYLOAD_SIZE as u64)
        .max()
        .expect("blocks is non-empty");

    let mut image = vec![0u8; (max_addr - min_addr) as usize];
    for block in &blocks {
        let dest = (block.target_addr.get() as u64 - min_addr) as usize;
        image[dest..dest + PAYLOAD_SIZE].copy_from_slice(block.payload());
    }

    debug!("read {} blocks into {} byte image", blocks.len(), image.len());
    Ok(image)
}

/// Wraps a flat byte buffer into a UF2 block stream starting at
/// `start_address`.
///
/// The data is split into 256-byte payloads; the final block is zero-padded
/// to the full payload size, so the covered span is always a multiple of
/// 256 bytes.
pub fn write_blocks(family_id: u32, start_address: u32, data: &[u8]) -> Vec<u8> {
    let total_blocks = data.len().div_ceil(PAYLOAD_SIZE);
    info!("generating UF2 stream with {} blocks", total_blocks);

    let mut out = Vec::with_capacity(total_blocks * BLOCK_SIZE);
    for (i, chunk) in data.chunks(PAYLOAD_SIZE).enumerate() {
        let mut block = Uf2Block::prototype(family_id);
        let offset: u32 = (i * PAYLOAD_SIZE).assert_into();
        block.target_addr = U32::new(start_address + offset);
        block.block_no = U32::new(i.assert_into());
        block.num_blocks = U32::new(total_blocks.assert_into());
        block.data[..chunk.len()].copy_from_slice(chunk);
        out.extend_from_slice(block.as_bytes());
    }
    out
}

/// Merges several UF2 streams into one stream sorted by target address.
///
/// Blocks keep their payload and address; sequence numbers and the total
/// block count are rewritten to describe the merged stream. Duplicate
/// addresses across inputs are kept side by side, not deduplicated. With
/// `fill_gaps` set, zero-payload filler blocks are synthesized so that
/// consecutive blocks are exactly one payload apart.
pub fn merge_blocks(streams: &[&[u8]], fill_gaps: bool) -> Result<Vec<u8>, Uf2Error> {
    let mut collected: Vec<Uf2Block> = Vec::new();
    let mut family_id = 0u32;

    info!("merging {} UF2 streams", streams.len());
    for stream in streams {
        for block in parse_blocks(stream)? {
            // Inputs are expected to share one family, so last write wins.
            family_id = block.family_id.get();
            collected.push(block);
        }
    }

    // Stable sort keeps the input encounter order for equal addresses.
    collected.sort_by_key(|b| b.target_addr.get());

    let mut merged: Vec<Uf2Block> = Vec::with_capacity(collected.len());
    if fill_gaps && !collected.is_empty() {
        let mut cursor = collected[0].target_addr.get() as u64;
        for block in collected {
            let address = block.target_addr.get() as u64;
            while cursor < address {
                let mut filler = Uf2Block::prototype(family_id);
                filler.target_addr = U32::new(cursor.assert_into());
                merged.push(filler);
                cursor += PAYLOAD_SIZE as u64;
            }
            merged.push(block);
            cursor = address + PAYLOAD_SIZE as u64;
        }
    } else {
        merged = collected;
    }

    let total: u32 = merged.len().assert_into();
    debug!("renumbering {} merged blocks", total);

    let mut out = Vec::with_capacity(merged.len() * BLOCK_SIZE);
    for (i, block) in merged.iter_mut().enumerate() {
        block.block_no = U32::new(i.assert_into());
        block.num_blocks = U32::new(total);
        out.extend_from_slice(block.as_bytes());
    }
    Ok(out)
}

/// Structurally validates a UF2 stream: block alignment, magic numbers, a
/// consistent declared total and sequence numbers matching stream order.
pub fn validate(stream: &[u8]) -> Result<(), Uf2Error> {
    let blocks = parse_blocks(stream)?;

    let mut expected_total = None;
    for (index, block) in blocks.iter().enumerate() {
        let declared_total = block.num_blocks.get();
        match expected_total {
            None => expected_total = Some(declared_total),
            Some(expected) if declared_total != expected => {
                return Err(Uf2Error::InconsistentBlockCount {
                    index,
                    expected,
                    actual: declared_total,
                });
            }
            Some(_) => {}
        }

        let block_no = block.block_no.get();
        if block_no as usize != index {
            return Err(Uf2Error::BlockOutOfSequence {
                index,
                actual: block_no,
            });
        }
    }
    Ok(())
}

/// Boolean convenience wrapper around [`validate`].
pub fn is_valid(stream: &[u8]) -> bool {
    validate(stream).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAMILY: u32 = 0xE48BFF56;
    const ADDR: u32 = 0x10080000;

    fn raw_block(stream: &[u8], index: usize) -> Uf2Block {
        Uf2Block::read_from_bytes(&stream[index * BLOCK_SIZE..(index + 1) * BLOCK_SIZE]).unwrap()
    }

    #[test]
    fn single_block_round_trip() {
        let data = vec![0xAA; PAYLOAD_SIZE];
        let stream = write_blocks(FAMILY, ADDR, &data);
        assert_eq!(stream.len(), BLOCK_SIZE);

        let image = read_image(&stream, FAMILY).unwrap();
        assert_eq!(image.len(), PAYLOAD_SIZE);
        assert!(image.iter().all(|&b| b == 0xAA));
    }

    #[test]
    fn partial_final_block_is_zero_padded() {
        let data = vec![0x42; 300];
        let stream = write_blocks(FAMILY, ADDR, &data);
        assert_eq!(stream.len(), 2 * BLOCK_SIZE);

        let image = read_image(&stream, FAMILY).unwrap();
        assert_eq!(image.len(), 2 * PAYLOAD_SIZE);
        assert_eq!(&image[..300], &data[..]);
        assert!(image[300..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_stream_reads_as_empty_image() {
        assert_eq!(read_image(&[], FAMILY).unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn non_aligned_stream_is_rejected() {
        let err = read_image(&[0u8; 100], FAMILY).unwrap_err();
        assert_eq!(err, Uf2Error::MalformedImage { len: 100 });
    }

    #[test]
    fn corrupt_magic_is_rejected() {
        let mut stream = write_blocks(FAMILY, ADDR, &[1, 2, 3]);
        stream[0] = 0;
        assert_eq!(
            read_image(&stream, FAMILY).unwrap_err(),
            Uf2Error::InvalidBlock { index: 0 }
        );
    }

    #[test]
    fn family_mismatch_is_rejected() {
        let stream = write_blocks(0x1234, ADDR, &[1, 2, 3]);
        assert_eq!(
            read_image(&stream, FAMILY).unwrap_err(),
            Uf2Error::FamilyMismatch {
                index: 0,
                expected: FAMILY,
                actual: 0x1234,
            }
        );
    }

    #[test]
    fn generated_stream_validates() {
        let stream = write_blocks(FAMILY, ADDR, &vec![7u8; 1000]);
        assert!(is_valid(&stream));
    }

    #[test]
    fn validator_rejects_inconsistent_total() {
        let stream = write_blocks(FAMILY, ADDR, &vec![7u8; 512]);
        let mut bad = stream.clone();
        // Total block count of the second block lives at offset 0x18.
        bad[BLOCK_SIZE + 0x18] = 3;
        assert_eq!(
            validate(&bad).unwrap_err(),
            Uf2Error::InconsistentBlockCount {
                index: 1,
                expected: 2,
                actual: 3,
            }
        );
    }

    #[test]
    fn validator_rejects_out_of_sequence_blocks() {
        let stream = write_blocks(FAMILY, ADDR, &vec![7u8; 512]);
        let mut bad = stream.clone();
        // Sequence number of the first block lives at offset 0x14.
        bad[0x14] = 1;
        assert_eq!(
            validate(&bad).unwrap_err(),
            Uf2Error::BlockOutOfSequence { index: 0, actual: 1 }
        );
    }

    #[test]
    fn merge_sorts_and_renumbers_disjoint_streams() {
        let high = write_blocks(FAMILY, ADDR + 0x1000, &vec![2u8; 256]);
        let low = write_blocks(FAMILY, ADDR, &vec![1u8; 256]);

        let merged = merge_blocks(&[&high, &low], false).unwrap();
        assert_eq!(merged.len(), 2 * BLOCK_SIZE);
        assert!(is_valid(&merged));

        let first = raw_block(&merged, 0);
        let second = raw_block(&merged, 1);
        assert_eq!(first.target_addr.get(), ADDR);
        assert_eq!(second.target_addr.get(), ADDR + 0x1000);
        assert_eq!(first.block_no.get(), 0);
        assert_eq!(second.block_no.get(), 1);
        assert_eq!(first.num_blocks.get(), 2);
        assert_eq!(second.num_blocks.get(), 2);
    }

    #[test]
    fn merge_fills_gaps_with_contiguous_blocks() {
        let low = write_blocks(FAMILY, ADDR, &vec![1u8; 256]);
        let high = write_blocks(FAMILY, ADDR + 4 * PAYLOAD_SIZE as u32, &vec![2u8; 256]);

        let merged = merge_blocks(&[&low, &high], true).unwrap();
        assert_eq!(merged.len(), 5 * BLOCK_SIZE);
        assert!(is_valid(&merged));

        for i in 0..5 {
            let block = raw_block(&merged, i);
            assert_eq!(block.target_addr.get(), ADDR + (i * PAYLOAD_SIZE) as u32);
            assert_eq!(block.family_id.get(), FAMILY);
        }

        // Filler payloads are zeroed.
        let filler = raw_block(&merged, 2);
        assert!(filler.payload().iter().all(|&b| b == 0));
    }

    #[test]
    fn merge_keeps_duplicate_addresses() {
        let a = write_blocks(FAMILY, ADDR, &vec![1u8; 256]);
        let b = write_blocks(FAMILY, ADDR, &vec![2u8; 256]);
        let merged = merge_blocks(&[&a, &b], false).unwrap();
        assert_eq!(merged.len(), 2 * BLOCK_SIZE);
        assert_eq!(raw_block(&merged, 0).payload()[0], 1);
        assert_eq!(raw_block(&merged, 1).payload()[0], 2);
    }

    #[test]
    fn merge_of_nothing_is_empty() {
        assert_eq!(merge_blocks(&[], true).unwrap(), Vec::<u8>::new());
    }
}
