use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use kastle2_core::uf2::{self, Uf2Block, BLOCK_SIZE, PAYLOAD_SIZE};
use log::info;
use zerocopy::FromBytes;

pub fn merge(inputs: &[PathBuf], output_path: &Path, fill_gaps: bool) -> Result<()> {
    let files = inputs
        .iter()
        .map(|path| {
            fs::read(path).with_context(|| format!("can't read input file {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    let streams: Vec<&[u8]> = files.iter().map(|f| f.as_slice()).collect();

    let merged = uf2::merge_blocks(&streams, fill_gaps)?;
    uf2::validate(&merged).context("merged stream failed validation")?;

    fs::write(output_path, &merged)
        .with_context(|| format!("can't write output file {}", output_path.display()))?;
    info!(
        "wrote {} ({} blocks)",
        output_path.display(),
        merged.len() / BLOCK_SIZE
    );
    Ok(())
}

pub fn validate(input_path: &Path) -> Result<()> {
    let stream = fs::read(input_path)
        .with_context(|| format!("can't read input file {}", input_path.display()))?;
    uf2::validate(&stream)
        .with_context(|| format!("{} is not a valid UF2 stream", input_path.display()))?;
    info!("{} is valid", input_path.display());
    Ok(())
}

pub fn info(input_path: &Path) -> Result<()> {
    let stream = fs::read(input_path)
        .with_context(|| format!("can't read input file {}", input_path.display()))?;
    uf2::validate(&stream)
        .with_context(|| format!("{} is not a valid UF2 stream", input_path.display()))?;

    let blocks: Vec<Uf2Block> = stream
        .chunks_exact(BLOCK_SIZE)
        .map(|raw| Uf2Block::read_from_bytes(raw).expect("validated stream"))
        .collect();

    println!("{} blocks", blocks.len());
    if let (Some(min), Some(max)) = (
        blocks.iter().map(|b| b.target_addr.get()).min(),
        blocks.iter().map(|b| b.target_addr.get()).max(),
    ) {
        println!(
            "address range {:#010x}..{:#010x} ({} bytes covered)",
            min,
            max as u64 + PAYLOAD_SIZE as u64,
            max as u64 + PAYLOAD_SIZE as u64 - min as u64,
        );
    }

    let mut families: Vec<u32> = blocks.iter().map(|b| b.family_id.get()).collect();
    families.sort_unstable();
    families.dedup();
    for family in families {
        println!("family id {:#010x}", family);
    }
    Ok(())
}
