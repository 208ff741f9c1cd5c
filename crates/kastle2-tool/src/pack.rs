use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kastle2_core::devices::{Alchemist, FxWizard, WaveBard, KASTLE2_FAMILY_ID, USER_DATA_BEGIN};
use kastle2_core::params::{AlchemistParams, FxWizardParams, WaveBardParams};
use kastle2_core::{encode_payload, uf2};
use log::info;

use crate::Device;

pub fn pack(
    device: Device,
    input_path: &Path,
    output_path: &Path,
    base_path: Option<&Path>,
) -> Result<()> {
    let json = fs::read_to_string(input_path)
        .with_context(|| format!("can't read parameter file {}", input_path.display()))?;

    let payload = match device {
        Device::Alchemist => {
            let params: AlchemistParams = serde_json::from_str(&json)
                .context("parameter file doesn't match the alchemist schema")?;
            encode_payload(&Alchemist, &params)?
        }
        Device::FxWizard => {
            let params: FxWizardParams = serde_json::from_str(&json)
                .context("parameter file doesn't match the fx-wizard schema")?;
            encode_payload(&FxWizard, &params)?
        }
        Device::WaveBard => {
            let params: WaveBardParams = serde_json::from_str(&json)
                .context("parameter file doesn't match the wave-bard schema")?;
            encode_payload(&WaveBard, &params)?
        }
    };
    info!("encoded {} byte user data payload", payload.len());

    let user_uf2 = uf2::write_blocks(KASTLE2_FAMILY_ID, USER_DATA_BEGIN, &payload);

    let merged = match base_path {
        Some(base_path) => {
            let base = fs::read(base_path)
                .with_context(|| format!("can't read base firmware {}", base_path.display()))?;
            uf2::merge_blocks(&[base.as_slice(), user_uf2.as_slice()], true)
                .context("merging user data into the base firmware failed")?
        }
        None => user_uf2,
    };

    uf2::validate(&merged).context("merged image failed validation")?;

    fs::write(output_path, &merged)
        .with_context(|| format!("can't write output file {}", output_path.display()))?;
    info!(
        "wrote {} ({} blocks)",
        output_path.display(),
        merged.len() / uf2::BLOCK_SIZE
    );
    Ok(())
}
