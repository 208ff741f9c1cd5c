use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use kastle2_core::devices::KASTLE2_FAMILY_ID;
use kastle2_core::{decode_user_data, uf2, user_data_region};
use log::info;

pub fn unpack(input_path: &Path, output_path: Option<&Path>) -> Result<()> {
    let stream = fs::read(input_path)
        .with_context(|| format!("can't read input file {}", input_path.display()))?;

    let image = uf2::read_image(&stream, KASTLE2_FAMILY_ID)
        .with_context(|| format!("{} is not a Kastle 2 UF2 image", input_path.display()))?;

    let user_data = user_data_region(&image)
        .context("image ends before the user data region; is this a full firmware image?")?;

    let params = decode_user_data(user_data).context("can't decode the user data payload")?;

    let json = serde_json::to_string_pretty(&params)?;
    match output_path {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("can't write output file {}", path.display()))?;
            info!("wrote parameters to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
