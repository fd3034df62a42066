//! Print the effective configuration

use anyhow::Result;
use sermouse_pipeline::MouseConfig;

use crate::error::CliError;

pub fn execute(config: &MouseConfig) -> Result<()> {
    let text = config.to_json_pretty().map_err(CliError::from)?;
    println!("{text}");
    Ok(())
}
