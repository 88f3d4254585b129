//! Show or initialize the configuration file.

use repcount_common::config::{config_file_path, AppConfig};

pub fn run(config: &AppConfig, init: bool) -> anyhow::Result<()> {
    let path = config_file_path();
    println!("Config file: {}", path.display());
    if !path.exists() {
        println!("  (not present, using defaults)");
    }
    println!();
    println!("{}", serde_json::to_string_pretty(config)?);

    if init {
        config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
        println!();
        println!("Saved to: {}", path.display());
    }
    Ok(())
}
