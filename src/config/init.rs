use anyhow::{Context, Result};
use atomic_write_file::AtomicWriteFile;
use std::io::{BufRead, Write};
use std::path::Path;

use crate::config::Config;
use crate::scoring::EngineConfig;
use crate::valuation::IndustryMultipleRange;

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    print!("{} [{}]: ", message, hint);
    std::io::stdout().flush().context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Built-in configuration with a couple of starter industry bands.
pub fn default_config() -> Config {
    let mut engine = EngineConfig::default();
    engine.industries.insert(
        "hvac_services".to_string(),
        IndustryMultipleRange {
            low: 3.0,
            high: 6.0,
            median: Some(4.5),
        },
    );
    engine.industries.insert(
        "b2b_saas".to_string(),
        IndustryMultipleRange {
            low: 4.0,
            high: 10.0,
            median: Some(6.5),
        },
    );
    Config {
        engine,
        snapshot_dir: None,
    }
}

/// Write the default configuration to `path`.
///
/// An existing file is only replaced when `force` is set or the user agrees
/// at the prompt. Returns false when the user declined.
pub fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        let overwrite = prompt_yes_no(
            &format!("Config already exists at {}. Overwrite?", path.display()),
            false,
        )?;
        if !overwrite {
            return Ok(false);
        }
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    let yaml = serde_saphyr::to_string(&default_config())
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    let mut file = AtomicWriteFile::open(path)
        .with_context(|| format!("Failed to open atomic write file at {}", path.display()))?;
    file.write_all(yaml.as_bytes())
        .with_context(|| format!("Failed to write config to {}", path.display()))?;
    file.commit()
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(true)
}
