//! Interactive prompts using dialoguer

use std::path::PathBuf;

use anyhow::Result;
use console::style;
use dialoguer::Confirm;

/// Prompt user to confirm proceeding with an action
pub fn confirm_step(message: &str) -> Result<bool> {
    let confirmed = Confirm::new()
        .with_prompt(message)
        .default(true)
        .interact()?;
    Ok(confirmed)
}

/// Paths from `paths` that already exist on disk
pub fn existing_paths(paths: &[PathBuf]) -> Vec<PathBuf> {
    paths.iter().filter(|p| p.exists()).cloned().collect()
}

/// Ask before replacing files from an earlier run. Defaults to no.
pub fn confirm_overwrite(existing: &[PathBuf]) -> Result<bool> {
    if existing.is_empty() {
        return Ok(true);
    }

    println!();
    for path in existing {
        println!("      {} {}", style("•").dim(), path.display());
    }
    let confirmed = Confirm::new()
        .with_prompt(format!("Overwrite {} existing file(s)?", existing.len()))
        .default(false)
        .interact()?;
    Ok(confirmed)
}
