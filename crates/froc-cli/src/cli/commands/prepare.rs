use std::path::Path;

use anyhow::Context;
use froc_core::config::LayoutConfig;
use froc_core::{prepare_layout, CaseKey, KeyError};

use crate::cli::args::PrepareArgs;
use crate::exit_codes;

/// Reads case paths, one per line. Blank lines and `#` comments are skipped.
pub fn read_keys(path: &Path) -> anyhow::Result<Vec<CaseKey>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read keys file {}", path.display()))?;

    let mut keys = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let key = CaseKey::parse(line)
            .ok_or_else(|| KeyError::Malformed(line.to_string()))
            .with_context(|| format!("{}:{}", path.display(), lineno + 1))?;
        keys.push(key);
    }
    Ok(keys)
}

pub fn run(args: PrepareArgs) -> anyhow::Result<i32> {
    let keys = read_keys(&args.keys)?;
    if keys.is_empty() {
        tracing::warn!(path = %args.keys.display(), "keys file lists no series");
    }

    let raters = prepare_layout(
        &args.target_dir,
        &keys,
        args.num_of_raters,
        &LayoutConfig::default(),
    )?;

    println!(
        "Prepared {} series for {} raters in {}",
        keys.len(),
        raters.len(),
        args.target_dir.display()
    );
    Ok(exit_codes::SUCCESS)
}
