//! swatch - live component preview and color-token rewriting
//!
//! Imports component files, applies `--replace` rewrites through the same
//! pipeline an interactive session uses, waits for the preview, and prints
//! a report.

use anyhow::{Context, Result};
use clap::Parser;

use swatch::cli::{AppliedReplacement, CliArgs, SessionReport};
use swatch::config::StudioConfig;
use swatch::runtime::Studio;

fn main() -> Result<()> {
    let args = CliArgs::parse();
    swatch::tracing::init();

    let mut config = StudioConfig::load();
    args.apply_to(&mut config);

    let (mut studio, _editor) = Studio::headless(config);

    if !args.paths.is_empty() {
        let before = studio.list_files().len();
        studio.import_paths(args.paths.clone())?;
        studio.settle()?;
        if studio.list_files().len() == before {
            anyhow::bail!("none of the given files could be read");
        }
    }

    let active = studio.active().id;
    let mut applied = Vec::with_capacity(args.replacements.len());
    for replacement in &args.replacements {
        let replaced = studio
            .substitute(active, &replacement.old, &replacement.new)
            .with_context(|| format!("replacing {}", replacement.old))?;
        applied.push(AppliedReplacement {
            replacement: replacement.clone(),
            replaced,
        });
    }

    if !studio.settle()? {
        tracing::warn!("preview did not finish rendering; reporting last known state");
    }

    let report = SessionReport::collect(&studio, applied);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", report.to_text());
    }
    Ok(())
}
