use anyhow::{Context, Result};
use colored::*;

use super::PushArgs;
use crate::cli::commands::run_batch;
use crate::input;

pub async fn handle_push_command(args: PushArgs) -> Result<()> {
    if !args.file.exists() {
        anyhow::bail!("Push file does not exist: {}", args.file.display());
    }

    let items = input::load_items(&args.file)
        .with_context(|| format!("Invalid push file: {}", args.file.display()))?;
    println!(
        "Loaded {} item(s) from {}",
        items.len(),
        args.file.display().to_string().cyan()
    );

    run_batch(&args.gateway, items, args.dry_run).await
}
