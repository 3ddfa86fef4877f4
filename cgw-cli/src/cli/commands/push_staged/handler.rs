use anyhow::{Context, Result};
use colored::*;

use super::PushStagedArgs;
use crate::cli::commands::run_batch;
use crate::input;

pub async fn handle_push_staged_command(args: PushStagedArgs) -> Result<()> {
    let lists = input::discover_item_files(&args.staged)
        .with_context(|| format!("Invalid staging directory: {}", args.staged.display()))?;
    if lists.is_empty() {
        println!(
            "{} no */CGW/*.yaml item lists under {}",
            "Nothing to push:".yellow(),
            args.staged.display()
        );
        return Ok(());
    }

    let items = input::load_staged(&args.staged)
        .with_context(|| format!("Invalid staged push in {}", args.staged.display()))?;
    println!(
        "Loaded {} item(s) from {} item list(s)",
        items.len(),
        lists.len()
    );

    run_batch(&args.gateway, items, args.dry_run).await
}
