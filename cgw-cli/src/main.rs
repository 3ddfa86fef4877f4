mod api;
mod cli;
mod config;
mod input;
mod sync;

use anyhow::Result;
use clap::Parser;
use colored::*;

use cli::{Cli, Commands};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(verbose)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Push(args) => cli::commands::push::handle_push_command(args).await,
        Commands::PushStaged(args) => {
            cli::commands::push_staged::handle_push_staged_command(args).await
        }
    }
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(err) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), err);
        for cause in err.chain().skip(1) {
            eprintln!("  {} {}", "caused by:".red(), cause);
        }
        std::process::exit(1);
    }
}
