//! Command-line interface

pub mod commands;

use clap::{Parser, Subcommand};

use commands::push::PushArgs;
use commands::push_staged::PushStagedArgs;

#[derive(Debug, Parser)]
#[command(name = "cgw-cli", author, version, about = "Push product catalogs to the Content Gateway", long_about = None)]
pub struct Cli {
    /// Log debug output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply the items of a YAML file
    Push(PushArgs),
    /// Apply the item lists of a staged push directory
    PushStaged(PushStagedArgs),
}
