//! `push-staged`: apply the item lists of a staging directory

mod handler;

use std::path::PathBuf;

use clap::Args;

use super::GatewayArgs;

pub use handler::handle_push_staged_command;

#[derive(Debug, Args)]
pub struct PushStagedArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// Staging root holding `<destination>/CGW/*.yaml`
    #[arg(short, long, value_name = "DIR")]
    pub staged: PathBuf,

    /// Validate, checksum and print the ordered plan without contacting the Gateway
    #[arg(long)]
    pub dry_run: bool,
}
