//! `push`: apply a YAML item file

mod handler;

use std::path::PathBuf;

use clap::Args;

use super::GatewayArgs;

pub use handler::handle_push_command;

#[derive(Debug, Args)]
pub struct PushArgs {
    #[command(flatten)]
    pub gateway: GatewayArgs,

    /// YAML file with flat items or product trees
    #[arg(short, long, value_name = "YAML")]
    pub file: PathBuf,

    /// Validate and print the ordered plan without contacting the Gateway
    #[arg(long)]
    pub dry_run: bool,
}
