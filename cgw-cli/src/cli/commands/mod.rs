//! Subcommands and the batch runner they share

pub mod push;
pub mod push_staged;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use colored::*;

use crate::config::{Config, FileConfig, Overrides};
use crate::sync::{BatchReport, CatalogItem, LogFacade, SyncError, SyncSession, sort_items};

/// Connection flags shared by every subcommand
#[derive(Debug, Clone, Args)]
pub struct GatewayArgs {
    /// Content Gateway base URL
    #[arg(long, env = "CGW_HOSTNAME")]
    pub hostname: Option<String>,

    #[arg(short, long, env = "CGW_USERNAME")]
    pub username: Option<String>,

    /// Prompted for when missing and attached to a terminal
    #[arg(short, long, env = "CGW_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Accept invalid TLS certificates
    #[arg(long, env = "CGW_INSECURE")]
    pub insecure: bool,

    /// Config file (default: <config dir>/cgw-cli/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl GatewayArgs {
    pub fn resolve(&self) -> Result<Config> {
        let file = FileConfig::discover(self.config.as_deref())?;
        Config::resolve(
            Overrides {
                hostname: self.hostname.clone(),
                username: self.username.clone(),
                password: self.password.clone(),
                insecure: self.insecure,
            },
            file,
        )
    }
}

/// Apply `items` to the Gateway, or print the plan when `dry_run` is set
pub async fn run_batch(gateway: &GatewayArgs, items: Vec<CatalogItem>, dry_run: bool) -> Result<()> {
    if dry_run {
        print_plan(&sort_items(items));
        return Ok(());
    }

    let config = gateway.resolve()?;
    let client = config.client()?;
    println!(
        "Pushing {} item(s) to {}",
        items.len(),
        client.hostname().bright_cyan()
    );

    let log = LogFacade;
    let mut session = SyncSession::new(&client, &log);
    match session.run(items).await {
        Ok(report) => {
            print_summary(&report);
            Ok(())
        }
        Err(err) => {
            print_rollback(session.report());
            let context = failure_context(&err);
            Err(anyhow::Error::new(err).context(context))
        }
    }
}

pub fn print_plan(items: &[CatalogItem]) {
    println!("{}", "Dry run, nothing will be sent".yellow().bold());
    for (position, item) in items.iter().enumerate() {
        let key = match item.natural_key() {
            Ok(key) => key.to_string(),
            Err(err) => format!("<{}>", err).red().to_string(),
        };
        let action = match item.action.as_str() {
            "create" => "create".green(),
            "update" => "update".cyan(),
            other => other.red(),
        };
        println!("{:>4}. {:<6} {:<8} {}", position + 1, action, item.kind.to_string(), key);
    }
    println!("{} item(s) planned", items.len());
}

pub fn print_summary(report: &BatchReport) {
    println!("{}", "Push complete".green().bold());
    println!("  created:   {}", report.created.to_string().green());
    println!("  updated:   {}", report.updated.to_string().cyan());
    println!("  deleted:   {}", report.deleted.to_string().red());
    println!("  finalized: {}", report.finalized.to_string().bright_white());
}

fn print_rollback(report: &BatchReport) {
    eprintln!("{}", "Push failed, changes rolled back".red().bold());
    eprintln!("  applied before failure: {}", report.applied());
    eprintln!("  compensated:            {}", report.compensated);
    if report.compensation_failures > 0 {
        eprintln!(
            "  {} {}",
            "not compensated:       ".yellow(),
            report.compensation_failures.to_string().yellow().bold()
        );
    }
}

fn failure_context(err: &SyncError) -> &'static str {
    if err.is_transport() {
        "Content Gateway call failed, batch was rolled back"
    } else if err.is_usage() {
        "Internal error while applying the batch, batch was rolled back"
    } else {
        "Batch failed and was rolled back"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ClientError;
    use crate::sync::keys::NaturalKey;
    use crate::sync::types::EntityKind;

    #[test]
    fn test_failure_context_by_cause() {
        let transport = SyncError::from(ClientError::api(503, "busy"));
        assert!(failure_context(&transport).starts_with("Content Gateway call failed"));

        let usage = SyncError::KeyArity {
            kind: EntityKind::Version,
            expected: 3,
            actual: 2,
        };
        assert!(failure_context(&usage).starts_with("Internal error"));

        let domain = SyncError::ParentNotFound {
            key: NaturalKey::product("X", "X1"),
        };
        assert_eq!(failure_context(&domain), "Batch failed and was rolled back");
    }
}
