//! deployctl - Entry Point
//!
//! Verifies the images of one environment exist and deploys its Marathon group.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use deployctl::app::options::CliArgs;
use deployctl::app::prompt::confirm;
use deployctl::app::run::run;
use deployctl::logs::init_logging;
use deployctl::utils::version_info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if let Err(e) = init_logging(args.log_options()) {
        eprintln!("Failed to initialize logging: {e}");
    }
    debug!("deployctl {:?}", version_info());

    let environment = args.env.clone();
    let options = args.into_options().context("Invalid command line")?;

    let result = run(options, confirm)
        .await
        .with_context(|| format!("Deployment of environment '{}' failed", environment))?;

    println!("{}", "Deployed to Marathon:".green().bold());
    println!("{}", result);
    Ok(())
}
