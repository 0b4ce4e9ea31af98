use anyhow::Context as _;
use clap::Parser;

use devon::config::{Cli, HarnessConfig};
use devon::logging::init_logging;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log.as_deref());

    let config = HarnessConfig::from(cli);
    log::info!("Starting {} ({}x{})", config.title, config.width, config.height);
    devon::run(config).context("devon exited with an error")
}
