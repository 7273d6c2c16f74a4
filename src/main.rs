use std::time::Duration;

use clap::Parser;
use toonpanel::config::{load_layout_table, setup_logging};
use toonpanel::layouts::LayoutResolver;
use toonpanel::web::AppState;
use toonpanel::web::images::ImageInliner;
use tracing::{error, info};

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = toonpanel::cli::CliOptions::parse();

    if let Err(err) = setup_logging(cli.debug) {
        eprintln!("Logging setup error: {}", err);
    }

    let table = match load_layout_table(cli.layouts.as_deref()) {
        Ok(table) => table,
        Err(err) => {
            error!("Layout table error: {}", err);
            return;
        }
    };

    let inliner = match ImageInliner::new(
        &cli.proxy_url,
        Duration::from_millis(cli.fetch_timeout_ms),
    ) {
        Ok(inliner) => inliner,
        Err(err) => {
            error!("Image client error: {}", err);
            return;
        }
    };

    info!(
        "Serving {} bands in {:?} mode via {}",
        table.bands.len(),
        cli.layout_mode,
        cli.proxy_url
    );
    let state = AppState::new(LayoutResolver::new(table, cli.layout_mode), inliner);

    if let Err(err) = toonpanel::web::setup_server(&cli.listen_address, cli.port, state).await {
        error!("Application error: {}", err);
    }
}
