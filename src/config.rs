//! Config handling

use std::path::Path;

use tracing::log::LevelFilter;
use tracing::{debug, info};

use crate::error::ToonError;
use crate::layouts::LayoutTable;

/// Sets up logging based on the debug flag
pub fn setup_logging(debug: bool) -> Result<(), Box<std::io::Error>> {
    let level = if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    let mut logger = simple_logger::SimpleLogger::new().with_level(level);
    if !debug {
        logger = logger
            .with_module_level("tracing", LevelFilter::Warn)
            .with_module_level("tower_http", LevelFilter::Warn)
            .with_module_level("reqwest", LevelFilter::Info)
            .with_module_level("rustls", LevelFilter::Info)
            .with_module_level("hyper_util", LevelFilter::Info)
            .with_module_level("h2", LevelFilter::Info);
    }
    logger.init().map_err(|err| {
        eprintln!("Failed to initialize logger: {}", err);
        Box::new(std::io::Error::other(err))
    })
}

/// Loads the layout table from `path`, or the bundled table when no path is given.
pub fn load_layout_table(path: Option<&Path>) -> Result<LayoutTable, ToonError> {
    match path {
        Some(path) => {
            let table = LayoutTable::from_path(path)?;
            info!(
                "Loaded layout table version {} from {}",
                table.version,
                path.display()
            );
            Ok(table)
        }
        None => {
            let table = LayoutTable::bundled()?;
            debug!("Using bundled layout table version {}", table.version);
            Ok(table)
        }
    }
}
