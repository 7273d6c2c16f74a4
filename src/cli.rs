//! CLI parser
use clap::Parser;
use std::num::NonZeroU16;
use std::path::PathBuf;

use crate::constants::{DEFAULT_FETCH_TIMEOUT_MS, DEFAULT_PROXY_URL};
use crate::layouts::LayoutMode;

#[derive(Parser, Debug)]
/// CLI Options
pub struct CliOptions {
    #[clap(long, help = "Enable debug logging", env = "TOONPANEL_DEBUG")]
    /// Enable debug logging. Env: TOONPANEL_DEBUG
    pub debug: bool,
    #[clap(long, short, default_value = "9000", env = "TOONPANEL_PORT")]
    /// http listener, defaults to `9000`.
    /// Env: TOONPANEL_PORT
    pub port: NonZeroU16,
    #[clap(
        long,
        short,
        default_value = "127.0.0.1",
        env = "TOONPANEL_LISTEN_ADDRESS"
    )]
    /// Listen address, defaults to `127.0.0.1`.
    /// Env: TOONPANEL_LISTEN_ADDRESS
    pub listen_address: String,

    #[clap(long, env = "TOONPANEL_LAYOUTS")]
    /// Path to a layout table JSON file, eg `/data/layouts.json`. Uses the bundled table when unset.
    /// Env: TOONPANEL_LAYOUTS
    pub layouts: Option<PathBuf>,

    #[clap(long, value_enum, default_value_t = LayoutMode::Curated, env = "TOONPANEL_LAYOUT_MODE")]
    /// How background identifiers map to layouts.
    /// Env: TOONPANEL_LAYOUT_MODE
    pub layout_mode: LayoutMode,

    #[clap(long, default_value = DEFAULT_PROXY_URL, env = "TOONPANEL_PROXY_URL")]
    /// Image resizing proxy, called as `<proxy>?url=<origin>`.
    /// Env: TOONPANEL_PROXY_URL
    pub proxy_url: String,

    #[clap(long, default_value_t = DEFAULT_FETCH_TIMEOUT_MS, env = "TOONPANEL_FETCH_TIMEOUT_MS")]
    /// Timeout for each image fetch, in milliseconds.
    /// Env: TOONPANEL_FETCH_TIMEOUT_MS
    pub fetch_timeout_ms: u64,
}
