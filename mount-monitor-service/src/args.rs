use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

pub const DEFAULT_MOUNTINFO_PATH: &str = "/proc/self/mountinfo";

/// Mount monitor service
#[derive(Parser, Debug)]
#[clap(version, about, long_about = None)]
pub struct Args {
    /// Log level: OFF, ERROR, WARN, INFO, DEBUG, TRACE
    #[clap(short, long, value_parser, default_value_t = LevelFilter::Info)]
    pub log_level: log::LevelFilter,

    /// Bus address. Session bus if not set
    #[clap(short, long, value_parser)]
    pub address: Option<String>,

    /// Mount table to watch
    #[clap(short, long, value_parser, default_value = DEFAULT_MOUNTINFO_PATH)]
    pub mountinfo: PathBuf,
}
