//! Rebuilds the listings search index from the database
extern crate listings_lib;
#[macro_use]
extern crate log;
extern crate tracing_subscriber;

use std::process;

use tracing_subscriber::EnvFilter;

fn main() {
    let config = listings_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match listings_lib::reindex(config) {
        Ok(report) => {
            info!("Reindex finished, indexed: {}, failed: {:?}", report.indexed, report.failed);
            if !report.failed.is_empty() {
                process::exit(2);
            }
        }
        Err(e) => {
            error!("Reindex failed: {}", e);
            process::exit(1);
        }
    }
}
