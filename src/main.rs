//! Listings is a microservice responsible for classified listings and their search.
//! This crate is for running the service from `listings_lib`. See `listings_lib` for details.

extern crate listings_lib;
extern crate tracing_subscriber;

use tracing_subscriber::EnvFilter;

fn main() {
    let config = listings_lib::config::Config::new().expect("Can't load app config!");

    // Prepare logger
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    listings_lib::start_server(config, &None, || ());
}
