//! Listings is a microservice responsible for classified listings, their
//! category dependent attributes and listing search.
//! The layered structure of the app is
//!
//! `Application -> Controller -> Service -> Repo + Search client`
//!
//! Each layer can throw Error with context or cover occurred error with
//! Error in the context. When error is not covered with Error it will
//! be translated to code 500 in the http answer "Internal server error" of microservice.

#![allow(proc_macro_derive_resolution_fallback)]
#![recursion_limit = "128"]
extern crate chrono;
extern crate config as config_crate;
#[macro_use]
extern crate diesel;
#[macro_use]
extern crate failure;
extern crate futures;
extern crate futures_cpupool;
extern crate hyper;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
extern crate r2d2;
extern crate regex;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
#[macro_use]
extern crate serde_json;
extern crate tokio_core;
extern crate tokio_signal;
extern crate url;
extern crate validator;
#[macro_use]
extern crate validator_derive;

pub mod config;
pub mod controller;
pub mod elastic;
pub mod errors;
pub mod models;
pub mod repos;
pub mod schema;
pub mod services;

use std::process;
use std::sync::Arc;

use diesel::pg::PgConnection;
use diesel::r2d2::ConnectionManager;
use failure::Error as FailureError;
use failure::Fail;
use futures::{future, Future, Stream};
use futures_cpupool::CpuPool;
use hyper::server::Http;
use tokio_core::reactor::Core;

use crate::config::Config;
use crate::controller::context::{DynamicContext, StaticContext};
use crate::controller::{Application, ControllerImpl};
use crate::elastic::{ListingsElastic, ListingsElasticImpl};
use crate::repos::repo_factory::ReposFactoryImpl;
use crate::services::{ReindexReport, Service, SystemService};

/// Postgres backed static context shared by the server and the tools
pub type PgStaticContext = StaticContext<PgConnection, ConnectionManager<PgConnection>, ReposFactoryImpl>;

/// Builds the database pool, cpu pool and search client from `Config`
pub fn create_static_context(config: Config) -> Result<PgStaticContext, FailureError> {
    let database_url = config.server.database.clone();
    let db_manager = ConnectionManager::<PgConnection>::new(database_url);
    let db_pool = r2d2::Pool::builder()
        .build(db_manager)
        .map_err(|e| e.context("Failed to create DB connection pool"))?;

    let cpu_pool = CpuPool::new(config.server.thread_count);

    let elastic = ListingsElasticImpl::new(config.search.address.clone(), config.search.index.clone(), config.search_timeout())?;
    let elastic = Arc::new(elastic) as Arc<dyn ListingsElastic + Send + Sync>;

    Ok(StaticContext::new(db_pool, cpu_pool, Arc::new(config), ReposFactoryImpl::new(), elastic))
}

/// Starts new web service from provided `Config`
pub fn start_server<F: FnOnce() + 'static>(config: Config, port: &Option<String>, callback: F) {
    // Prepare reactor
    let mut core = Core::new().unwrap_or_else(|why| {
        error!("Unexpected error creating event loop core: {}", why);
        process::exit(1);
    });
    let handle = Arc::new(core.handle());

    let thread_count = config.server.thread_count;

    // Prepare server
    let address = {
        let port = port.as_ref().unwrap_or(&config.server.port);
        format!("{}:{}", config.server.host, port).parse().unwrap_or_else(|why| {
            error!("Could not parse address: {}", why);
            process::exit(1);
        })
    };

    let context = create_static_context(config).unwrap_or_else(|why| {
        error!("Service Initialization Error: {}", why);
        process::exit(1);
    });
    let route_parser = Arc::new(controller::routes::create_route_parser());

    let serve = Http::new()
        .serve_addr_handle(&address, &handle, move || {
            // Prepare application
            let controller = ControllerImpl::new(context.clone(), route_parser.clone());
            let app = Application::new(controller);

            Ok(app)
        })
        .unwrap_or_else(|why| {
            error!("Http Server Initialization Error: {}", why);
            process::exit(1);
        });

    let handle_arc2 = handle.clone();
    handle.spawn(
        serve
            .for_each(move |conn| {
                handle_arc2.spawn(conn.map(|_| ()).map_err(|why| error!("Server Error: {}", why)));
                Ok(())
            })
            .map_err(|_| ()),
    );

    info!("Listening on http://{}, threads: {}", address, thread_count);
    handle.spawn_fn(move || {
        callback();
        future::ok(())
    });

    let ctrl_c = tokio_signal::ctrl_c().flatten_stream().take(1u64).for_each(|()| {
        info!("Ctrl+C received. Exit");

        Ok(())
    });
    if let Err(why) = core.run(ctrl_c) {
        error!("Error while waiting for Ctrl+C: {}", why);
    }
}

/// Writes every stored listing into the search index
pub fn reindex(config: Config) -> Result<ReindexReport, FailureError> {
    let mut core = Core::new()?;
    let context = create_static_context(config)?;
    let service = Service::new(context, DynamicContext::default());
    core.run(service.reindex_listings())
}
