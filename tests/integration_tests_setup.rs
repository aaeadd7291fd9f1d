extern crate futures;
extern crate hyper;
extern crate listings_lib;
extern crate rand;
extern crate tokio_core;

use std::sync::mpsc::channel;
use std::thread;

#[allow(unused_imports)]
use futures::future;
#[allow(unused_imports)]
use futures::{Future, Stream};
use hyper::client::HttpConnector;
use hyper::Client;
use rand::Rng;
use tokio_core::reactor::Core;

type HttpClient = Client<HttpConnector>;

pub struct Context {
    pub client: HttpClient,
    pub base_url: String,
    pub core: Core,
}

/// Starts the service on a random port, needs PostgreSQL from `config/test.toml`
pub fn setup() -> Context {
    let (tx, rx) = channel::<bool>();
    let mut rng = rand::thread_rng();
    let port = rng.gen_range(50000, 60000);
    thread::spawn(move || {
        let config = listings_lib::config::Config::with_env("test").expect("Can't load app config!");
        listings_lib::start_server(config, &Some(port.to_string()), move || {
            let _ = tx.send(true);
        });
    });
    rx.recv().unwrap();
    let core = Core::new().expect("Unexpected error creating event loop core");
    let client = Client::new(&core.handle());
    Context {
        client,
        base_url: format!("http://localhost:{}", port),
        core,
    }
}

#[allow(dead_code)]
pub fn read_body(body: hyper::Body) -> Box<dyn Future<Item = String, Error = hyper::Error>> {
    Box::new(body.concat2().map(|chunk| String::from_utf8_lossy(&chunk).into_owned()))
}
