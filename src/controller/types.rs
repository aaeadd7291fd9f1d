use failure::Error as FailureError;
use futures::future::Future;

/// Controller layer Future, resolves to the serialized response body
pub type ControllerFuture = Box<dyn Future<Item = String, Error = FailureError>>;
