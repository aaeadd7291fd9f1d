use failure::Error as FailureError;
use futures::future::Future;

/// Service layer Future
pub type ServiceFuture<T> = Box<dyn Future<Item = T, Error = FailureError>>;
pub type ServiceResult<T> = Result<T, FailureError>;
