//! Services is a core layer for the app business logic like
//! validation, authorization, etc.

pub mod attribute_validation;
pub mod attribute_values;
pub mod categories;
pub mod listings;
pub mod search;
pub mod system;
pub mod types;

pub use self::attribute_values::*;
pub use self::categories::*;
pub use self::listings::*;
pub use self::search::*;
pub use self::system::*;
pub use self::types::*;

use diesel::connection::AnsiTransactionManager;
use diesel::pg::Pg;
use diesel::Connection;
use failure::Error as FailureError;
use failure::Fail;
use r2d2::{ManageConnection, PooledConnection};

use crate::controller::context::{DynamicContext, StaticContext};
use crate::errors::Error;
use crate::repos::repo_factory::ReposFactory;

/// Service
pub struct Service<
    T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
    M: ManageConnection<Connection = T>,
    F: ReposFactory<T>,
> {
    pub static_context: StaticContext<T, M, F>,
    pub dynamic_context: DynamicContext,
}

impl<
        T: Connection<Backend = Pg, TransactionManager = AnsiTransactionManager> + 'static,
        M: ManageConnection<Connection = T>,
        F: ReposFactory<T>,
    > Service<T, M, F>
{
    /// Create a new service
    pub fn new(static_context: StaticContext<T, M, F>, dynamic_context: DynamicContext) -> Self {
        Self {
            static_context,
            dynamic_context,
        }
    }

    /// Runs blocking database work on the cpu pool
    pub fn spawn_on_pool<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce(PooledConnection<M>) -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        let db_pool = self.static_context.db_pool.clone();
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(move || db_pool.get().map_err(|e| e.context(Error::Connection).into()).and_then(f)))
    }

    /// Runs blocking work that needs no database connection on the cpu pool
    pub fn spawn_blocking<R, Func>(&self, f: Func) -> ServiceFuture<R>
    where
        Func: FnOnce() -> Result<R, FailureError> + Send + 'static,
        R: Send + 'static,
    {
        let cpu_pool = self.static_context.cpu_pool.clone();
        Box::new(cpu_pool.spawn_fn(f))
    }
}
