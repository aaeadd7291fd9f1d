use failure::Error as FailureError;

use crate::models::authorization::*;
use crate::repos::acl::Acl;

pub type RepoResult<T> = Result<T, FailureError>;
pub type RepoAcl<T> = dyn Acl<Resource, Action, Scope, FailureError, T>;
