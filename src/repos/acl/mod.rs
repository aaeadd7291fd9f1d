//! Repos is a module responsible for interacting with access control lists
//! Authorization module contains authorization logic for the repo layer app

#[macro_use]
pub mod macros;

use std::rc::Rc;

use failure::Error as FailureError;

use crate::errors::Error;
use crate::models::authorization::*;

/// Access control list deciding whether an action on a resource is allowed
pub trait Acl<Res, Act, Scp, Err, T> {
    fn allows(&self, resource: Res, action: Act, scope_checker: &dyn CheckScope<Scp, T>, obj: Option<&T>) -> Result<bool, Err>;
}

/// Implemented by repos to tell whether an object is within a permission scope for a user.
/// Lookup failures are errors, not denials.
pub trait CheckScope<Scp, T> {
    fn is_in_scope(&self, user_id: i32, scope: &Scp, obj: Option<&T>) -> Result<bool, FailureError>;
}

pub fn check<T>(
    acl: &dyn Acl<Resource, Action, Scope, FailureError, T>,
    resource: Resource,
    action: Action,
    scope_checker: &dyn CheckScope<Scope, T>,
    obj: Option<&T>,
) -> Result<(), FailureError> {
    acl.allows(resource, action, scope_checker, obj).and_then(|allowed| {
        if allowed {
            Ok(())
        } else {
            Err(format_err!("Denied request to do {:?} on {:?}", action, resource)
                .context(Error::Forbidden)
                .into())
        }
    })
}

/// ApplicationAcl contains main logic for manipulation with resources
/// on behalf of an authenticated user
#[derive(Clone)]
pub struct ApplicationAcl {
    permissions: Rc<Vec<Permission>>,
    user_id: i32,
}

impl ApplicationAcl {
    pub fn new(user_id: i32) -> Self {
        let permissions = vec![
            permission!(Resource::Attributes, Action::Read),
            permission!(Resource::AttributeValues, Action::Read),
            permission!(Resource::AttributeValues, Action::All, Scope::Owned),
            permission!(Resource::Categories, Action::Read),
            permission!(Resource::Listings, Action::Read),
            permission!(Resource::Listings, Action::Create, Scope::Owned),
            permission!(Resource::Listings, Action::Update, Scope::Owned),
            permission!(Resource::Locations, Action::Read),
        ];

        ApplicationAcl {
            permissions: Rc::new(permissions),
            user_id,
        }
    }
}

impl<T> Acl<Resource, Action, Scope, FailureError, T> for ApplicationAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        scope_checker: &dyn CheckScope<Scope, T>,
        obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        let user_id = self.user_id;
        let mut allowed = false;
        for permission in self
            .permissions
            .iter()
            .filter(|permission| (permission.resource == resource) && ((permission.action == action) || (permission.action == Action::All)))
        {
            if scope_checker.is_in_scope(user_id, &permission.scope, obj)? {
                allowed = true;
                break;
            }
        }

        if !allowed {
            error!("Denied request from user {} to do {} on {}.", user_id, action, resource);
        }
        Ok(allowed)
    }
}

/// UnauthorizedAcl contains main logic for manipulation with resources
/// by anonymous callers, they may only read
#[derive(Clone, Default)]
pub struct UnauthorizedAcl;

impl<T> Acl<Resource, Action, Scope, FailureError, T> for UnauthorizedAcl {
    fn allows(
        &self,
        resource: Resource,
        action: Action,
        _scope_checker: &dyn CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        if action == Action::Read {
            Ok(true)
        } else {
            error!("Denied unauthorized request to do {} on {}.", action, resource);
            Ok(false)
        }
    }
}

/// SystemAcl allows everything, used by maintenance tools
#[derive(Clone, Default)]
pub struct SystemAcl;

impl<T> Acl<Resource, Action, Scope, FailureError, T> for SystemAcl {
    fn allows(
        &self,
        _resource: Resource,
        _action: Action,
        _scope_checker: &dyn CheckScope<Scope, T>,
        _obj: Option<&T>,
    ) -> Result<bool, FailureError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Owned {
        user_id: i32,
    }

    #[derive(Default)]
    struct ScopeChecker;

    impl CheckScope<Scope, Owned> for ScopeChecker {
        fn is_in_scope(&self, user_id: i32, scope: &Scope, obj: Option<&Owned>) -> Result<bool, FailureError> {
            Ok(match *scope {
                Scope::All => true,
                Scope::Owned => obj.map(|o| o.user_id == user_id).unwrap_or(false),
            })
        }
    }

    #[derive(Default)]
    struct BrokenScopeChecker;

    impl CheckScope<Scope, Owned> for BrokenScopeChecker {
        fn is_in_scope(&self, _user_id: i32, scope: &Scope, _obj: Option<&Owned>) -> Result<bool, FailureError> {
            match *scope {
                Scope::All => Ok(true),
                Scope::Owned => Err(format_err!("connection reset while loading owner")),
            }
        }
    }

    #[test]
    fn test_user_updates_only_own_listings() {
        let acl = ApplicationAcl::new(2);
        let s = ScopeChecker::default();

        assert_eq!(
            acl.allows(Resource::Listings, Action::Update, &s, Some(&Owned { user_id: 2 })).unwrap(),
            true,
            "ACL does not allow user to update own listing."
        );
        assert_eq!(
            acl.allows(Resource::Listings, Action::Update, &s, Some(&Owned { user_id: 3 })).unwrap(),
            false,
            "ACL allows user to update foreign listing."
        );
        assert_eq!(
            acl.allows(Resource::Listings, Action::Read, &s, Some(&Owned { user_id: 3 })).unwrap(),
            true,
            "ACL does not allow user to read foreign listing."
        );
        assert_eq!(
            acl.allows(Resource::Categories, Action::Update, &s, None).unwrap(),
            false,
            "ACL allows user to update categories."
        );
    }

    #[test]
    fn test_scope_lookup_failure_is_not_forbidden() {
        let acl = ApplicationAcl::new(2);
        let s = BrokenScopeChecker::default();

        assert!(acl.allows(Resource::Listings, Action::Read, &s, None).unwrap());
        let e = check::<Owned>(&acl, Resource::AttributeValues, Action::Update, &s, Some(&Owned { user_id: 2 })).unwrap_err();
        assert!(crate::errors::find_error(&e).is_none());
    }

    #[test]
    fn test_unauthorized_reads_only() {
        let acl = UnauthorizedAcl::default();
        let s = ScopeChecker::default();

        assert!(acl.allows(Resource::Listings, Action::Read, &s, None).unwrap());
        assert!(!acl.allows(Resource::Listings, Action::Create, &s, None).unwrap());
        assert!(check::<Owned>(&acl, Resource::Listings, Action::Update, &s, Some(&Owned { user_id: 1 })).is_err());
    }

    #[test]
    fn test_system_allows_all() {
        let acl = SystemAcl::default();
        let s = ScopeChecker::default();

        assert!(acl.allows(Resource::AttributeValues, Action::Update, &s, None).unwrap());
    }
}
