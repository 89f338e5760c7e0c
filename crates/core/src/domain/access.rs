use uuid::Uuid;

use crate::domain::template::OwnerScope;
use crate::domain::test::Visibility;

/// The caller identity used for every ownership/visibility check in the meta
/// store. In `development` mode the API boundary hands out a fixed
/// `Principal::User` placeholder instead of validating a real credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    User(Uuid),
    Org(Uuid),
}

impl Principal {
    #[must_use]
    pub const fn user_id(&self) -> Option<Uuid> {
        match self {
            Self::User(id) => Some(*id),
            Self::Org(_) => None,
        }
    }

    #[must_use]
    pub const fn org_id(&self) -> Option<Uuid> {
        match self {
            Self::Org(id) => Some(*id),
            Self::User(_) => None,
        }
    }
}

/// Can `principal` read an entity owned by `owner_user_id`/`owner_org_id` with
/// the given `scope`/visibility? `public` scope is always readable; anything
/// else requires the principal to match the recorded owner.
#[must_use]
pub fn can_read_template(
    principal: Principal,
    scope: OwnerScope,
    owner_user_id: Option<Uuid>,
    owner_org_id: Option<Uuid>,
) -> bool {
    match scope {
        OwnerScope::Public => true,
        OwnerScope::User => owner_user_id.is_some() && owner_user_id == principal.user_id(),
        OwnerScope::Org => owner_org_id.is_some() && owner_org_id == principal.org_id(),
    }
}

/// Visibility check for `TestSuite`: `public` suites are readable by anyone,
/// `private` suites only by their owner.
#[must_use]
pub fn can_read_suite(principal: Principal, visibility: Visibility, owner: Uuid) -> bool {
    match visibility {
        Visibility::Public => true,
        Visibility::Private => principal.user_id() == Some(owner) || principal.org_id() == Some(owner),
    }
}

/// A `TestRun` is visible to the principal who created it, or to any member
/// of the creating org.
#[must_use]
pub const fn can_access_run(principal: Principal, created_by: Uuid) -> bool {
    match principal {
        Principal::User(id) => id.as_u128() == created_by.as_u128(),
        Principal::Org(id) => id.as_u128() == created_by.as_u128(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_template_always_readable() {
        let caller = Principal::User(Uuid::now_v7());
        assert!(can_read_template(caller, OwnerScope::Public, None, None));
    }

    #[test]
    fn user_scoped_template_requires_owner_match() {
        let owner = Uuid::now_v7();
        let stranger = Principal::User(Uuid::now_v7());
        let me = Principal::User(owner);
        assert!(!can_read_template(
            stranger,
            OwnerScope::User,
            Some(owner),
            None
        ));
        assert!(can_read_template(me, OwnerScope::User, Some(owner), None));
    }

    #[test]
    fn private_suite_requires_ownership() {
        let owner = Uuid::now_v7();
        assert!(!can_read_suite(
            Principal::User(Uuid::now_v7()),
            Visibility::Private,
            owner
        ));
        assert!(can_read_suite(
            Principal::User(owner),
            Visibility::Private,
            owner
        ));
    }
}
