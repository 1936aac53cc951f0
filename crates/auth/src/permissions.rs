//! Role-set policy and the role predicates built on it.
//!
//! The four named sets are policy constants. Changing who may do what means
//! editing these constants; nothing is derived from an ordering of roles.
//!
//! | predicate              | allowed roles                               |
//! |------------------------|---------------------------------------------|
//! | `is_owner`             | OWNER                                       |
//! | `is_manager`           | OWNER, MANAGER                              |
//! | `can_manage_inventory` | OWNER, MANAGER, KITCHEN_STAFF               |
//! | `can_manage_orders`    | OWNER, MANAGER, KITCHEN_STAFF, WAITSTAFF    |

use crate::{Role, User};

/// A set of roles allowed to do something.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    pub const EMPTY: RoleSet = RoleSet(0);

    pub const OWNER_ONLY: RoleSet = RoleSet::of(&[Role::Owner]);
    pub const MANAGEMENT: RoleSet = RoleSet::of(&[Role::Owner, Role::Manager]);
    pub const INVENTORY: RoleSet = RoleSet::of(&[Role::Owner, Role::Manager, Role::KitchenStaff]);
    pub const ORDERS: RoleSet = RoleSet::of(&[
        Role::Owner,
        Role::Manager,
        Role::KitchenStaff,
        Role::Waitstaff,
    ]);

    pub const fn of(roles: &[Role]) -> RoleSet {
        let mut bits = 0u8;
        let mut i = 0;
        while i < roles.len() {
            bits |= roles[i].bit();
            i += 1;
        }
        RoleSet(bits)
    }

    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        RoleSet(iter.into_iter().fold(0, |bits, r| bits | r.bit()))
    }
}

impl From<&[Role]> for RoleSet {
    fn from(value: &[Role]) -> Self {
        value.iter().copied().collect()
    }
}

/// Does the user's role belong to `allowed`?
///
/// False for a missing user and for a user without a role (an account whose
/// profile was never provisioned), whatever `allowed` contains.
pub fn has_role(user: Option<&User>, allowed: RoleSet) -> bool {
    user.and_then(|u| u.role).is_some_and(|role| allowed.contains(role))
}

pub fn is_owner(user: Option<&User>) -> bool {
    has_role(user, RoleSet::OWNER_ONLY)
}

pub fn is_manager(user: Option<&User>) -> bool {
    has_role(user, RoleSet::MANAGEMENT)
}

pub fn can_manage_inventory(user: Option<&User>) -> bool {
    has_role(user, RoleSet::INVENTORY)
}

pub fn can_manage_orders(user: Option<&User>) -> bool {
    has_role(user, RoleSet::ORDERS)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use tableside_core::{RestaurantId, UserId};

    use super::*;

    fn user_with(role: Option<Role>) -> User {
        User {
            id: UserId::new(),
            email: "staff@example.com".to_string(),
            name: "Staff".to_string(),
            role,
            restaurant_id: role.map(|_| RestaurantId::new()),
        }
    }

    fn role_strategy() -> impl Strategy<Value = Role> {
        prop::sample::select(Role::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn has_role_is_membership(role in role_strategy(), allowed in prop::collection::vec(role_strategy(), 0..6)) {
            let user = user_with(Some(role));
            let set: RoleSet = allowed.iter().copied().collect();
            prop_assert_eq!(has_role(Some(&user), set), allowed.contains(&role));
        }

        #[test]
        fn missing_user_never_has_a_role(allowed in prop::collection::vec(role_strategy(), 0..6)) {
            let set: RoleSet = allowed.into_iter().collect();
            prop_assert!(!has_role(None, set));
        }
    }

    #[test]
    fn role_less_user_fails_every_predicate() {
        let user = user_with(None);
        assert!(!has_role(Some(&user), RoleSet::ORDERS));
        assert!(!is_owner(Some(&user)));
        assert!(!can_manage_orders(Some(&user)));
    }

    #[test]
    fn named_predicates_match_policy_table() {
        // (role, is_owner, is_manager, can_manage_inventory, can_manage_orders)
        let table = [
            (Role::Owner, true, true, true, true),
            (Role::Manager, false, true, true, true),
            (Role::KitchenStaff, false, false, true, true),
            (Role::Waitstaff, false, false, false, true),
        ];

        for (role, owner, manager, inventory, orders) in table {
            let user = user_with(Some(role));
            let u = Some(&user);
            assert_eq!(is_owner(u), owner, "is_owner({role})");
            assert_eq!(is_manager(u), manager, "is_manager({role})");
            assert_eq!(can_manage_inventory(u), inventory, "can_manage_inventory({role})");
            assert_eq!(can_manage_orders(u), orders, "can_manage_orders({role})");
        }
    }

    #[test]
    fn role_set_iterates_in_declaration_order() {
        let set = RoleSet::from(&[Role::Waitstaff, Role::Owner][..]);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![Role::Owner, Role::Waitstaff]);
        assert!(RoleSet::EMPTY.is_empty());
    }
}
