//! Role-gated dashboard navigation.
//!
//! The same table drives which sidebar entries a user sees and which dashboard
//! sections the server agrees to render for them.

use serde::Serialize;

use crate::{RoleSet, User, has_role};

/// One entry of the dashboard sidebar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
    #[serde(skip)]
    pub allowed: RoleSet,
}

pub const NAVIGATION: [NavItem; 7] = [
    NavItem { name: "Dashboard", href: "/dashboard", allowed: RoleSet::ORDERS },
    NavItem { name: "Orders", href: "/dashboard/orders", allowed: RoleSet::ORDERS },
    NavItem { name: "Menu", href: "/dashboard/menu", allowed: RoleSet::MANAGEMENT },
    NavItem { name: "Inventory", href: "/dashboard/inventory", allowed: RoleSet::INVENTORY },
    NavItem { name: "Analytics", href: "/dashboard/analytics", allowed: RoleSet::MANAGEMENT },
    NavItem { name: "Staff", href: "/dashboard/staff", allowed: RoleSet::MANAGEMENT },
    NavItem { name: "Settings", href: "/dashboard/settings", allowed: RoleSet::MANAGEMENT },
];

/// Sidebar entries visible to `user`. Empty when there is no user or the user
/// has no role yet.
pub fn visible_navigation(user: Option<&User>) -> Vec<NavItem> {
    NAVIGATION
        .iter()
        .filter(|item| has_role(user, item.allowed))
        .copied()
        .collect()
}

/// Whether `user` may open the dashboard section at `path`.
///
/// `None` when `path` is not a known section (the caller decides how to treat
/// unknown pages).
pub fn section_allows(path: &str, user: Option<&User>) -> Option<bool> {
    NAVIGATION
        .iter()
        .find(|item| item.href == path.trim_end_matches('/'))
        .map(|item| has_role(user, item.allowed))
}

#[cfg(test)]
mod tests {
    use tableside_core::{RestaurantId, UserId};

    use super::*;
    use crate::Role;

    fn user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: "x@example.com".to_string(),
            name: "X".to_string(),
            role: Some(role),
            restaurant_id: Some(RestaurantId::new()),
        }
    }

    fn names(items: Vec<NavItem>) -> Vec<&'static str> {
        items.into_iter().map(|i| i.name).collect()
    }

    #[test]
    fn waitstaff_sees_dashboard_and_orders_only() {
        let u = user(Role::Waitstaff);
        assert_eq!(names(visible_navigation(Some(&u))), ["Dashboard", "Orders"]);
    }

    #[test]
    fn kitchen_staff_also_sees_inventory() {
        let u = user(Role::KitchenStaff);
        assert_eq!(names(visible_navigation(Some(&u))), ["Dashboard", "Orders", "Inventory"]);
    }

    #[test]
    fn managers_and_owners_see_everything() {
        for role in [Role::Owner, Role::Manager] {
            let u = user(role);
            assert_eq!(visible_navigation(Some(&u)).len(), NAVIGATION.len());
        }
    }

    #[test]
    fn nobody_sees_anything_without_a_user() {
        assert!(visible_navigation(None).is_empty());
    }

    #[test]
    fn section_access_follows_the_table() {
        let waiter = user(Role::Waitstaff);
        assert_eq!(section_allows("/dashboard/orders", Some(&waiter)), Some(true));
        assert_eq!(section_allows("/dashboard/menu/", Some(&waiter)), Some(false));
        assert_eq!(section_allows("/dashboard/unknown", Some(&waiter)), None);
    }
}
