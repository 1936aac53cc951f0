//! Canonical user record and registration input rules.

use serde::{Deserialize, Serialize};

use tableside_core::{DomainError, DomainResult, RestaurantId, UserId};

use crate::Role;

/// The canonical identity record consumed by every part of the dashboard.
///
/// # Invariants
/// - `id` is issued by the identity provider and never changes.
/// - In steady state a user with a role also has a restaurant. Both are absent
///   for an account whose profile row has not been (or could not be) created;
///   such a user is logged in but unprovisioned, which is distinct from logged out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Option<Role>,
    pub restaurant_id: Option<RestaurantId>,
}

impl User {
    /// True once the profile join succeeded and the user carries a role.
    pub fn is_provisioned(&self) -> bool {
        self.role.is_some()
    }
}

const MIN_NAME_CHARS: usize = 2;
const MIN_PASSWORD_CHARS: usize = 8;

/// Check self-service registration input before anything is sent to the
/// identity provider. Messages are user-facing.
pub fn validate_registration(email: &str, password: &str, name: &str) -> DomainResult<()> {
    if name.trim().chars().count() < MIN_NAME_CHARS {
        return Err(DomainError::validation("Name must be at least 2 characters"));
    }
    if !is_valid_email(email) {
        return Err(DomainError::validation("Please enter a valid email address"));
    }
    validate_password(password)
}

/// Password strength rules shared by registration and password updates.
pub fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(DomainError::validation("Password must be at least 8 characters"));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(DomainError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(DomainError::validation("Password must contain at least one number"));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !email.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_well_formed_registration() {
        assert_eq!(validate_registration("a@b.com", "Aa1aaaaa", "Ann"), Ok(()));
    }

    #[test]
    fn rejects_short_names() {
        let err = validate_registration("a@b.com", "Aa1aaaaa", " A ").unwrap_err();
        assert_eq!(err.to_string(), "Name must be at least 2 characters");
    }

    #[test]
    fn rejects_malformed_emails() {
        for email in ["invalid-email", "@b.com", "a@b", "a@.com", "a@b.com.", "a b@c.com", "a@b@c.com"] {
            assert!(
                validate_registration(email, "Aa1aaaaa", "Ann").is_err(),
                "{email} should be rejected"
            );
        }
    }

    #[test]
    fn password_rules_report_the_first_missing_class() {
        let cases = [
            ("Aa1", "Password must be at least 8 characters"),
            ("aaaaaaa1", "Password must contain at least one uppercase letter"),
            ("AAAAAAA1", "Password must contain at least one lowercase letter"),
            ("Aaaaaaaa", "Password must contain at least one number"),
        ];
        for (password, message) in cases {
            assert_eq!(validate_password(password), Err(DomainError::validation(message)));
        }
    }

    #[test]
    fn provisioned_means_role_present() {
        let mut user = User {
            id: UserId::new(),
            email: "ann@example.com".to_string(),
            name: "Ann".to_string(),
            role: None,
            restaurant_id: None,
        };
        assert!(!user.is_provisioned());

        user.role = Some(Role::Owner);
        assert!(user.is_provisioned());
    }
}
