//! Authorization types.

use crate::models::Role;
use std::fmt;

/// Allow-list of roles for a route.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct RoleSet {
    bits: u8,
}

impl RoleSet {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub const fn all() -> Self {
        Self::empty()
            .with(Role::User)
            .with(Role::Guide)
            .with(Role::LeadGuide)
            .with(Role::Admin)
    }

    pub const fn with(self, role: Role) -> Self {
        Self {
            bits: self.bits | Self::bit(role),
        }
    }

    pub fn from_roles(roles: &[Role]) -> Self {
        roles.iter().fold(Self::empty(), |set, role| set.with(*role))
    }

    pub const fn contains(self, role: Role) -> bool {
        self.bits & Self::bit(role) != 0
    }

    pub fn roles(self) -> impl Iterator<Item = Role> {
        [Role::User, Role::Guide, Role::LeadGuide, Role::Admin]
            .into_iter()
            .filter(move |role| self.contains(*role))
    }

    const fn bit(role: Role) -> u8 {
        match role {
            Role::User => 1,
            Role::Guide => 1 << 1,
            Role::LeadGuide => 1 << 2,
            Role::Admin => 1 << 3,
        }
    }
}

impl fmt::Debug for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.roles()).finish()
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.roles().map(Role::as_str).collect();
        f.write_str(&names.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership() {
        let set = RoleSet::from_roles(&[Role::Admin, Role::LeadGuide]);
        assert!(set.contains(Role::Admin));
        assert!(set.contains(Role::LeadGuide));
        assert!(!set.contains(Role::Guide));
        assert!(!set.contains(Role::User));
        assert_eq!(set.to_string(), "lead-guide,admin");
    }

    #[test]
    fn test_all_and_empty() {
        assert!(RoleSet::all().roles().count() == 4);
        assert!(!RoleSet::empty().contains(Role::Admin));
    }
}
