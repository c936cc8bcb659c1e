use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Portal role. Closed set; privilege is encoded by the authorization policy,
/// not by the enum order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_PORTAL_USER")]
    User,
    #[serde(rename = "ROLE_PORTAL_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_PORTAL_SUPERADMIN")]
    SuperAdmin,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role label '{0}'")]
pub struct UnknownRole(pub String);

impl Role {
    /// Persisted label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "ROLE_PORTAL_USER",
            Role::Admin => "ROLE_PORTAL_ADMIN",
            Role::SuperAdmin => "ROLE_PORTAL_SUPERADMIN",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROLE_PORTAL_USER" => Ok(Role::User),
            "ROLE_PORTAL_ADMIN" => Ok(Role::Admin),
            "ROLE_PORTAL_SUPERADMIN" => Ok(Role::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// Unordered set of roles held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    /// Roles granted on registration: exactly `{User}`.
    pub fn registration_default() -> Self {
        Self::from_iter([Role::User])
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    /// Holds admin or super-admin.
    pub fn is_privileged(&self) -> bool {
        self.contains(Role::Admin) || self.contains(Role::SuperAdmin)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().copied()
    }

    /// Parse persisted labels, failing on the first unknown one.
    pub fn from_labels<I, S>(labels: I) -> Result<Self, UnknownRole>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        labels
            .into_iter()
            .map(|l| l.as_ref().parse::<Role>())
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }

    pub fn labels(&self) -> Vec<String> {
        self.iter().map(|r| r.as_str().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_default_is_only_user() {
        let roles = RoleSet::registration_default();
        assert!(roles.contains(Role::User));
        assert!(!roles.is_privileged());
        assert_eq!(roles.iter().count(), 1);
    }

    #[test]
    fn labels_round_trip_through_parsing() {
        let roles = RoleSet::from_iter([Role::Admin, Role::User]);
        let parsed = RoleSet::from_labels(roles.labels()).unwrap();
        assert_eq!(parsed, roles);
    }

    #[test]
    fn unknown_label_is_rejected() {
        let err = RoleSet::from_labels(["ROLE_PORTAL_USER", "ROLE_GOD"]).unwrap_err();
        assert_eq!(err, UnknownRole("ROLE_GOD".to_string()));
    }

    #[test]
    fn serde_uses_persisted_labels() {
        let json = serde_json::to_string(&RoleSet::from_iter([Role::SuperAdmin])).unwrap();
        assert_eq!(json, r#"["ROLE_PORTAL_SUPERADMIN"]"#);
    }
}
