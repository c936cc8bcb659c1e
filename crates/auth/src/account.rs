//! Account snapshot and registration/profile inputs.
//!
//! An `Account` is what the persistence layer hands back for a point lookup.
//! It is never mutated in place by this crate; the policy and resolver only
//! read it.

use serde::{Deserialize, Serialize};

use showcase_core::{AccountId, DomainError, DomainResult, Email};

use crate::RoleSet;

/// Public profile attributes of an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub current_company: String,
    pub your_role: String,
    pub headline: String,
    pub about: String,
    pub links: String,
}

/// A registered account as seen by the identity core.
///
/// # Invariants
/// - `email` is the immutable login key.
/// - `roles` is non-empty once registered.
/// - An inactive account never authenticates and is never a mutation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub password_hash: String,
    pub is_active: bool,
    pub roles: RoleSet,
    pub profile: Profile,
}

impl Account {
    /// Build a freshly registered account: active, default roles.
    pub fn register(id: AccountId, new: NewAccount, password_hash: String) -> Self {
        Self {
            id,
            email: new.email,
            password_hash,
            is_active: true,
            roles: RoleSet::registration_default(),
            profile: new.profile,
        }
    }
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: Email,
    pub password: String,
    pub profile: Profile,
}

impl NewAccount {
    pub fn new(email: &str, password: String, profile: Profile) -> DomainResult<Self> {
        let email = Email::parse(email)?;
        if password.is_empty() {
            return Err(DomainError::validation("password cannot be empty"));
        }
        ensure_letters("Name", &profile.name)?;
        ensure_letters("Surname", &profile.surname)?;

        Ok(Self {
            email,
            password,
            profile,
        })
    }
}

/// Partial profile update. Email and roles are deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub surname: Option<String>,
    pub username: Option<String>,
    pub current_company: Option<String>,
    pub your_role: Option<String>,
    pub headline: Option<String>,
    pub about: Option<String>,
    pub links: Option<String>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.surname.is_none()
            && self.username.is_none()
            && self.current_company.is_none()
            && self.your_role.is_none()
            && self.headline.is_none()
            && self.about.is_none()
            && self.links.is_none()
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.is_empty() {
            return Err(DomainError::validation(
                "at least one parameter for user update info should be provided",
            ));
        }
        if let Some(name) = &self.name {
            ensure_letters("Name", name)?;
        }
        if let Some(surname) = &self.surname {
            ensure_letters("Surname", surname)?;
        }
        Ok(())
    }

    pub fn apply(&self, profile: &mut Profile) {
        let fields = [
            (&self.name, &mut profile.name),
            (&self.surname, &mut profile.surname),
            (&self.username, &mut profile.username),
            (&self.current_company, &mut profile.current_company),
            (&self.your_role, &mut profile.your_role),
            (&self.headline, &mut profile.headline),
            (&self.about, &mut profile.about),
            (&self.links, &mut profile.links),
        ];
        for (patch, field) in fields {
            if let Some(value) = patch {
                *field = value.clone();
            }
        }
    }
}

/// Latin or Cyrillic letters and `-`, non-empty.
fn ensure_letters(field: &str, value: &str) -> DomainResult<()> {
    let ok = !value.is_empty()
        && value.chars().all(|c| {
            c.is_ascii_alphabetic() || ('а'..='я').contains(&c) || ('А'..='Я').contains(&c) || c == '-'
        });
    if ok {
        Ok(())
    } else {
        Err(DomainError::validation(format!("{field} should contain only letters")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;

    fn profile(name: &str, surname: &str) -> Profile {
        Profile {
            name: name.to_string(),
            surname: surname.to_string(),
            username: "founder".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn registration_gets_single_user_role_and_is_active() {
        let new = NewAccount::new("ann@example.com", "pw".into(), profile("Ann", "Lee")).unwrap();
        let account = Account::register(AccountId::new(), new, "hash".into());

        assert!(account.is_active);
        assert_eq!(account.roles, RoleSet::from_iter([Role::User]));
        assert_eq!(account.email.as_str(), "ann@example.com");
    }

    #[test]
    fn cyrillic_and_hyphenated_names_are_accepted() {
        assert!(NewAccount::new("ivan@example.com", "pw".into(), profile("Иван", "Петров-Водкин")).is_ok());
    }

    #[test]
    fn names_with_digits_are_rejected() {
        let err = NewAccount::new("r2@example.com", "pw".into(), profile("R2D2", "Droid")).unwrap_err();
        assert_eq!(err, DomainError::validation("Name should contain only letters"));
    }

    #[test]
    fn empty_patch_is_rejected() {
        assert!(ProfilePatch::default().validate().is_err());
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut p = profile("Ann", "Lee");
        let patch = ProfilePatch {
            headline: Some("Building rockets".into()),
            ..Default::default()
        };
        patch.validate().unwrap();
        patch.apply(&mut p);

        assert_eq!(p.headline, "Building rockets");
        assert_eq!(p.name, "Ann");
    }
}
