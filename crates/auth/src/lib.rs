//! `showcase-auth`: identity and authorization core (transport/storage agnostic).
//!
//! Establishes "who is asking" (password credentials, bearer tokens) and
//! decides whether that actor may mutate a given account or owned resource.

pub mod account;
pub mod authorize;
pub mod claims;
pub mod error;
pub mod password;
pub mod resolver;
pub mod roles;
pub mod token;

pub use account::{Account, NewAccount, Profile, ProfilePatch};
pub use authorize::{
    can_modify, can_modify_resource, explain_account_modification, Decision, PolicyExplanation,
};
pub use claims::{validate_claims, TokenClaims, TokenValidationError};
pub use error::{AuthError, BoundaryError, LookupError};
pub use password::{hash_password, verify_password, PasswordHashError};
pub use resolver::{AccountLookup, IdentityResolver};
pub use roles::{Role, RoleSet, UnknownRole};
pub use token::{Clock, FixedClock, SystemClock, TokenConfig, TokenError, TokenService};
