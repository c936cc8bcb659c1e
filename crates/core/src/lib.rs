//! `showcase-core`: shared primitives for the showcase backend.
//!
//! Pure types only: identifiers, value objects and the domain error model.

pub mod email;
pub mod error;
pub mod id;

pub use email::Email;
pub use error::{DomainError, DomainResult};
pub use id::{AccountId, ImageId, ProductId};
