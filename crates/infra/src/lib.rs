//! Infrastructure layer: persistence adapters for accounts, products and images.

pub mod db;
pub mod store;

pub use store::{
    AccountStore, ImageStore, InMemoryAccountStore, InMemoryImageStore, InMemoryProductStore,
    PgAccountStore, PgImageStore, PgProductStore, ProductStore, StoreError,
};
