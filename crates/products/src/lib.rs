//! Product listings domain module.
//!
//! Startup product showcases and their image gallery, as plain validated data
//! (no IO, no HTTP, no storage).

pub mod image;
pub mod product;

pub use image::{image_filename, ProductImage};
pub use product::{NewProduct, Product, ProductDetails, ProductPatch, ProductStatus};
