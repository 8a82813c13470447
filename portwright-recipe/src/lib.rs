//! # portwright-recipe
//!
//! Build recipe (`portfile.cmake`) generation and in-place patching.
//!
//! New recipes are rendered from a Tera template ([`RecipeEngine`]).
//! Existing recipes are patched through a tolerant CMake argument parser
//! ([`directive::patch`]) that rewrites only the fetch directive's `REF`,
//! `SHA512`, and `HEAD_REF` values.

pub mod directive;
pub mod engine;
pub mod error;
pub mod writer;

pub use directive::{patch, read_fetch_arguments, FetchSpec};
pub use engine::{RecipeContext, RecipeEngine};
pub use error::RecipeError;
