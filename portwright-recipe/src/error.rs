//! Error types for portwright-recipe.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering or patching a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// Filesystem error while reading/writing a recipe or loading templates.
    #[error("recipe io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic write failure from the shared registry store.
    #[error("registry error: {0}")]
    Registry(#[from] portwright_core::RegistryError),

    /// The recipe has no usable fetch directive.
    #[error("malformed recipe: {reason}")]
    Malformed { reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> RecipeError {
    RecipeError::Io {
        path: path.into(),
        source,
    }
}
