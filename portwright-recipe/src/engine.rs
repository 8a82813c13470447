//! Tera rendering engine for new recipes.
//!
//! The default `portfile.cmake` template is embedded at compile time. A
//! registry may override it by placing a `portfile.cmake.tera` file in its
//! configured template directory.

use std::io::ErrorKind;
use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::directive::{format_value, FetchSpec};
use crate::error::{io_err, RecipeError};

pub const RECIPE_TEMPLATE: &str = "portfile.cmake.tera";

const DEFAULT_TEMPLATE: &str = include_str!("templates/portfile.cmake.tera");

/// The override in `dir`, or the embedded default when `dir` has none.
fn template_source(dir: Option<&Path>) -> Result<String, RecipeError> {
    let Some(path) = dir.map(|dir| dir.join(RECIPE_TEMPLATE)) else {
        return Ok(DEFAULT_TEMPLATE.to_owned());
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            tracing::debug!("recipe template override {}", path.display());
            Ok(text)
        }
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(DEFAULT_TEMPLATE.to_owned()),
        Err(err) => Err(io_err(&path, err)),
    }
}

// ---------------------------------------------------------------------------
// RecipeContext
// ---------------------------------------------------------------------------

/// Rendering payload for the recipe template. Values are already formatted
/// as CMake arguments (quoted where necessary).
#[derive(Debug, Clone, Serialize)]
pub struct RecipeContext {
    pub port: String,
    pub repo: String,
    pub git_ref: String,
    pub sha512: String,
    pub head_ref: String,
}

impl RecipeContext {
    pub fn new(port: &str, spec: &FetchSpec) -> Self {
        Self {
            port: port.to_owned(),
            repo: format_value(&spec.repo, false),
            git_ref: format_value(&spec.git_ref, false),
            sha512: format_value(&spec.sha512, false),
            head_ref: format_value(&spec.head_ref, false),
        }
    }
}

// ---------------------------------------------------------------------------
// RecipeEngine
// ---------------------------------------------------------------------------

/// Renders new recipes. Create once and reuse.
pub struct RecipeEngine {
    tera: Tera,
}

impl RecipeEngine {
    /// Embedded template only.
    pub fn new() -> Result<Self, RecipeError> {
        Self::with_overrides(None)
    }

    /// `portfile.cmake.tera` from `template_dir` if present, else the embedded one.
    pub fn with_overrides(template_dir: Option<&Path>) -> Result<Self, RecipeError> {
        let mut tera = Tera::default();
        tera.add_raw_template(RECIPE_TEMPLATE, &template_source(template_dir)?)?;
        Ok(RecipeEngine { tera })
    }

    /// Render the full text of a new recipe.
    pub fn render(&self, ctx: &RecipeContext) -> Result<String, RecipeError> {
        let tera_ctx = Context::from_serialize(ctx)?;
        let rendered = self.tera.render(RECIPE_TEMPLATE, &tera_ctx)?;
        Ok(rendered.replace("\r\n", "\n"))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
