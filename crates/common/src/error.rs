//! Error types for shapecheck

use thiserror::Error;

/// Result type alias using the shapecheck Error
pub type Result<T> = std::result::Result<T, Error>;

/// Shapecheck error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("Couldn't parse glyph {token} in {stream}")]
    InvalidGlyphToken { token: String, stream: String },

    #[error("Invalid feature setting '{0}'")]
    InvalidFeature(String),

    #[error("Invalid shaping parameter {name}: {value}")]
    InvalidParameter { name: String, value: String },

    #[error("Invalid recipe '{recipe}': {reason}")]
    InvalidRecipe { recipe: String, reason: String },

    #[error("Recipe '{recipe}' expands to more than {limit} strings")]
    RecipeTooLarge { recipe: String, limit: usize },

    #[error("Recipe '{0}' expanded to no strings")]
    EmptyExpansion(String),

    #[error("Shaping failed: {0}")]
    Shaping(String),

    #[error("Collision detector error: {0}")]
    Collision(String),
}

impl Error {
    /// Stable report code for errors surfaced while executing a test case.
    pub fn code(&self) -> &'static str {
        match self {
            Error::EmptyExpansion(_) => "empty-expansion",
            Error::InvalidRecipe { .. } | Error::RecipeTooLarge { .. } => "invalid-recipe",
            Error::Collision(_) => "prepare-failed",
            _ => "shaping-error",
        }
    }
}
