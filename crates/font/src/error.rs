//! Font loading errors

use std::path::PathBuf;
use thiserror::Error;

pub type FontResult<T> = std::result::Result<T, FontError>;

#[derive(Error, Debug)]
pub enum FontError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{path}: not a usable font ({reason})")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid color '{0}', expected RRGGBB or RRGGBBAA")]
    InvalidColor(String),

    #[error(transparent)]
    Shaping(#[from] shapecheck_common::Error),
}

impl From<FontError> for shapecheck_common::Error {
    fn from(err: FontError) -> Self {
        match err {
            FontError::Shaping(inner) => inner,
            other => shapecheck_common::Error::Collision(other.to_string()),
        }
    }
}
