//! Shapecheck Common Library
//!
//! Glyph stream model and serializer, diff engine, test documents and their
//! configuration, and the collaborator traits the checks are written against.

pub mod collision;
pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod glyph;
pub mod pattern;
pub mod shaping;

#[cfg(any(test, feature = "test-support"))]
pub mod mock;

// Re-export commonly used types
pub use collision::{
    Collision, CollisionDetector, DetectorFactory, GlyphCategory, PositionedGlyph, Rect,
};
pub use config::{
    resolve, resolve_or, CollisionSettings, Configuration, Direction, FeatureSetting, Features,
    InputType, Parameters, ShapingParameters,
};
pub use diff::{diff, GlyphDiff};
pub use document::{CaseInput, DocumentError, DocumentFile, Expectation, TestCase, TestDocument};
pub use error::{Error, Result};
pub use glyph::{Encoding, GlyphNames, GlyphRecord, GlyphRun};
pub use pattern::{PatternExpander, RecipeExpander};
pub use shaping::Shaper;

/// Shapecheck version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
