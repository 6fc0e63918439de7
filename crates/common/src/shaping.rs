//! Shaping collaborator interface

use std::path::Path;

use crate::config::ShapingParameters;
use crate::error::Result;
use crate::glyph::{GlyphNames, GlyphRun};

/// A text shaper bound to a single font
pub trait Shaper: GlyphNames {
    /// File name of the font, as matched by `only`/`exclude` filters.
    fn font_name(&self) -> &str;

    fn font_path(&self) -> &Path;

    /// Shape `text` with the given parameters.
    ///
    /// Any font state changed for the call (variation coordinates) must be
    /// back to its previous value when this returns, whether or not it
    /// succeeded.
    fn shape(&mut self, text: &str, parameters: &ShapingParameters) -> Result<GlyphRun>;

    /// Render a run as an SVG document, when the shaper can draw outlines.
    fn render_svg(&mut self, _run: &GlyphRun, _parameters: &ShapingParameters) -> Option<String> {
        None
    }
}
