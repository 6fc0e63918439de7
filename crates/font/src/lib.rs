//! Shapecheck font backend
//!
//! Concrete collaborators over real font files: a rustybuzz shaper, SVG
//! drawing of shaped runs, a bounding-box collision detector and the
//! sample renderer, with COLR color glyphs drawn layer by layer.

pub mod collider;
pub mod color;
pub mod error;
pub mod font;
pub mod sample;
pub mod shaper;
pub mod svg;

pub use collider::BoundsCollider;
pub use error::{FontError, FontResult};
pub use font::FontData;
pub use color::Color;
pub use sample::{render_sample, SampleOptions};
pub use shaper::{FontShaper, VariationScope};
