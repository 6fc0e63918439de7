//! Glyph collision detection interface

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{CollisionSettings, Direction, ShapingParameters};
use crate::error::Result;
use crate::glyph::GlyphRun;
use crate::shaping::Shaper;

/// Axis-aligned rectangle in font units, y up
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

impl Rect {
    pub fn new(x_min: f32, y_min: f32, x_max: f32, y_max: f32) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    pub fn width(&self) -> f32 {
        (self.x_max - self.x_min).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y_max - self.y_min).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self::new(self.x_min + dx, self.y_min + dy, self.x_max + dx, self.y_max + dy)
    }

    /// Overlapping region, if the rectangles share any area.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let r = Rect::new(
            self.x_min.max(other.x_min),
            self.y_min.max(other.y_min),
            self.x_max.min(other.x_max),
            self.y_max.min(other.y_max),
        );
        (r.x_min < r.x_max && r.y_min < r.y_max).then_some(r)
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect::new(
            self.x_min.min(other.x_min),
            self.y_min.min(other.y_min),
            self.x_max.max(other.x_max),
            self.y_max.max(other.y_max),
        )
    }
}

/// GDEF glyph class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GlyphCategory {
    #[default]
    Base,
    Ligature,
    Mark,
    Component,
}

/// A glyph placed at its absolute pen position
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PositionedGlyph {
    pub name: String,
    pub id: u32,
    pub cluster: u32,
    /// Absolute origin of the glyph
    pub x: f32,
    pub y: f32,
    /// Ink bounds at the absolute position; `None` for blank glyphs.
    pub bounds: Option<Rect>,
    pub category: GlyphCategory,
    /// SVG path data at the absolute position, y up
    pub path: Option<String>,
}

/// Two glyphs whose ink overlaps
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub first: String,
    pub second: String,
    pub first_index: usize,
    pub second_index: usize,
    pub overlap: Rect,
}

impl Collision {
    /// `first/second`, the form used by `allowed_collisions`.
    pub fn pair(&self) -> String {
        format!("{}/{}", self.first, self.second)
    }
}

/// Finds colliding glyphs in shaped runs
pub trait CollisionDetector {
    /// Lay out the glyphs of a shaped run at the variation location it was
    /// shaped with.
    fn glyphs_for(
        &self,
        text: &str,
        run: &GlyphRun,
        parameters: &ShapingParameters,
    ) -> Result<Vec<PositionedGlyph>>;

    fn collisions_among(&self, glyphs: &[PositionedGlyph]) -> Vec<Collision>;

    /// SVG picture of the glyphs with the overlaps highlighted.
    fn draw_overlaps(&self, glyphs: &[PositionedGlyph], collisions: &[Collision]) -> String;
}

/// Builds a detector for one document
pub trait DetectorFactory {
    fn build(
        &self,
        shaper: &dyn Shaper,
        settings: &CollisionSettings,
        direction: Direction,
    ) -> Result<Box<dyn CollisionDetector>>;
}

impl<F> DetectorFactory for F
where
    F: Fn(&Path, &CollisionSettings, Direction) -> Result<Box<dyn CollisionDetector>>,
{
    fn build(
        &self,
        shaper: &dyn Shaper,
        settings: &CollisionSettings,
        direction: Direction,
    ) -> Result<Box<dyn CollisionDetector>> {
        self(shaper.font_path(), settings, direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 15.0, 15.0);
        let i = a.intersection(&b).unwrap();
        assert_eq!(i, Rect::new(5.0, 5.0, 10.0, 10.0));
        assert_eq!(i.area(), 25.0);
    }

    #[test]
    fn test_touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 20.0, 10.0);
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn test_translate_and_union() {
        let a = Rect::new(0.0, 0.0, 1.0, 1.0).translate(2.0, 3.0);
        assert_eq!(a, Rect::new(2.0, 3.0, 3.0, 4.0));
        let u = a.union(&Rect::new(-1.0, 0.0, 0.0, 1.0));
        assert_eq!(u, Rect::new(-1.0, 0.0, 3.0, 4.0));
    }

    #[test]
    fn test_pair_format() {
        let c = Collision {
            first: "uni0628".into(),
            second: "dotbelow".into(),
            first_index: 0,
            second_index: 1,
            overlap: Rect::default(),
        };
        assert_eq!(c.pair(), "uni0628/dotbelow");
    }
}
