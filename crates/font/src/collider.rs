//! Bounding-box collision detection

use rustybuzz::ttf_parser::{self, gdef::GlyphClass, GlyphId};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use shapecheck_common::{
    Collision, CollisionDetector, CollisionSettings, Direction, GlyphCategory, GlyphRun,
    PositionedGlyph, Rect, Result, ShapingParameters,
};

use crate::error::FontResult;
use crate::font::FontData;
use crate::shaper::{default_coordinates, VariationScope};
use crate::svg::{glyph_bounds, glyph_path_at};

/// Detects overlapping glyph bounding boxes in shaped runs.
#[derive(Debug)]
pub struct BoundsCollider {
    data: FontData,
    settings: CollisionSettings,
    direction: Direction,
}

impl BoundsCollider {
    pub fn open(path: &Path, settings: &CollisionSettings, direction: Direction) -> FontResult<Self> {
        let data = FontData::open(path)?;
        debug!(
            "Collision detector for {} ({:?}, {})",
            data.file_name(),
            settings,
            direction
        );
        Ok(Self {
            data,
            settings: settings.clone(),
            direction,
        })
    }

    /// Factory signature used by the collision check.
    pub fn build(
        path: &Path,
        settings: &CollisionSettings,
        direction: Direction,
    ) -> Result<Box<dyn CollisionDetector>> {
        Ok(Box::new(Self::open(path, settings, direction)?))
    }

    pub fn settings(&self) -> &CollisionSettings {
        &self.settings
    }
}

fn category(face: &ttf_parser::Face<'_>, gid: u32) -> GlyphCategory {
    let class = u16::try_from(gid)
        .ok()
        .and_then(|id| face.tables().gdef.and_then(|gdef| gdef.glyph_class(GlyphId(id))));
    match class {
        Some(GlyphClass::Mark) => GlyphCategory::Mark,
        Some(GlyphClass::Ligature) => GlyphCategory::Ligature,
        Some(GlyphClass::Component) => GlyphCategory::Component,
        Some(GlyphClass::Base) | None => GlyphCategory::Base,
    }
}

impl CollisionDetector for BoundsCollider {
    fn glyphs_for(
        &self,
        _text: &str,
        run: &GlyphRun,
        parameters: &ShapingParameters,
    ) -> Result<Vec<PositionedGlyph>> {
        let mut face = self.data.face()?;
        let defaults = default_coordinates(&face);
        let scope = VariationScope::apply(&mut face, &defaults, parameters.variations.as_ref())?;
        let face = scope.face();
        let (mut x_cursor, mut y_cursor) = (0i32, 0i32);
        let mut glyphs = Vec::with_capacity(run.len());
        for record in run {
            let x = (x_cursor + record.x_offset) as f32;
            let y = (y_cursor + record.y_offset) as f32;
            let name = match &record.name {
                Some(name) => name.clone(),
                None => u16::try_from(record.id)
                    .ok()
                    .and_then(|id| face.glyph_name(GlyphId(id)))
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("gid{}", record.id)),
            };
            glyphs.push(PositionedGlyph {
                name,
                id: record.id,
                cluster: record.cluster,
                x,
                y,
                bounds: glyph_bounds(face, record.id).map(|b| b.translate(x, y)),
                category: category(face, record.id),
                path: Some(glyph_path_at(face, record.id, x, y)),
            });
            x_cursor += record.x_advance;
            y_cursor += record.y_advance;
        }

        // Runs come back in visual order; pair names read in logical order.
        if self.direction.is_backward() {
            glyphs.reverse();
        }
        Ok(glyphs)
    }

    fn collisions_among(&self, glyphs: &[PositionedGlyph]) -> Vec<Collision> {
        find_collisions(glyphs, &self.settings)
    }

    fn draw_overlaps(&self, glyphs: &[PositionedGlyph], collisions: &[Collision]) -> String {
        overlay_svg(glyphs, collisions)
    }
}

/// Whether the rule governing this pair of glyphs is enabled.
fn pair_enabled(
    settings: &CollisionSettings,
    first: &PositionedGlyph,
    second: &PositionedGlyph,
    cluster_distance: usize,
) -> bool {
    let is_mark = |g: &PositionedGlyph| g.category == GlyphCategory::Mark;
    if is_mark(first) && is_mark(second) {
        return settings.marks;
    }
    match cluster_distance {
        // Marks overlap the base they attach to.
        0 => false,
        1 if !is_mark(first) && !is_mark(second) => settings.bases,
        1 => settings.adjacent_clusters,
        _ => settings.faraway,
    }
}

/// Colliding pairs among glyphs given in logical order.
pub fn find_collisions(glyphs: &[PositionedGlyph], settings: &CollisionSettings) -> Vec<Collision> {
    let clusters: Vec<u32> = glyphs
        .iter()
        .map(|g| g.cluster)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let rank = |cluster: u32| clusters.binary_search(&cluster).unwrap_or(0);

    let mut collisions = Vec::new();
    for (i, first) in glyphs.iter().enumerate() {
        let Some(a) = first.bounds else { continue };
        for (j, second) in glyphs.iter().enumerate().skip(i + 1) {
            let Some(b) = second.bounds else { continue };
            let distance = rank(first.cluster).abs_diff(rank(second.cluster));
            if !pair_enabled(settings, first, second, distance) {
                continue;
            }
            let Some(overlap) = a.intersection(&b) else {
                continue;
            };
            let smaller = a.area().min(b.area());
            if settings.area > 0.0 && smaller > 0.0 && overlap.area() / smaller < settings.area {
                continue;
            }
            collisions.push(Collision {
                first: first.name.clone(),
                second: second.name.clone(),
                first_index: i,
                second_index: j,
                overlap,
            });
        }
    }
    collisions
}

/// Single-line SVG of the glyphs with overlap rectangles highlighted.
pub fn overlay_svg(glyphs: &[PositionedGlyph], collisions: &[Collision]) -> String {
    let view = glyphs
        .iter()
        .filter_map(|g| g.bounds)
        .reduce(|a, b| a.union(&b))
        .unwrap_or_default();
    let margin = 20.0;

    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" transform=\"matrix(1 0 0 -1 0 0)\">",
        view.x_min - margin,
        view.y_min - margin,
        view.width() + 2.0 * margin,
        view.height() + 2.0 * margin
    );
    let colliding: BTreeSet<usize> = collisions
        .iter()
        .flat_map(|c| [c.first_index, c.second_index])
        .collect();
    for (index, glyph) in glyphs.iter().enumerate() {
        let Some(path) = glyph.path.as_deref().filter(|p| !p.is_empty()) else {
            continue;
        };
        let fill = if colliding.contains(&index) {
            "#3060c0"
        } else {
            "#888888"
        };
        svg.push_str(&format!(
            "<path d=\"{}\" fill=\"{}\" fill-opacity=\"0.6\"/>",
            path, fill
        ));
    }
    for collision in collisions {
        let r = collision.overlap;
        svg.push_str(&format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"#ff0000\" fill-opacity=\"0.5\"/>",
            r.x_min,
            r.y_min,
            r.width(),
            r.height()
        ));
    }
    svg.push_str("</svg>");
    svg
}
