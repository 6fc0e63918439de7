//! Table-driven collaborators for tests
//!
//! `MockShaper` maps each character to one glyph with a fixed advance, one
//! glyph per character, clusters at UTF-8 byte offsets. `MockCollider`
//! reports a collision for every configured name pair found in a run.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::collision::{Collision, CollisionDetector, PositionedGlyph, Rect};
use crate::config::{CollisionSettings, Direction, ShapingParameters};
use crate::error::{Error, Result};
use crate::glyph::{GlyphNames, GlyphRecord, GlyphRun};
use crate::shaping::Shaper;

#[derive(Debug, Clone)]
pub struct MockShaper {
    font_name: String,
    font_path: PathBuf,
    /// Indexed by glyph id: (name, advance)
    glyphs: Vec<(String, i32)>,
    cmap: HashMap<char, u32>,
    fail_on: Option<String>,
    draws: bool,
}

impl MockShaper {
    pub fn new(font_name: &str) -> Self {
        Self {
            font_name: font_name.to_string(),
            font_path: PathBuf::from(font_name),
            glyphs: vec![(".notdef".to_string(), 500)],
            cmap: HashMap::new(),
            fail_on: None,
            draws: false,
        }
    }

    /// Map `ch` to a glyph called `name`.
    pub fn with_glyph(mut self, ch: char, name: &str, advance: i32) -> Self {
        let id = match self.glyph_id(name) {
            Some(id) => id,
            None => {
                self.glyphs.push((name.to_string(), advance));
                (self.glyphs.len() - 1) as u32
            }
        };
        self.cmap.insert(ch, id);
        self
    }

    /// Change the advance of an existing glyph.
    pub fn with_advance(mut self, name: &str, advance: i32) -> Self {
        if let Some(entry) = self.glyphs.iter_mut().find(|(n, _)| n == name) {
            entry.1 = advance;
        }
        self
    }

    /// Fail whenever this exact text is shaped.
    pub fn fail_on(mut self, text: &str) -> Self {
        self.fail_on = Some(text.to_string());
        self
    }

    /// Produce a placeholder SVG from `render_svg`.
    pub fn drawing(mut self) -> Self {
        self.draws = true;
        self
    }

    pub fn with_path(mut self, path: &Path) -> Self {
        self.font_path = path.to_path_buf();
        self
    }

    /// Glyph names indexed by id.
    pub fn glyph_table(&self) -> Vec<String> {
        self.glyphs.iter().map(|(n, _)| n.clone()).collect()
    }
}

impl GlyphNames for MockShaper {
    fn glyph_name(&self, id: u32) -> String {
        self.glyphs
            .get(id as usize)
            .map(|(n, _)| n.clone())
            .unwrap_or_else(|| format!("gid{}", id))
    }

    fn glyph_id(&self, name: &str) -> Option<u32> {
        self.glyphs
            .iter()
            .position(|(n, _)| n == name)
            .map(|i| i as u32)
    }
}

impl Shaper for MockShaper {
    fn font_name(&self) -> &str {
        &self.font_name
    }

    fn font_path(&self) -> &Path {
        &self.font_path
    }

    fn shape(&mut self, text: &str, parameters: &ShapingParameters) -> Result<GlyphRun> {
        if self.fail_on.as_deref() == Some(text) {
            return Err(Error::Shaping(format!("cannot shape {}", text)));
        }
        let mut glyphs: Vec<GlyphRecord> = text
            .char_indices()
            .map(|(offset, ch)| {
                let id = self.cmap.get(&ch).copied().unwrap_or(0);
                let advance = self.glyphs[id as usize].1;
                GlyphRecord::new(id, offset as u32).with_advance(advance, 0)
            })
            .collect();
        if parameters.direction.is_some_and(|d| d.is_backward()) {
            glyphs.reverse();
        }
        Ok(GlyphRun::new(glyphs))
    }

    fn render_svg(&mut self, run: &GlyphRun, _parameters: &ShapingParameters) -> Option<String> {
        self.draws.then(|| {
            format!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\"><text>{}</text></svg>",
                run.names(&*self).join(" ")
            )
        })
    }
}

/// Collides configured glyph-name pairs wherever both appear in a run
#[derive(Debug, Clone, Default)]
pub struct MockCollider {
    names: Vec<String>,
    pairs: Vec<(String, String)>,
    /// Glyphs have ink only at this axis value when set
    location: Option<(String, f32)>,
}

impl MockCollider {
    pub fn new(names: Vec<String>, pairs: &[(&str, &str)]) -> Self {
        Self {
            names,
            pairs: pairs
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            location: None,
        }
    }

    /// Only lay out ink when shaped with `axis` set to `value`.
    pub fn inked_at(mut self, axis: &str, value: f32) -> Self {
        self.location = Some((axis.to_string(), value));
        self
    }

    fn inked(&self, parameters: &ShapingParameters) -> bool {
        let Some((axis, value)) = &self.location else {
            return true;
        };
        parameters
            .variations
            .as_ref()
            .and_then(|v| v.get(axis))
            .is_some_and(|v| v == value)
    }

    /// A factory building this detector for every document.
    pub fn factory(
        self,
    ) -> impl Fn(&Path, &CollisionSettings, Direction) -> Result<Box<dyn CollisionDetector>> {
        move |_: &Path, _: &CollisionSettings, _: Direction| {
            Ok(Box::new(self.clone()) as Box<dyn CollisionDetector>)
        }
    }

    /// A factory that always fails.
    pub fn failing(
        reason: &str,
    ) -> impl Fn(&Path, &CollisionSettings, Direction) -> Result<Box<dyn CollisionDetector>> {
        let reason = reason.to_string();
        move |_: &Path, _: &CollisionSettings, _: Direction| Err(Error::Collision(reason.clone()))
    }
}

impl CollisionDetector for MockCollider {
    fn glyphs_for(
        &self,
        _text: &str,
        run: &GlyphRun,
        parameters: &ShapingParameters,
    ) -> Result<Vec<PositionedGlyph>> {
        let inked = self.inked(parameters);
        let mut x = 0.0;
        let mut glyphs = Vec::with_capacity(run.len());
        for record in run {
            let name = match &record.name {
                Some(name) => name.clone(),
                None => self
                    .names
                    .get(record.id as usize)
                    .cloned()
                    .unwrap_or_else(|| format!("gid{}", record.id)),
            };
            let advance = record.x_advance as f32;
            glyphs.push(PositionedGlyph {
                name,
                id: record.id,
                cluster: record.cluster,
                x,
                y: 0.0,
                bounds: inked.then(|| Rect::new(x, 0.0, x + advance, 100.0)),
                ..Default::default()
            });
            x += advance;
        }
        Ok(glyphs)
    }

    fn collisions_among(&self, glyphs: &[PositionedGlyph]) -> Vec<Collision> {
        let mut collisions = Vec::new();
        for (i, first) in glyphs.iter().enumerate() {
            for (j, second) in glyphs.iter().enumerate().skip(i + 1) {
                if first.bounds.is_some()
                    && second.bounds.is_some()
                    && self
                    .pairs
                    .iter()
                    .any(|(a, b)| *a == first.name && *b == second.name)
                {
                    collisions.push(Collision {
                        first: first.name.clone(),
                        second: second.name.clone(),
                        first_index: i,
                        second_index: j,
                        overlap: Rect::default(),
                    });
                }
            }
        }
        collisions
    }

    fn draw_overlaps(&self, _glyphs: &[PositionedGlyph], collisions: &[Collision]) -> String {
        let pairs: Vec<String> = collisions.iter().map(Collision::pair).collect();
        format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\"><desc>{}</desc></svg>",
            pairs.join(",")
        )
    }
}
