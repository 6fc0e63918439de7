//! Glyph outlines as SVG

use indexmap::IndexMap;
use rustybuzz::ttf_parser::{self, GlyphId, OutlineBuilder};
use shapecheck_common::{GlyphRun, Rect};

use crate::color::{layers_of, ColorGlyphs, ColorLayer};

/// Collects outline commands into SVG path data, shifted by an offset.
#[derive(Debug, Default)]
pub struct SvgPathBuilder {
    data: String,
    dx: f32,
    dy: f32,
}

impl SvgPathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder whose output is translated by (`dx`, `dy`).
    pub fn at(dx: f32, dy: f32) -> Self {
        Self {
            data: String::new(),
            dx,
            dy,
        }
    }

    pub fn finish(self) -> String {
        self.data
    }

    fn point(&mut self, x: f32, y: f32) {
        self.data.push_str(&format!("{},{}", x + self.dx, y + self.dy));
    }
}

impl OutlineBuilder for SvgPathBuilder {
    fn move_to(&mut self, x: f32, y: f32) {
        self.data.push('M');
        self.point(x, y);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        self.data.push('L');
        self.point(x, y);
    }

    fn quad_to(&mut self, x1: f32, y1: f32, x: f32, y: f32) {
        self.data.push('Q');
        self.point(x1, y1);
        self.data.push(' ');
        self.point(x, y);
    }

    fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x: f32, y: f32) {
        self.data.push('C');
        self.point(x1, y1);
        self.data.push(' ');
        self.point(x2, y2);
        self.data.push(' ');
        self.point(x, y);
    }

    fn close(&mut self) {
        self.data.push('Z');
    }
}

/// Outline path data of one glyph at the origin.
pub fn glyph_path(face: &ttf_parser::Face<'_>, gid: u32) -> String {
    glyph_path_at(face, gid, 0.0, 0.0)
}

pub fn glyph_path_at(face: &ttf_parser::Face<'_>, gid: u32, dx: f32, dy: f32) -> String {
    let mut builder = SvgPathBuilder::at(dx, dy);
    if let Ok(id) = u16::try_from(gid) {
        face.outline_glyph(GlyphId(id), &mut builder);
    }
    builder.finish()
}

/// Glyph bounds in font units, if the glyph has ink.
pub fn glyph_bounds(face: &ttf_parser::Face<'_>, gid: u32) -> Option<Rect> {
    let id = u16::try_from(gid).ok()?;
    let b = face.glyph_bounding_box(GlyphId(id))?;
    Some(Rect::new(
        b.x_min as f32,
        b.y_min as f32,
        b.x_max as f32,
        b.y_max as f32,
    ))
}

/// A run laid out as SVG: de-duplicated glyph definitions plus placements.
#[derive(Debug)]
pub struct RunDrawing {
    defs: IndexMap<u32, String>,
    uses: Vec<String>,
    x_min: i32,
    y_min: i32,
    x_max: i32,
    y_max: i32,
}

impl RunDrawing {
    /// Start a drawing whose vertical extent covers the font's
    /// ascender and descender.
    pub fn new(ascender: i32, descender: i32) -> Self {
        Self {
            defs: IndexMap::new(),
            uses: Vec::new(),
            x_min: 0,
            y_min: descender,
            x_max: 0,
            y_max: ascender,
        }
    }

    /// Place a glyph drawn as `layers` at (`x`, `y`). `path` is only called
    /// the first time a layer glyph is seen.
    pub fn place(
        &mut self,
        layers: &[ColorLayer],
        x: i32,
        y: i32,
        bounds: Option<Rect>,
        advance: (i32, i32),
        mut path: impl FnMut(u32) -> String,
    ) {
        let mut group = vec![format!("<g transform=\"translate({},{})\">", x, y)];
        for layer in layers {
            let gid = layer.glyph;
            self.defs
                .entry(gid)
                .or_insert_with(|| format!("<path id=\"g{}\" d=\"{}\"/>", gid, path(gid)));
            group.push(match &layer.color {
                Some(color) => format!("<use href=\"#g{}\" {}/>", gid, color.fill()),
                None => format!("<use href=\"#g{}\"/>", gid),
            });
        }
        group.push("</g>".to_string());
        self.uses.push(group.join("\n"));

        if let Some(b) = bounds {
            let (x_advance, y_advance) = advance;
            self.x_min = self.x_min.min(x + (b.x_min as i32).min(0));
            self.y_min = self.y_min.min(y + (b.y_min as i32).min(y_advance));
            self.x_max = self.x_max.max(x + (b.x_max as i32).max(x_advance));
            self.y_max = self.y_max.max(y + (b.y_max as i32).max(0));
        }
    }

    pub fn view_box(&self) -> (i32, i32, i32, i32) {
        (
            self.x_min,
            self.y_min,
            self.x_max - self.x_min,
            self.y_max - self.y_min,
        )
    }

    pub fn finish(self) -> String {
        let (x, y, w, h) = self.view_box();
        let mut lines = vec![
            format!(
                "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" transform=\"matrix(1 0 0 -1 0 0)\">",
                x, y, w, h
            ),
            "<defs>".to_string(),
        ];
        lines.extend(self.defs.into_values());
        lines.push("</defs>".to_string());
        lines.extend(self.uses);
        lines.push("</svg>".to_string());
        lines.push(String::new());
        lines.join("\n")
    }
}

/// Draw a shaped run with the face's current variation coordinates.
/// Color glyphs are drawn layer by layer in their palette colors.
pub fn draw_run(face: &ttf_parser::Face<'_>, run: &GlyphRun) -> String {
    let colors = ColorGlyphs::from_face(face);
    let mut drawing = RunDrawing::new(face.ascender() as i32, face.descender() as i32);
    let (mut x_cursor, mut y_cursor) = (0, 0);
    for glyph in run {
        let x = x_cursor + glyph.x_offset;
        let y = y_cursor + glyph.y_offset;
        drawing.place(
            &layers_of(colors.as_ref(), glyph.id),
            x,
            y,
            glyph_bounds(face, glyph.id),
            (glyph.x_advance, glyph.y_advance),
            |gid| glyph_path(face, gid),
        );
        x_cursor += glyph.x_advance;
        y_cursor += glyph.y_advance;
    }
    drawing.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_builder_commands() {
        let mut b = SvgPathBuilder::new();
        b.move_to(0.0, 0.0);
        b.line_to(100.0, 0.0);
        b.quad_to(150.0, 50.0, 100.0, 100.0);
        b.curve_to(80.0, 120.0, 20.0, 120.0, 0.0, 100.0);
        b.close();
        assert_eq!(
            b.finish(),
            "M0,0L100,0Q150,50 100,100C80,120 20,120 0,100Z"
        );
    }

    #[test]
    fn test_path_builder_offset() {
        let mut b = SvgPathBuilder::at(10.0, -5.0);
        b.move_to(1.0, 1.0);
        b.line_to(2.5, 1.0);
        assert_eq!(b.finish(), "M11,-4L12.5,-4");
    }

    #[test]
    fn test_defs_deduplicated() {
        let mut drawing = RunDrawing::new(800, -200);
        let mut calls = 0;
        for x in [0, 500] {
            drawing.place(&[ColorLayer::plain(7)], x, 0, None, (500, 0), |_| {
                calls += 1;
                "M0,0Z".to_string()
            });
        }
        assert_eq!(calls, 1);
        let svg = drawing.finish();
        assert_eq!(svg.matches("<path id=\"g7\"").count(), 1);
        assert_eq!(svg.matches("<use href=\"#g7\"/>").count(), 2);
        assert!(svg.contains("transform=\"translate(500,0)\""));
    }

    #[test]
    fn test_view_box_from_extents() {
        let mut drawing = RunDrawing::new(800, -200);
        drawing.place(
            &[ColorLayer::plain(1)],
            0,
            0,
            Some(Rect::new(-20.0, -250.0, 480.0, 700.0)),
            (500, 0),
            |_| String::new(),
        );
        drawing.place(
            &[ColorLayer::plain(2)],
            500,
            0,
            Some(Rect::new(10.0, 0.0, 600.0, 900.0)),
            (550, 0),
            |_| String::new(),
        );
        assert_eq!(drawing.view_box(), (-20, -250, 1120, 1150));
        assert!(drawing
            .finish()
            .starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"-20 -250 1120 1150\" transform=\"matrix(1 0 0 -1 0 0)\">"));
    }

    #[test]
    fn test_color_glyph_layers() {
        let colr = crate::color::tests::colr_table();
        let cpal = crate::color::tests::cpal_table();
        let colors = ColorGlyphs::parse(&colr, &cpal).unwrap();

        let mut drawing = RunDrawing::new(800, -200);
        drawing.place(&layers_of(Some(&colors), 5), 0, 0, None, (500, 0), |gid| {
            format!("M{},0Z", gid)
        });
        let svg = drawing.finish();
        assert!(svg.contains("<path id=\"g10\" d=\"M10,0Z\"/>"));
        assert!(svg.contains("<path id=\"g11\" d=\"M11,0Z\"/>"));
        assert!(!svg.contains("id=\"g5\""));
        assert!(svg.contains(
            "<use href=\"#g10\" fill=\"rgb(255,0,0)\" fill-opacity=\"0.502\"/>\n<use href=\"#g11\"/>"
        ));
    }
}
