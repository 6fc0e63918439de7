//! Standalone SVG text samples

use indexmap::IndexMap;
use tracing::debug;

use shapecheck_common::{Features, GlyphRun, Rect, Result, Shaper, ShapingParameters};

use crate::color::{layers_of, Color, ColorGlyphs};
use crate::shaper::FontShaper;
use crate::svg::{glyph_bounds, glyph_path};

type Location = Option<IndexMap<String, f32>>;

const MARGIN: f32 = 100.0;

#[derive(Debug, Clone, Default)]
pub struct SampleOptions {
    /// HarfBuzz-style feature list, e.g. `+ss01,-liga`
    pub features: Option<String>,
    pub foreground: Option<Color>,
    pub background: Option<Color>,
}

/// A placed glyph and its outline layers, each with an optional color.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleGlyph {
    pub x: i32,
    pub y: i32,
    pub layers: Vec<(String, Option<Color>)>,
}

/// One shaped line: glyph placements relative to the line origin.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleLine {
    pub glyphs: Vec<SampleGlyph>,
    pub bounds: Rect,
}

impl SampleLine {
    pub fn from_run(
        run: &GlyphRun,
        bounds_of: impl Fn(u32) -> Option<Rect>,
        layers_of: impl Fn(u32) -> Vec<(String, Option<Color>)>,
    ) -> Self {
        let mut line = SampleLine::default();
        let mut ink: Option<Rect> = None;
        let (mut x, mut y) = (0, 0);
        for glyph in run {
            let gx = x + glyph.x_offset;
            let gy = y + glyph.y_offset;
            line.glyphs.push(SampleGlyph {
                x: gx,
                y: gy,
                layers: layers_of(glyph.id),
            });
            if let Some(b) = bounds_of(glyph.id) {
                let placed = b.translate(gx as f32, gy as f32);
                ink = Some(ink.map_or(placed, |r| r.union(&placed)));
            }
            x += glyph.x_advance;
            y += glyph.y_advance;
        }
        line.bounds = ink.unwrap_or_default();
        line
    }
}

/// Locations to draw the sample at: named instances from lightest to
/// heaviest, or the default location when there are none.
pub fn sample_locations(mut instances: Vec<IndexMap<String, f32>>) -> Vec<Location> {
    if instances.is_empty() {
        return vec![None];
    }
    let weight = |i: &IndexMap<String, f32>| i.get("wght").copied().unwrap_or(f32::NEG_INFINITY);
    instances.sort_by(|a, b| weight(a).total_cmp(&weight(b)));
    instances.into_iter().map(Some).collect()
}

/// Every line of `text` at every location, location-major.
pub fn sample_lines(
    locations: &[Location],
    text: &str,
    mut line_at: impl FnMut(&str, Option<&IndexMap<String, f32>>) -> Result<SampleLine>,
) -> Result<Vec<SampleLine>> {
    let mut lines = Vec::with_capacity(locations.len());
    for location in locations {
        for text_line in text.split('\n') {
            lines.push(line_at(text_line, location.as_ref())?);
        }
    }
    Ok(lines)
}

/// Stack lines bottom-up with a margin between them, center each one and
/// produce the SVG document.
pub fn compose(lines: &[SampleLine], options: &SampleOptions) -> String {
    let mut placed = Vec::with_capacity(lines.len());
    let mut total: Option<Rect> = None;
    let mut y = MARGIN;
    for line in lines.iter().rev() {
        let rect = line.bounds.translate(0.0, y);
        total = Some(total.map_or(rect, |t| t.union(&rect)));
        placed.push((line, rect, y));
        y += line.bounds.height() + MARGIN;
    }
    let bounds = total.unwrap_or_default();
    let view = Rect::new(
        bounds.x_min - MARGIN,
        bounds.y_min - MARGIN,
        bounds.x_max + MARGIN,
        bounds.y_max + MARGIN,
    );

    let mut svg = vec![format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"{} {} {} {}\" transform=\"matrix(1 0 0 -1 0 0)\">",
        view.x_min,
        view.y_min,
        view.width(),
        view.height()
    )];
    if let Some(background) = &options.background {
        svg.push(format!(
            "<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" {}/>",
            view.x_min,
            view.y_min,
            view.width(),
            view.height(),
            background.fill()
        ));
    }
    let fill = options
        .foreground
        .map(|c| format!(" {}", c.fill()))
        .unwrap_or_default();
    for (line, rect, y) in placed {
        let x = (bounds.x_min + bounds.x_max - rect.x_min - rect.x_max) / 2.0;
        svg.push(format!("<g transform=\"translate({},{})\"{}>", x, y, fill));
        for glyph in &line.glyphs {
            for (path, color) in &glyph.layers {
                if path.is_empty() {
                    continue;
                }
                let color = color.map(|c| format!(" {}", c.fill())).unwrap_or_default();
                svg.push(format!(
                    "<path transform=\"translate({},{})\" d=\"{}\"{}/>",
                    glyph.x, glyph.y, path, color
                ));
            }
        }
        svg.push("</g>".to_string());
    }
    svg.push("</svg>".to_string());
    svg.push(String::new());
    svg.join("\n")
}

/// Render `text`, one line per `\n`, as an SVG sample. Variable fonts
/// get every line at each of their named instances.
pub fn render_sample(shaper: &mut FontShaper<'_>, text: &str, options: &SampleOptions) -> Result<String> {
    let locations = sample_locations(shaper.named_instances());
    debug!("Rendering sample at {} locations", locations.len());
    let lines = sample_lines(&locations, text, |line, location| {
        let parameters = ShapingParameters {
            features: options.features.clone().map(Features::Spec),
            variations: location.cloned(),
            ..Default::default()
        };
        let run = shaper.shape(line, &parameters)?;
        shaper.with_location(location, |face| {
            let colors = ColorGlyphs::from_face(face);
            SampleLine::from_run(
                &run,
                |gid| glyph_bounds(face, gid),
                |gid| {
                    layers_of(colors.as_ref(), gid)
                        .into_iter()
                        .map(|layer| (glyph_path(face, layer.glyph), layer.color))
                        .collect()
                },
            )
        })
    })?;
    Ok(compose(&lines, options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecheck_common::GlyphRecord;

    fn glyph(x: i32, y: i32, path: &str) -> SampleGlyph {
        SampleGlyph {
            x,
            y,
            layers: vec![(path.to_string(), None)],
        }
    }

    fn weight(value: f32) -> IndexMap<String, f32> {
        IndexMap::from([("wght".to_string(), value)])
    }

    #[test]
    fn test_line_bounds() {
        let run = GlyphRun::new(vec![
            GlyphRecord::new(1, 0).with_advance(500, 0),
            GlyphRecord::new(2, 1).with_offset(0, 50).with_advance(400, 0),
        ]);
        let line = SampleLine::from_run(
            &run,
            |gid| match gid {
                1 => Some(Rect::new(10.0, 0.0, 490.0, 700.0)),
                _ => Some(Rect::new(0.0, -200.0, 400.0, 500.0)),
            },
            |gid| vec![(format!("g{}", gid), None)],
        );
        assert_eq!(line.glyphs, vec![glyph(0, 0, "g1"), glyph(500, 50, "g2")]);
        assert_eq!(line.bounds, Rect::new(10.0, -150.0, 900.0, 700.0));
    }

    #[test]
    fn test_compose_stacks_lines() {
        let line = SampleLine {
            glyphs: vec![glyph(0, 0, "M0,0Z")],
            bounds: Rect::new(0.0, 0.0, 500.0, 700.0),
        };
        let options = SampleOptions {
            background: Some("ffffff".parse().unwrap()),
            foreground: Some("000000".parse().unwrap()),
            ..Default::default()
        };
        let svg = compose(&[line.clone(), line], &options);
        assert!(svg.contains("viewBox=\"-100 0 700 1700\""));
        assert!(svg.contains("translate(0,100)"));
        assert!(svg.contains("translate(0,900)"));
        assert!(svg.contains("<rect x=\"-100\" y=\"0\" width=\"700\" height=\"1700\" fill=\"rgb(255,255,255)\"/>"));
        assert_eq!(svg.matches("fill=\"rgb(0,0,0)\"").count(), 2);
    }

    #[test]
    fn test_blank_glyphs_skipped() {
        let line = SampleLine {
            glyphs: vec![glyph(0, 0, "")],
            bounds: Rect::default(),
        };
        let svg = compose(&[line], &SampleOptions::default());
        assert!(!svg.contains("<path"));
    }

    #[test]
    fn test_color_layers_filled() {
        let red = Color { red: 255, green: 0, blue: 0, alpha: 255 };
        let line = SampleLine {
            glyphs: vec![SampleGlyph {
                x: 0,
                y: 0,
                layers: vec![("M1,1Z".to_string(), Some(red)), ("M2,2Z".to_string(), None)],
            }],
            bounds: Rect::new(0.0, 0.0, 10.0, 10.0),
        };
        let svg = compose(&[line], &SampleOptions::default());
        assert!(svg.contains("d=\"M1,1Z\" fill=\"rgb(255,0,0)\"/>"));
        assert!(svg.contains("d=\"M2,2Z\"/>"));
    }

    #[test]
    fn test_locations_sorted_by_weight() {
        let locations = sample_locations(vec![weight(700.0), weight(100.0), weight(400.0)]);
        let weights: Vec<f32> = locations
            .iter()
            .map(|l| l.as_ref().unwrap()["wght"])
            .collect();
        assert_eq!(weights, vec![100.0, 400.0, 700.0]);
        assert_eq!(sample_locations(Vec::new()), vec![None]);
    }

    #[test]
    fn test_one_row_per_instance() {
        let locations = sample_locations(vec![weight(700.0), weight(300.0)]);
        let mut drawn = Vec::new();
        let lines = sample_lines(&locations, "ab\ncd", |text, location| {
            drawn.push((text.to_string(), location.map(|l| l["wght"])));
            Ok(SampleLine {
                glyphs: vec![glyph(0, 0, "M0,0Z")],
                bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
            })
        })
        .unwrap();
        assert_eq!(
            drawn,
            vec![
                ("ab".to_string(), Some(300.0)),
                ("cd".to_string(), Some(300.0)),
                ("ab".to_string(), Some(700.0)),
                ("cd".to_string(), Some(700.0)),
            ]
        );
        let svg = compose(&lines, &SampleOptions::default());
        assert_eq!(svg.matches("<g transform=").count(), 4);
    }
}
