//! Colors and COLR/CPAL layered glyphs

use rustybuzz::ttf_parser::{self, Tag};
use std::str::FromStr;

use crate::error::FontError;

/// Palette index standing for the text color
const FOREGROUND_INDEX: u16 = 0xFFFF;

/// An sRGB color with alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: u8,
}

impl Color {
    /// SVG `fill` attributes for this color.
    pub fn fill(&self) -> String {
        let mut attrs = format!("fill=\"rgb({},{},{})\"", self.red, self.green, self.blue);
        if self.alpha != 255 {
            attrs.push_str(&format!(
                " fill-opacity=\"{:.3}\"",
                f32::from(self.alpha) / 255.0
            ));
        }
        attrs
    }
}

impl FromStr for Color {
    type Err = FontError;

    /// `RRGGBB` or `RRGGBBAA`, optionally prefixed with `#`.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || FontError::InvalidColor(s.to_string());
        let hex = s.strip_prefix('#').unwrap_or(s);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return Err(invalid());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            red: byte(0)?,
            green: byte(2)?,
            blue: byte(4)?,
            alpha: if hex.len() == 8 { byte(6)? } else { 255 },
        })
    }
}

/// One layer of a color glyph: an outline glyph and its palette color.
/// `color` is `None` for layers drawn in the text color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorLayer {
    pub glyph: u32,
    pub color: Option<Color>,
}

impl ColorLayer {
    /// A plain glyph drawn in the text color.
    pub fn plain(glyph: u32) -> Self {
        Self { glyph, color: None }
    }
}

#[derive(Debug, Clone, Copy)]
struct ColrHeader {
    num_base: usize,
    base_offset: usize,
    layer_offset: usize,
    num_layers: usize,
}

/// Layered color glyphs of a face, drawn with its first palette
#[derive(Debug, Clone)]
pub struct ColorGlyphs<'a> {
    colr: &'a [u8],
    header: ColrHeader,
    palette: Vec<Color>,
}

impl<'a> ColorGlyphs<'a> {
    pub fn from_face(face: &ttf_parser::Face<'a>) -> Option<Self> {
        let raw = face.raw_face();
        let colr = raw.table(Tag::from_bytes(b"COLR"))?;
        let cpal = raw.table(Tag::from_bytes(b"CPAL"))?;
        Self::parse(colr, cpal)
    }

    /// `None` unless both tables parse and the palette has colors.
    pub fn parse(colr: &'a [u8], cpal: &[u8]) -> Option<Self> {
        let header = parse_colr_header(colr)?;
        let palette = parse_palette(cpal, 0)?;
        if palette.is_empty() {
            return None;
        }
        Some(Self {
            colr,
            header,
            palette,
        })
    }

    /// The layers of `glyph`, bottom first; `None` for glyphs without
    /// color layers.
    pub fn layers(&self, glyph: u32) -> Option<Vec<ColorLayer>> {
        let glyph = u16::try_from(glyph).ok()?;
        let (first, count) = self.base_record(glyph)?;
        if count == 0 || first.checked_add(count)? > self.header.num_layers {
            return None;
        }
        (first..first + count)
            .map(|index| {
                let offset = self.header.layer_offset.checked_add(index * 4)?;
                let layer = read_u16(self.colr, offset)?;
                let palette_index = read_u16(self.colr, offset + 2)?;
                let color = match palette_index {
                    FOREGROUND_INDEX => None,
                    index => self.palette.get(usize::from(index)).copied(),
                };
                Some(ColorLayer {
                    glyph: u32::from(layer),
                    color,
                })
            })
            .collect()
    }

    fn base_record(&self, glyph: u16) -> Option<(usize, usize)> {
        (0..self.header.num_base).find_map(|i| {
            let offset = self.header.base_offset.checked_add(i * 6)?;
            if read_u16(self.colr, offset)? != glyph {
                return None;
            }
            Some((
                usize::from(read_u16(self.colr, offset + 2)?),
                usize::from(read_u16(self.colr, offset + 4)?),
            ))
        })
    }
}

/// Layers to draw for `glyph`: its color layers, or the glyph itself.
pub fn layers_of(colors: Option<&ColorGlyphs<'_>>, glyph: u32) -> Vec<ColorLayer> {
    colors
        .and_then(|c| c.layers(glyph))
        .unwrap_or_else(|| vec![ColorLayer::plain(glyph)])
}

fn parse_colr_header(data: &[u8]) -> Option<ColrHeader> {
    // Version 1 tables keep the version 0 records in front.
    let version = read_u16(data, 0)?;
    if version > 1 {
        return None;
    }
    Some(ColrHeader {
        num_base: usize::from(read_u16(data, 2)?),
        base_offset: read_u32(data, 4)? as usize,
        layer_offset: read_u32(data, 8)? as usize,
        num_layers: usize::from(read_u16(data, 12)?),
    })
}

/// Colors of palette `index` in a CPAL table.
pub fn parse_palette(data: &[u8], index: u16) -> Option<Vec<Color>> {
    let num_entries = usize::from(read_u16(data, 2)?);
    let num_palettes = read_u16(data, 4)?;
    let num_records = usize::from(read_u16(data, 6)?);
    let records_offset = read_u32(data, 8)? as usize;
    if index >= num_palettes {
        return None;
    }
    let first = usize::from(read_u16(data, 12 + usize::from(index) * 2)?);
    if first + num_entries > num_records {
        return None;
    }
    (first..first + num_entries)
        .map(|record| {
            // Records are stored BGRA.
            let bytes = data.get(records_offset + record * 4..records_offset + record * 4 + 4)?;
            Some(Color {
                red: bytes[2],
                green: bytes[1],
                blue: bytes[0],
                alpha: bytes[3],
            })
        })
        .collect()
}

pub(crate) fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let bytes = data.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([bytes[0], bytes[1]]))
}

pub(crate) fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let bytes = data.get(offset..offset + 4)?;
    Some(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use test_case::test_case;

    /// COLR v0 with glyph 5 made of layers 10 (palette 1) and 11 (text color).
    pub(crate) fn colr_table() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0u16.to_be_bytes()); // version
        t.extend(1u16.to_be_bytes()); // base glyph records
        t.extend(14u32.to_be_bytes()); // base records offset
        t.extend(20u32.to_be_bytes()); // layer records offset
        t.extend(2u16.to_be_bytes()); // layer records
        t.extend([0, 5, 0, 0, 0, 2]);
        t.extend([0, 10, 0, 1]);
        t.extend([0, 11, 0xFF, 0xFF]);
        t
    }

    /// CPAL with one palette of blue and half-transparent red.
    pub(crate) fn cpal_table() -> Vec<u8> {
        let mut t = Vec::new();
        t.extend(0u16.to_be_bytes()); // version
        t.extend(2u16.to_be_bytes()); // entries per palette
        t.extend(1u16.to_be_bytes()); // palettes
        t.extend(2u16.to_be_bytes()); // color records
        t.extend(14u32.to_be_bytes()); // records offset
        t.extend(0u16.to_be_bytes()); // first record of palette 0
        t.extend([0xFF, 0, 0, 0xFF]);
        t.extend([0, 0, 0xFF, 0x80]);
        t
    }

    #[test_case("ff0000", Color { red: 255, green: 0, blue: 0, alpha: 255 } ; "rgb")]
    #[test_case("#00ff0080", Color { red: 0, green: 255, blue: 0, alpha: 128 } ; "rgba with hash")]
    fn test_parse_color(text: &str, expected: Color) {
        assert_eq!(text.parse::<Color>().unwrap(), expected);
    }

    #[test_case("fff" ; "short")]
    #[test_case("gg0000" ; "not hex")]
    fn test_parse_color_rejects(text: &str) {
        assert!(matches!(text.parse::<Color>(), Err(FontError::InvalidColor(_))));
    }

    #[test]
    fn test_palette() {
        let palette = parse_palette(&cpal_table(), 0).unwrap();
        assert_eq!(
            palette,
            vec![
                Color { red: 0, green: 0, blue: 255, alpha: 255 },
                Color { red: 255, green: 0, blue: 0, alpha: 128 },
            ]
        );
        assert_eq!(parse_palette(&cpal_table(), 1), None);
    }

    #[test]
    fn test_color_layers() {
        let colr = colr_table();
        let cpal = cpal_table();
        let colors = ColorGlyphs::parse(&colr, &cpal).unwrap();
        assert_eq!(
            colors.layers(5),
            Some(vec![
                ColorLayer {
                    glyph: 10,
                    color: Some(Color { red: 255, green: 0, blue: 0, alpha: 128 }),
                },
                ColorLayer::plain(11),
            ])
        );
        assert_eq!(colors.layers(6), None);
        assert_eq!(layers_of(Some(&colors), 6), vec![ColorLayer::plain(6)]);
        assert_eq!(layers_of(None, 5), vec![ColorLayer::plain(5)]);
    }

    #[test]
    fn test_fill_attributes() {
        let opaque = Color { red: 1, green: 2, blue: 3, alpha: 255 };
        assert_eq!(opaque.fill(), "fill=\"rgb(1,2,3)\"");
        let faded = Color { alpha: 128, ..opaque };
        assert_eq!(faded.fill(), "fill=\"rgb(1,2,3)\" fill-opacity=\"0.502\"");
    }
}
