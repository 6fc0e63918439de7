//! rustybuzz-backed shaper

use indexmap::IndexMap;
use rustybuzz::ttf_parser::{GlyphId, Tag};
use rustybuzz::{Face, Feature, Language, Script, UnicodeBuffer, Variation};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, warn};

use shapecheck_common::{
    Direction, Error, FeatureSetting, GlyphNames, GlyphRecord, GlyphRun, Result, Shaper,
    ShapingParameters,
};

use crate::color::{read_u16, read_u32};
use crate::error::FontResult;
use crate::font::FontData;
use crate::svg;

/// Shapes text with one font.
pub struct FontShaper<'a> {
    data: &'a FontData,
    name: String,
    face: Face<'a>,
    /// Coordinates of every axis as currently set on the face
    coordinates: Vec<Variation>,
}

impl<'a> FontShaper<'a> {
    pub fn new(data: &'a FontData) -> FontResult<Self> {
        let face = data.face()?;
        let coordinates = default_coordinates(&face);
        Ok(Self {
            data,
            name: data.file_name(),
            face,
            coordinates,
        })
    }

    pub fn face(&self) -> &Face<'a> {
        &self.face
    }

    /// Run `f` on the face set to `variations`; the previous coordinates
    /// are restored afterwards.
    pub fn with_location<T>(
        &mut self,
        variations: Option<&IndexMap<String, f32>>,
        f: impl FnOnce(&Face<'a>) -> T,
    ) -> Result<T> {
        let scope = VariationScope::apply(&mut self.face, &self.coordinates, variations)?;
        Ok(f(scope.face()))
    }

    /// Coordinates of the font's named instances, in `fvar` order.
    pub fn named_instances(&self) -> Vec<IndexMap<String, f32>> {
        self.face
            .raw_face()
            .table(Tag::from_bytes(b"fvar"))
            .and_then(parse_named_instances)
            .unwrap_or_default()
    }

    fn buffer(&self, text: &str, parameters: &ShapingParameters) -> Result<UnicodeBuffer> {
        let mut buffer = UnicodeBuffer::new();
        buffer.push_str(text);
        buffer.guess_segment_properties();

        if let Some(script) = &parameters.script {
            buffer.set_script(parse_script(script)?);
        }
        if let Some(direction) = parameters.direction {
            buffer.set_direction(to_rb_direction(direction));
        }
        if let Some(language) = &parameters.language {
            let language = Language::from_str(language).map_err(|_| Error::InvalidParameter {
                name: "language".to_string(),
                value: language.clone(),
            })?;
            buffer.set_language(language);
        }
        Ok(buffer)
    }
}

impl GlyphNames for FontShaper<'_> {
    fn glyph_name(&self, id: u32) -> String {
        u16::try_from(id)
            .ok()
            .and_then(|gid| self.face.glyph_name(GlyphId(gid)))
            .map(str::to_string)
            .unwrap_or_else(|| format!("gid{}", id))
    }

    fn glyph_id(&self, name: &str) -> Option<u32> {
        if let Some(gid) = self.face.glyph_index_by_name(name) {
            return Some(u32::from(gid.0));
        }
        let id: u16 = name.strip_prefix("gid")?.parse().ok()?;
        (id < self.face.number_of_glyphs()).then_some(u32::from(id))
    }
}

impl Shaper for FontShaper<'_> {
    fn font_name(&self) -> &str {
        &self.name
    }

    fn font_path(&self) -> &Path {
        self.data.path()
    }

    fn shape(&mut self, text: &str, parameters: &ShapingParameters) -> Result<GlyphRun> {
        check_shaper(parameters.shaper.as_deref())?;
        let features = to_rb_features(&parameters.feature_settings()?)?;
        let buffer = self.buffer(text, parameters)?;

        let scope = VariationScope::apply(
            &mut self.face,
            &self.coordinates,
            parameters.variations.as_ref(),
        )?;
        let output = rustybuzz::shape(scope.face(), &features, buffer);
        drop(scope);

        let glyphs = output
            .glyph_infos()
            .iter()
            .zip(output.glyph_positions())
            .map(|(info, pos)| {
                GlyphRecord::new(info.glyph_id, info.cluster)
                    .with_offset(pos.x_offset, pos.y_offset)
                    .with_advance(pos.x_advance, pos.y_advance)
            })
            .collect();
        Ok(GlyphRun::new(glyphs))
    }

    fn render_svg(&mut self, run: &GlyphRun, parameters: &ShapingParameters) -> Option<String> {
        match self.with_location(parameters.variations.as_ref(), |face| svg::draw_run(face, run)) {
            Ok(svg) => Some(svg),
            Err(e) => {
                warn!("Cannot draw run: {}", e);
                None
            }
        }
    }
}

/// Applies variation coordinates to a face for the guard's lifetime.
///
/// The previous coordinates are put back when the guard drops, on every
/// exit path.
pub struct VariationScope<'s, 'a> {
    face: &'s mut Face<'a>,
    restore: Option<&'s [Variation]>,
}

impl<'s, 'a> VariationScope<'s, 'a> {
    pub fn apply(
        face: &'s mut Face<'a>,
        current: &'s [Variation],
        requested: Option<&IndexMap<String, f32>>,
    ) -> Result<Self> {
        let Some(requested) = requested.filter(|v| !v.is_empty()) else {
            return Ok(Self {
                face,
                restore: None,
            });
        };

        let mut variations = Vec::with_capacity(requested.len());
        for (axis, value) in requested {
            let tag = parse_tag(axis).ok_or_else(|| Error::InvalidParameter {
                name: "variations".to_string(),
                value: axis.clone(),
            })?;
            if !current.iter().any(|v| v.tag == tag) {
                warn!("Font has no {} axis", axis);
            }
            variations.push(Variation { tag, value: *value });
        }
        face.set_variations(&variations);
        debug!("Applied variations {:?}", requested);

        Ok(Self {
            face,
            restore: Some(current),
        })
    }

    pub fn face(&self) -> &Face<'a> {
        &*self.face
    }
}

impl Drop for VariationScope<'_, '_> {
    fn drop(&mut self) {
        if let Some(previous) = self.restore {
            self.face.set_variations(previous);
        }
    }
}

/// Every axis of the face at its default value.
pub fn default_coordinates(face: &Face<'_>) -> Vec<Variation> {
    face.variation_axes()
        .into_iter()
        .map(|axis| Variation {
            tag: axis.tag,
            value: axis.def_value,
        })
        .collect()
}

/// Named instance coordinates from an `fvar` table, keyed by axis tag.
pub fn parse_named_instances(fvar: &[u8]) -> Option<Vec<IndexMap<String, f32>>> {
    let axes_offset = usize::from(read_u16(fvar, 4)?);
    let axis_count = usize::from(read_u16(fvar, 8)?);
    let axis_size = usize::from(read_u16(fvar, 10)?);
    let instance_count = usize::from(read_u16(fvar, 12)?);
    let instance_size = usize::from(read_u16(fvar, 14)?);

    let tags = (0..axis_count)
        .map(|i| {
            let offset = axes_offset + i * axis_size;
            let tag = fvar.get(offset..offset + 4)?;
            Some(String::from_utf8_lossy(tag).trim_end().to_string())
        })
        .collect::<Option<Vec<_>>>()?;

    let instances_offset = axes_offset + axis_count * axis_size;
    (0..instance_count)
        .map(|i| {
            // Skip the subfamily name id and flags.
            let coordinates = instances_offset + i * instance_size + 4;
            tags.iter()
                .enumerate()
                .map(|(axis, tag)| {
                    let fixed = read_u32(fvar, coordinates + axis * 4)? as i32;
                    Some((tag.clone(), fixed as f32 / 65536.0))
                })
                .collect()
        })
        .collect()
}

/// A tag from up to four ASCII characters, space padded.
pub fn parse_tag(text: &str) -> Option<Tag> {
    let bytes = text.as_bytes();
    if bytes.is_empty() || bytes.len() > 4 || !text.is_ascii() {
        return None;
    }
    let mut padded = [b' '; 4];
    padded[..bytes.len()].copy_from_slice(bytes);
    Some(Tag::from_bytes(&padded))
}

/// ISO 15924 script code in any case (`arab`, `Arab`, `ARAB`).
pub fn parse_script(code: &str) -> Result<Script> {
    let invalid = || Error::InvalidParameter {
        name: "script".to_string(),
        value: code.to_string(),
    };
    if code.len() != 4 || !code.is_ascii() {
        return Err(invalid());
    }
    let mut normalized = code.to_ascii_lowercase().into_bytes();
    normalized[0] = normalized[0].to_ascii_uppercase();
    let tag = Tag::from_bytes(&[normalized[0], normalized[1], normalized[2], normalized[3]]);
    Script::from_iso15924_tag(tag).ok_or_else(invalid)
}

pub fn to_rb_direction(direction: Direction) -> rustybuzz::Direction {
    match direction {
        Direction::Ltr => rustybuzz::Direction::LeftToRight,
        Direction::Rtl => rustybuzz::Direction::RightToLeft,
        Direction::Ttb => rustybuzz::Direction::TopToBottom,
        Direction::Btt => rustybuzz::Direction::BottomToTop,
    }
}

pub fn to_rb_features(settings: &[FeatureSetting]) -> Result<Vec<Feature>> {
    settings
        .iter()
        .map(|s| {
            let tag = parse_tag(&s.tag).ok_or_else(|| Error::InvalidFeature(s.tag.clone()))?;
            Ok(match s.end {
                Some(end) => Feature::new(tag, s.value, s.start..end),
                None => Feature::new(tag, s.value, s.start..),
            })
        })
        .collect()
}

/// Only the OpenType shaper is available.
fn check_shaper(hint: Option<&str>) -> Result<()> {
    match hint {
        None | Some("ot") => Ok(()),
        Some(other) => Err(Error::Shaping(format!("unsupported shaper '{}'", other))),
    }
}
