//! Diffing of serialized glyph streams
//!
//! Streams are split into fields (glyph name, `=cluster`, `@x,y` and
//! `+advance`) and aligned with `similar`. A `|` separator is carried by the
//! glyph name that follows it, so separators alone never line up two
//! unrelated glyphs.

use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffOp, DiffTag};

/// Split a serialized glyph stream into alignment tokens.
pub fn tokenize(stream: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    for (idx, ch) in stream.char_indices() {
        if matches!(ch, '|' | '=' | '@' | '+') {
            if idx > start && !stream[start..idx].chars().all(|c| c == '|') {
                tokens.push(&stream[start..idx]);
                start = idx;
            }
        }
    }
    if start < stream.len() {
        tokens.push(&stream[start..]);
    }
    tokens
}

/// Alignment between an expected and an actual glyph stream
#[derive(Debug, Clone)]
pub struct GlyphDiff<'a> {
    expected: Vec<&'a str>,
    actual: Vec<&'a str>,
    ops: Vec<DiffOp>,
}

impl<'a> GlyphDiff<'a> {
    pub fn compute(expected: &'a str, actual: &'a str) -> Self {
        let expected_tokens = tokenize(expected);
        let actual_tokens = tokenize(actual);
        let ops = similar::capture_diff_slices(Algorithm::Patience, &expected_tokens, &actual_tokens);
        Self {
            expected: expected_tokens,
            actual: actual_tokens,
            ops,
        }
    }

    /// Edits over the token sequences (old = expected, new = actual).
    pub fn ops(&self) -> &[DiffOp] {
        &self.ops
    }

    pub fn is_identical(&self) -> bool {
        self.ops.iter().all(|op| op.tag() == DiffTag::Equal)
    }

    pub fn markup(&self) -> DiffMarkup {
        let mut expected = String::new();
        let mut actual = String::new();

        for op in &self.ops {
            let old = escape_html(&self.expected[op.old_range()].concat());
            let new = escape_html(&self.actual[op.new_range()].concat());
            match op.tag() {
                DiffTag::Equal => {
                    expected.push_str(&old);
                    actual.push_str(&new);
                }
                DiffTag::Delete => {
                    expected.push_str(&format!("<del>{}</del>", old));
                }
                DiffTag::Insert => {
                    actual.push_str(&format!("<ins>{}</ins>", new));
                }
                DiffTag::Replace => {
                    expected.push_str(&format!("<del>{}</del>", old));
                    actual.push_str(&format!("<ins>{}</ins>", new));
                }
            }
        }

        DiffMarkup { expected, actual }
    }
}

/// Expected and actual streams with removals and additions marked up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffMarkup {
    pub expected: String,
    pub actual: String,
}

impl DiffMarkup {
    pub fn to_html(&self) -> String {
        format!(
            "<pre><span class='expected'>{}</span>\n<span class='actual'>{}</span></pre>",
            self.expected, self.actual
        )
    }
}

/// Diff two serialized glyph streams and mark them up.
pub fn diff(expected: &str, actual: &str) -> DiffMarkup {
    GlyphDiff::compute(expected, actual).markup()
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
