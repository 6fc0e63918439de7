//! Forbidden glyph scanning

use tracing::debug;

use shapecheck_common::{
    Configuration, Encoding, GlyphRun, ShapingParameters, TestCase, TestDocument,
};

use crate::item::ReportItem;
use crate::message::CheckResult;
use crate::runner::{CheckContext, ShapingCheck};

/// A string whose shaping produced a forbidden glyph sequence
#[derive(Debug, Clone)]
pub struct ForbiddenHit {
    pub text: String,
    pub pattern: String,
    pub run: GlyphRun,
    pub parameters: ShapingParameters,
}

/// Flags shaped output containing glyphs listed in `forbidden_glyphs`
#[derive(Debug, Default)]
pub struct ForbiddenGlyphCheck;

/// Whether `pattern` occurs in `glyphs` as a run of whole glyph names.
///
/// `a|b` matches glyph `a` directly followed by glyph `b`.
pub fn contains_sequence(glyphs: &[&str], pattern: &str) -> bool {
    let needle: Vec<&str> = pattern.split('|').filter(|t| !t.is_empty()).collect();
    if needle.is_empty() || needle.len() > glyphs.len() {
        return false;
    }
    glyphs.windows(needle.len()).any(|window| window == needle.as_slice())
}

impl ShapingCheck for ForbiddenGlyphCheck {
    type Prepared = ();
    type Failure = ForbiddenHit;

    fn name(&self) -> &'static str {
        "shaping-forbidden"
    }

    fn title(&self) -> &'static str {
        "Check that no forbidden glyphs are found while shaping"
    }

    fn applies(&self, _case: &TestCase, configuration: &Configuration) -> bool {
        configuration.forbidden_glyphs.is_some()
    }

    fn prepare(
        &self,
        _ctx: &CheckContext<'_>,
        _document: &TestDocument,
    ) -> shapecheck_common::Result<()> {
        Ok(())
    }

    fn execute(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        case: &TestCase,
        _prepared: &(),
        failures: &mut Vec<ForbiddenHit>,
    ) -> shapecheck_common::Result<()> {
        let configuration = &document.configuration;
        let forbidden = configuration.forbidden_glyphs.as_deref().unwrap_or_default();
        let parameters = ShapingParameters::resolve(case, configuration);

        for text in ctx.expand_inputs(case, configuration)? {
            let run = ctx.shape(&text, &parameters)?;
            let serialized = run.serialize(&*ctx.shaper, Encoding::GlyphsOnly);
            let glyphs: Vec<&str> = serialized.split('|').collect();
            for pattern in forbidden {
                if contains_sequence(&glyphs, pattern) {
                    debug!("{}: '{}' produced {}", document.name, text, pattern);
                    failures.push(ForbiddenHit {
                        text: text.clone(),
                        pattern: pattern.clone(),
                        run: run.clone(),
                        parameters: parameters.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn report(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        failures: Vec<ForbiddenHit>,
    ) -> CheckResult {
        let items = failures
            .into_iter()
            .map(|hit| {
                let drawing = ctx.draw(&hit.run, &hit.parameters);
                ReportItem::new()
                    .heading(format!("{} produced '{}'", hit.text, hit.pattern))
                    .image("Got", drawing)
            })
            .collect();
        CheckResult::fail(
            self.name(),
            format!("{}: Forbidden glyphs found while shaping", document.name),
        )
        .with_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecheck_common::mock::MockShaper;
    use shapecheck_common::RecipeExpander;
    use test_case::test_case;

    #[test_case(&["a"], "a", true ; "single glyph")]
    #[test_case(&["aacute"], "a", false ; "prefix of a longer name")]
    #[test_case(&["x", "a", "y"], "a|y", true ; "adjacent sequence")]
    #[test_case(&["a", "x", "y"], "a|y", false ; "not adjacent")]
    #[test_case(&["a"], "", false ; "empty pattern")]
    fn test_contains_sequence(glyphs: &[&str], pattern: &str, expected: bool) {
        assert_eq!(contains_sequence(glyphs, pattern), expected);
    }

    #[test]
    fn test_recipe_strings_are_scanned() {
        let doc = TestDocument::from_json(
            "forbidden.json",
            r#"{"configuration": {"forbidden_glyphs": [".notdef"],
                                  "defaults": {"input_type": "pattern"},
                                  "ingredients": {"LETTER": "[ax]"}},
                "tests": [{"input": "LETTER"}]}"#,
        )
        .unwrap();
        let mut shaper = MockShaper::new("Test.ttf").with_glyph('a', "a", 500);
        let expander = RecipeExpander::default();
        let mut ctx = CheckContext::new(&mut shaper, &expander);
        let mut failures = Vec::new();
        ForbiddenGlyphCheck
            .execute(&mut ctx, &doc, &doc.cases[0], &(), &mut failures)
            .unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].text, "x");

        let result = ForbiddenGlyphCheck.report(&mut ctx, &doc, failures);
        assert_eq!(result.header, "forbidden.json: Forbidden glyphs found while shaping");
        assert_eq!(result.items[0].heading_text(), Some("x produced '.notdef'"));
    }
}
