//! Glyph collision scanning

use std::collections::HashSet;
use tracing::debug;

use shapecheck_common::{
    resolve, Collision, CollisionDetector, CollisionSettings, Configuration, DetectorFactory,
    Direction, GlyphRun, ShapingParameters, TestCase, TestDocument,
};

use crate::item::ReportItem;
use crate::message::CheckResult;
use crate::runner::{CheckContext, ShapingCheck};

/// A string whose shaping left glyphs colliding
#[derive(Debug, Clone)]
pub struct Bump {
    pub text: String,
    /// `first/second` glyph names, allowed pairs removed
    pub pairs: Vec<String>,
    pub overlay: String,
    pub run: GlyphRun,
    pub parameters: ShapingParameters,
}

/// Flags shaped output whose glyphs collide
pub struct CollisionCheck {
    factory: Box<dyn DetectorFactory>,
}

impl CollisionCheck {
    pub fn new(factory: impl DetectorFactory + 'static) -> Self {
        Self {
            factory: Box::new(factory),
        }
    }
}

impl ShapingCheck for CollisionCheck {
    type Prepared = Box<dyn CollisionDetector>;
    type Failure = Bump;

    fn name(&self) -> &'static str {
        "shaping-collides"
    }

    fn title(&self) -> &'static str {
        "Check that no collisions are found while shaping"
    }

    fn applies(&self, case: &TestCase, configuration: &Configuration) -> bool {
        case.collision.is_some() || configuration.collision.is_some()
    }

    /// Build the detector from the document's settings. A document that only
    /// enables collisions on individual cases gets every rule enabled.
    fn prepare(
        &self,
        ctx: &CheckContext<'_>,
        document: &TestDocument,
    ) -> shapecheck_common::Result<Box<dyn CollisionDetector>> {
        let configuration = &document.configuration;
        let settings = configuration
            .collision
            .clone()
            .unwrap_or_else(CollisionSettings::permissive);
        let direction = configuration.direction.unwrap_or(Direction::Ltr);
        debug!("{}: collision settings {:?}", document.name, settings);
        self.factory.build(&*ctx.shaper, &settings, direction)
    }

    fn execute(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        case: &TestCase,
        detector: &Box<dyn CollisionDetector>,
        failures: &mut Vec<Bump>,
    ) -> shapecheck_common::Result<()> {
        let configuration = &document.configuration;
        let parameters = ShapingParameters::resolve(case, configuration);
        let allowed = resolve(case, configuration, |p| p.allowed_collisions.as_deref())
            .unwrap_or_default();

        for text in ctx.expand_inputs(case, configuration)? {
            let run = ctx.shape(&text, &parameters)?;
            let glyphs = detector.glyphs_for(&text, &run, &parameters)?;
            let collisions = detector.collisions_among(&glyphs);
            let pairs: Vec<String> = collisions
                .iter()
                .map(Collision::pair)
                .filter(|pair| !allowed.contains(pair))
                .collect();
            if pairs.is_empty() {
                continue;
            }
            debug!("{}: '{}' collides: {}", document.name, text, pairs.join(","));
            failures.push(Bump {
                overlay: detector.draw_overlaps(&glyphs, &collisions),
                text,
                pairs,
                run,
                parameters: parameters.clone(),
            });
        }
        Ok(())
    }

    fn report(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        failures: Vec<Bump>,
    ) -> CheckResult {
        let header = format!(
            "{}: {} collisions found while shaping",
            document.name,
            failures.len()
        );
        let mut seen = HashSet::new();
        let mut items = Vec::new();
        for bump in failures {
            if !seen.insert(bump.pairs.clone()) {
                continue;
            }
            let drawing = ctx.draw(&bump.run, &bump.parameters);
            items.push(
                ReportItem::new()
                    .heading(format!(
                        "{} collision found in e.g. {}",
                        bump.pairs.join(","),
                        bump.text
                    ))
                    .overlay(bump.overlay)
                    .image("Got", drawing),
            );
        }
        CheckResult::fail(self.name(), header).with_items(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shapecheck_common::mock::{MockCollider, MockShaper};
    use shapecheck_common::RecipeExpander;

    fn shaper() -> MockShaper {
        MockShaper::new("Test.ttf")
            .with_glyph('A', "A", 500)
            .with_glyph('V', "V", 500)
            .with_glyph('T', "T", 500)
    }

    fn run(doc: &TestDocument, pairs: &[(&str, &str)]) -> CheckResult {
        run_with(doc, |names| MockCollider::new(names, pairs))
    }

    fn run_with(doc: &TestDocument, collider: impl FnOnce(Vec<String>) -> MockCollider) -> CheckResult {
        let mut shaper = shaper();
        let check = CollisionCheck::new(collider(shaper.glyph_table()).factory());
        let expander = RecipeExpander::default();
        let mut ctx = CheckContext::new(&mut shaper, &expander);
        let detector = check.prepare(&ctx, doc).unwrap();
        let mut failures = Vec::new();
        for case in &doc.cases {
            check
                .execute(&mut ctx, doc, case, &detector, &mut failures)
                .unwrap();
        }
        check.report(&mut ctx, doc, failures)
    }

    #[test]
    fn test_allowed_pairs_filtered() {
        let doc = TestDocument::from_json(
            "c.json",
            r#"{"configuration": {"collidoscope": {"bases": true},
                                  "defaults": {"allowedcollisions": ["A/V"]}},
                "tests": [{"input": "AV"}, {"input": "AT"}]}"#,
        )
        .unwrap();
        let result = run(&doc, &[("A", "V"), ("A", "T")]);
        assert_eq!(result.header, "c.json: 1 collisions found while shaping");
        assert_eq!(result.items.len(), 1);
        assert_eq!(
            result.items[0].heading_text(),
            Some("A/T collision found in e.g. AT")
        );
    }

    #[test]
    fn test_reports_deduplicated_by_pairs() {
        let doc = TestDocument::from_json(
            "c.json",
            r#"{"configuration": {"collision": {}},
                "tests": [{"input": "AV"}, {"input": "AVT"}, {"input": "AVV"}, {"input": "VA"}]}"#,
        )
        .unwrap();
        let result = run(&doc, &[("A", "V")]);
        assert_eq!(result.header, "c.json: 3 collisions found while shaping");
        let headings: Vec<&str> = result.items.iter().filter_map(|i| i.heading_text()).collect();
        assert_eq!(
            headings,
            vec![
                "A/V collision found in e.g. AV",
                "A/V,A/V collision found in e.g. AVV"
            ]
        );
    }

    #[test]
    fn test_detector_sees_case_variations() {
        let doc = TestDocument::from_json(
            "c.json",
            r#"{"configuration": {"collision": {}},
                "tests": [{"input": "AV"}, {"input": "VAV", "variations": {"wght": 700}}]}"#,
        )
        .unwrap();
        let result = run_with(&doc, |names| {
            MockCollider::new(names, &[("A", "V")]).inked_at("wght", 700.0)
        });
        assert_eq!(result.header, "c.json: 1 collisions found while shaping");
        assert_eq!(
            result.items[0].heading_text(),
            Some("A/V collision found in e.g. VAV")
        );
    }
}
