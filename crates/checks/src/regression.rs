//! Exact-match shaping regression check

use tracing::debug;

use shapecheck_common::{
    diff, Configuration, Encoding, GlyphRun, Parameters, ShapingParameters, TestCase, TestDocument,
};

use crate::item::ReportItem;
use crate::message::CheckResult;
use crate::runner::{CheckContext, ShapingCheck};

/// A case whose output differed from its expectation
#[derive(Debug, Clone)]
pub struct Mismatch {
    pub case: TestCase,
    pub parameters: ShapingParameters,
    pub expectation: String,
    pub run: GlyphRun,
    pub actual: String,
}

/// Compares shaping output against stored expectations
#[derive(Debug, Default)]
pub struct RegressionCheck;

impl ShapingCheck for RegressionCheck {
    type Prepared = ();
    type Failure = Mismatch;

    fn name(&self) -> &'static str {
        "shaping-regression"
    }

    fn title(&self) -> &'static str {
        "Check that texts shape as per expectation"
    }

    fn applies(&self, case: &TestCase, _configuration: &Configuration) -> bool {
        case.expectation.is_some()
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
        failures: &mut Vec<Mismatch>,
    ) -> shapecheck_common::Result<()> {
        let (Some(input), Some(expectation)) = (case.input.as_deref(), &case.expectation) else {
            return Ok(());
        };
        let parameters = ShapingParameters::resolve(case, &document.configuration);
        let run = ctx.shape(input, &parameters)?;

        let expectation = expectation.for_font(ctx.font_name()).to_string();
        let actual = run.serialize(&*ctx.shaper, Encoding::for_expectation(&expectation));
        if actual != expectation {
            debug!("{}: '{}' gave {} not {}", document.name, input, actual, expectation);
            failures.push(Mismatch {
                case: case.clone(),
                parameters,
                expectation,
                run,
                actual,
            });
        }
        Ok(())
    }

    fn report(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        failures: Vec<Mismatch>,
    ) -> CheckResult {
        let items = failures
            .into_iter()
            .map(|mismatch| mismatch_item(ctx, mismatch))
            .collect();
        CheckResult::fail(
            self.name(),
            format!("{}: Expected and actual shaping not matching", document.name),
        )
        .with_items(items)
    }
}

fn mismatch_item(ctx: &mut CheckContext<'_>, mismatch: Mismatch) -> ReportItem {
    let Mismatch {
        case,
        parameters,
        expectation,
        run,
        actual,
    } = mismatch;

    let mut heading = format!(
        "Shaping did not match: {}",
        case.input.as_deref().unwrap_or_default()
    );
    if let Some(note) = &case.note {
        heading.push_str(&format!(" ({})", note));
    }

    // Expectations with clusters are redrawn and compared in full; an
    // expectation that names glyphs the font lacks gets a note instead.
    let mut unreadable = None;
    let (expected_run, streams) = if expectation.contains('=') {
        match GlyphRun::parse(&expectation, &*ctx.shaper) {
            Ok(expected_run) => {
                let streams = (
                    expected_run.serialize(&*ctx.shaper, Encoding::Full),
                    run.serialize(&*ctx.shaper, Encoding::Full),
                );
                (Some(expected_run), Some(streams))
            }
            Err(e) => {
                debug!("Cannot redraw expectation: {}", e);
                unreadable = Some(format!("Expectation could not be drawn: {}", e));
                (None, None)
            }
        }
    } else {
        (None, Some((expectation, actual)))
    };

    let mut item = ReportItem::new()
        .heading(heading)
        .parameters(case_parameters(&case.overrides));
    if let Some((expected, actual)) = streams.filter(|(e, a)| !e.is_empty() && !a.is_empty()) {
        item = item.diff(diff(&expected, &actual));
    }
    if let Some(text) = unreadable {
        item = item.note(text);
    }
    item = item.image("Got", ctx.draw(&run, &parameters));
    if let Some(expected_run) = expected_run {
        item = item.image("Expected", ctx.draw(&expected_run, &parameters));
    }
    item
}

/// The shaping parameters set directly on a case.
fn case_parameters(overrides: &Parameters) -> Parameters {
    Parameters {
        script: overrides.script.clone(),
        language: overrides.language.clone(),
        direction: overrides.direction,
        features: overrides.features.clone(),
        variations: overrides.variations.clone(),
        ..Default::default()
    }
}
