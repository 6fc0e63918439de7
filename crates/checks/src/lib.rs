//! Shapecheck check harness
//!
//! Runs the shaping checks over a directory of JSON test documents:
//!
//! - regression: shaping output must match the stored expectation
//! - forbidden: shaping must not produce glyphs listed in `forbidden_glyphs`
//! - collides: shaped glyphs must not collide
//!
//! Results are gathered into a [`Report`] which renders to HTML or JSON.

pub mod collides;
pub mod error;
pub mod forbidden;
pub mod html;
pub mod item;
pub mod message;
pub mod regression;
pub mod report;
pub mod runner;
pub mod suite;
pub mod update;

use std::path::Path;
use tracing::info;

use shapecheck_common::{DetectorFactory, PatternExpander, RecipeExpander, Shaper};

pub use collides::CollisionCheck;
pub use error::{CheckError, Result};
pub use forbidden::ForbiddenGlyphCheck;
pub use html::{render_html, svg_to_img};
pub use item::{Fragment, ReportItem};
pub use message::{CheckResult, Status};
pub use regression::RegressionCheck;
pub use report::{FontInfo, Report, Section, Summary, DEFAULT_TITLE};
pub use runner::{CheckContext, CheckRun, ShapingCheck};
pub use suite::SuiteConfig;
pub use update::{ShapingInput, ShapingInputFile};

/// The three shaping checks, run in order against one font
pub struct Harness {
    expander: Box<dyn PatternExpander>,
    regression: RegressionCheck,
    forbidden: ForbiddenGlyphCheck,
    collides: CollisionCheck,
}

impl Harness {
    /// `detectors` builds the collision detector for each document.
    pub fn new(detectors: impl DetectorFactory + 'static) -> Self {
        Self {
            expander: Box::new(RecipeExpander::default()),
            regression: RegressionCheck,
            forbidden: ForbiddenGlyphCheck,
            collides: CollisionCheck::new(detectors),
        }
    }

    pub fn with_expander(mut self, expander: impl PatternExpander + 'static) -> Self {
        self.expander = Box::new(expander);
        self
    }

    pub fn run(&self, shaper: &mut dyn Shaper, test_directory: Option<&Path>) -> Report {
        let font = FontInfo {
            name: shaper.font_name().to_string(),
            sha256: None,
        };
        let mut report = Report::new(DEFAULT_TITLE, font);
        self.run_into(shaper, test_directory, &mut report);
        report
    }

    /// Run every check, appending results to `report`.
    pub fn run_into(&self, shaper: &mut dyn Shaper, test_directory: Option<&Path>, report: &mut Report) {
        let expander = self.expander.as_ref();
        run_check(&self.regression, &mut *shaper, expander, test_directory, report);
        run_check(&self.forbidden, &mut *shaper, expander, test_directory, report);
        run_check(&self.collides, &mut *shaper, expander, test_directory, report);
    }
}

fn run_check<C: ShapingCheck>(
    check: &C,
    shaper: &mut dyn Shaper,
    expander: &dyn PatternExpander,
    test_directory: Option<&Path>,
    report: &mut Report,
) {
    info!("Running {}", check.name());
    report.section(check.name(), check.title());
    let ctx = CheckContext::new(shaper, expander);
    for result in CheckRun::new(check, ctx, test_directory) {
        report.record(check.name(), check.title(), result);
    }
    if let Some(section) = report.checks.get(check.name()) {
        info!(
            "{}: {} passed, {} failed, {} skipped",
            check.name(),
            section.count(Status::Pass),
            section.count(Status::Fail),
            section.count(Status::Skip)
        );
    }
}
