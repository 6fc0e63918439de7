//! Generic shaping test runner
//!
//! A [`ShapingCheck`] gives meaning to a run: which cases it looks at, what
//! it prepares once per document, what it does per case and how it reports
//! the failures it collected. [`CheckRun`] walks the test directory and
//! yields [`CheckResult`]s lazily, one document at a time.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use shapecheck_common::{
    CaseInput, Configuration, GlyphRun, PatternExpander, Shaper, ShapingParameters, TestCase,
    TestDocument,
};

use crate::message::CheckResult;

/// Collaborators available to a check while it runs
pub struct CheckContext<'a> {
    pub shaper: &'a mut dyn Shaper,
    pub expander: &'a dyn PatternExpander,
}

impl<'a> CheckContext<'a> {
    pub fn new(shaper: &'a mut dyn Shaper, expander: &'a dyn PatternExpander) -> Self {
        Self { shaper, expander }
    }

    pub fn font_name(&self) -> &str {
        self.shaper.font_name()
    }

    /// Literal strings to shape for a case: the input itself, or the
    /// expansion of its recipe.
    pub fn expand_inputs(
        &self,
        case: &TestCase,
        configuration: &Configuration,
    ) -> shapecheck_common::Result<Vec<String>> {
        match case.case_input(configuration) {
            Some(CaseInput::Literal(text)) => Ok(vec![text.to_string()]),
            Some(CaseInput::Recipe(recipe)) => {
                let strings = self.expander.expand(recipe, &configuration.ingredients)?;
                debug!("Recipe '{}' expanded to {} strings", recipe, strings.len());
                Ok(strings)
            }
            None => Ok(Vec::new()),
        }
    }

    pub fn shape(
        &mut self,
        text: &str,
        parameters: &ShapingParameters,
    ) -> shapecheck_common::Result<GlyphRun> {
        self.shaper.shape(text, parameters)
    }

    pub fn draw(&mut self, run: &GlyphRun, parameters: &ShapingParameters) -> Option<String> {
        self.shaper.render_svg(run, parameters)
    }
}

/// One kind of shaping test
pub trait ShapingCheck {
    /// Per-document state built before the first applicable case
    type Prepared;
    /// What the executor records for a failing case
    type Failure;

    /// Stable code of the aggregated failure, e.g. `shaping-regression`.
    fn name(&self) -> &'static str;

    /// Human title used as the report section heading.
    fn title(&self) -> &'static str;

    /// Whether this check looks at `case` at all.
    fn applies(&self, case: &TestCase, configuration: &Configuration) -> bool;

    fn prepare(
        &self,
        ctx: &CheckContext<'_>,
        document: &TestDocument,
    ) -> shapecheck_common::Result<Self::Prepared>;

    /// Run one case, pushing to `failures` on a mismatch. An error aborts the
    /// rest of the document.
    fn execute(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        case: &TestCase,
        prepared: &Self::Prepared,
        failures: &mut Vec<Self::Failure>,
    ) -> shapecheck_common::Result<()>;

    /// Summarize a non-empty list of failures as one result.
    fn report(
        &self,
        ctx: &mut CheckContext<'_>,
        document: &TestDocument,
        failures: Vec<Self::Failure>,
    ) -> CheckResult;
}

enum RunState {
    Start(Option<PathBuf>),
    Documents(walkdir::IntoIter),
    Finished,
}

/// Lazy stream of the results of one check over a test directory
pub struct CheckRun<'a, C: ShapingCheck> {
    check: &'a C,
    ctx: CheckContext<'a>,
    state: RunState,
    pending: VecDeque<CheckResult>,
    found_document: bool,
    ran_a_test: bool,
}

impl<'a, C: ShapingCheck> CheckRun<'a, C> {
    pub fn new(check: &'a C, ctx: CheckContext<'a>, test_directory: Option<&Path>) -> Self {
        Self {
            check,
            ctx,
            state: RunState::Start(test_directory.map(Path::to_path_buf)),
            pending: VecDeque::new(),
            found_document: false,
            ran_a_test: false,
        }
    }

    fn open(&mut self, directory: Option<PathBuf>) -> RunState {
        let Some(directory) = directory else {
            self.pending.push_back(CheckResult::fail(
                "no-dir",
                "Shaping test directory not defined in configuration file",
            ));
            return RunState::Finished;
        };
        if !directory.is_dir() {
            self.pending.push_back(CheckResult::fail(
                "not-dir",
                format!(
                    "Shaping test directory {} not found or not a directory.",
                    directory.display()
                ),
            ));
            return RunState::Finished;
        }

        info!("{}: reading tests from {}", self.check.name(), directory.display());
        let entries = walkdir::WalkDir::new(directory)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter();
        RunState::Documents(entries)
    }

    fn finish(&mut self) {
        if !self.found_document {
            self.pending
                .push_back(CheckResult::skip("skip", "No test files found."));
        }
        if !self.ran_a_test {
            self.pending
                .push_back(CheckResult::skip("skip", "No applicable tests ran."));
        }
    }

    fn run_document(&mut self, path: &Path) {
        let document = match TestDocument::load(path) {
            Ok(document) => document,
            Err(e) => {
                let file = file_label(path);
                warn!("{}: {}", file, e);
                let header = match e.code() {
                    "missing-cases" => {
                        format!("{}: JSON file must have a non-empty 'tests' list.", file)
                    }
                    _ => format!("{}: Invalid JSON: {}.", file, e),
                };
                self.pending.push_back(CheckResult::fail(e.code(), header));
                return;
            }
        };

        match self.run_cases(&document) {
            Ok((0, _)) => debug!("{}: no applicable cases", document.name),
            Ok((ran, failures)) if failures.is_empty() => {
                info!("✓ {} ({} cases)", document.name, ran);
                self.pending.push_back(CheckResult::pass(
                    "pass",
                    format!("{}: No regression detected", document.name),
                ));
            }
            Ok((_, failures)) => {
                error!("✗ {} ({} failures)", document.name, failures.len());
                let result = self.check.report(&mut self.ctx, &document, failures);
                self.pending.push_back(result);
            }
            Err(result) => {
                error!("✗ {} - {}", document.name, result.header);
                self.pending.push_back(result);
            }
        }
    }

    /// Run the applicable cases of a document, returning how many ran and
    /// what failed, or the structural error that stopped the document.
    fn run_cases(
        &mut self,
        document: &TestDocument,
    ) -> Result<(usize, Vec<C::Failure>), CheckResult> {
        let configuration = &document.configuration;
        let mut prepared = None;
        let mut failures = Vec::new();
        let mut ran = 0;

        for case in &document.cases {
            if !self.check.applies(case, configuration) {
                continue;
            }
            if case.input.is_none() {
                return Err(CheckResult::fail(
                    "missing-input",
                    format!("{}: test is missing an input key.", document.name),
                ));
            }
            if !case.runs_on(self.ctx.font_name()) {
                continue;
            }

            let state = match prepared.take() {
                Some(state) => state,
                None => self
                    .check
                    .prepare(&self.ctx, document)
                    .map_err(|e| structural(document, &e))?,
            };
            self.ran_a_test = true;
            ran += 1;
            let outcome = self
                .check
                .execute(&mut self.ctx, document, case, &state, &mut failures);
            prepared = Some(state);
            outcome.map_err(|e| structural(document, &e))?;
        }

        Ok((ran, failures))
    }
}

impl<C: ShapingCheck> Iterator for CheckRun<'_, C> {
    type Item = CheckResult;

    fn next(&mut self) -> Option<CheckResult> {
        loop {
            if let Some(result) = self.pending.pop_front() {
                return Some(result);
            }
            match std::mem::replace(&mut self.state, RunState::Finished) {
                RunState::Start(directory) => {
                    self.state = self.open(directory);
                }
                RunState::Documents(mut entries) => match next_document(&mut entries) {
                    Some(path) => {
                        self.found_document = true;
                        self.run_document(&path);
                        self.state = RunState::Documents(entries);
                    }
                    None => self.finish(),
                },
                RunState::Finished => return None,
            }
        }
    }
}

/// Next `.json` file in the directory listing.
fn next_document(entries: &mut walkdir::IntoIter) -> Option<PathBuf> {
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            return Some(path.to_path_buf());
        }
    }
    None
}

fn structural(document: &TestDocument, e: &shapecheck_common::Error) -> CheckResult {
    CheckResult::fail(e.code(), format!("{}: {}", document.name, e))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
