//! End-to-end runs of the harness over temporary test directories

use indexmap::IndexMap;
use std::path::Path;

use shapecheck_checks::{render_html, CheckResult, Harness, Report, Status};
use shapecheck_common::mock::{MockCollider, MockShaper};
use shapecheck_common::PatternExpander;
use tempfile::TempDir;

const REGRESSION: &str = "shaping-regression";
const FORBIDDEN: &str = "shaping-forbidden";
const COLLIDES: &str = "shaping-collides";

fn shaper() -> MockShaper {
    MockShaper::new("Test-Regular.ttf")
        .with_glyph('A', "A", 500)
        .with_glyph('V', "V", 500)
        .with_glyph('a', "a", 450)
        .with_glyph('á', "aacute", 450)
        .with_glyph('T', "T", 480)
}

fn test_dir(documents: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in documents {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn run(shaper: &mut MockShaper, dir: Option<&Path>) -> Report {
    let collider = MockCollider::new(shaper.glyph_table(), &[("A", "V")]);
    Harness::new(collider.factory()).run(shaper, dir)
}

fn results<'r>(report: &'r Report, check: &str) -> &'r [CheckResult] {
    &report.checks[check].results
}

fn codes(report: &Report, check: &str) -> Vec<String> {
    results(report, check).iter().map(|r| r.code.clone()).collect()
}

#[test]
fn test_matching_expectation_passes() {
    let dir = test_dir(&[(
        "kerning.json",
        r#"{"tests": [{"input": "AV", "expectation": "A=0+500|V=1+500"}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));

    let regression = results(&report, REGRESSION);
    assert_eq!(regression.len(), 1);
    assert_eq!(regression[0].status, Status::Pass);
    assert_eq!(regression[0].header, "kerning.json: No regression detected");

    // The other checks found the document but had nothing to do.
    for check in [FORBIDDEN, COLLIDES] {
        let skipped = results(&report, check);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].status, Status::Skip);
        assert_eq!(skipped[0].header, "No applicable tests ran.");
    }
    assert!(report.passed());
}

#[test]
fn test_changed_advance_fails_with_diff() {
    let dir = test_dir(&[(
        "kerning.json",
        r#"{"tests": [{"input": "AV", "expectation": "A=0+500|V=1+500"}]}"#,
    )]);
    let mut shaper = shaper().with_advance("V", 520);
    let report = run(&mut shaper, Some(dir.path()));

    let regression = results(&report, REGRESSION);
    assert_eq!(regression.len(), 1);
    let result = &regression[0];
    assert_eq!(result.status, Status::Fail);
    assert_eq!(result.code, REGRESSION);
    assert_eq!(
        result.header,
        "kerning.json: Expected and actual shaping not matching"
    );
    let markup = result.items[0].diff_markup().unwrap();
    assert_eq!(markup.expected, "A=0+500|V=1<del>+500</del>");
    assert_eq!(markup.actual, "A=0+500|V=1<ins>+520</ins>");
    assert!(!report.passed());
}

#[test]
fn test_forbidden_notdef() {
    let dir = test_dir(&[(
        "forbidden.json",
        r#"{"configuration": {"forbidden_glyphs": [".notdef"]},
            "tests": [{"input": "AV"}, {"input": "AxV"}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));

    let forbidden = results(&report, FORBIDDEN);
    assert_eq!(forbidden.len(), 1);
    assert_eq!(forbidden[0].code, FORBIDDEN);
    assert_eq!(
        forbidden[0].header,
        "forbidden.json: Forbidden glyphs found while shaping"
    );
    assert_eq!(forbidden[0].items.len(), 1);
    assert_eq!(
        forbidden[0].items[0].heading_text(),
        Some("AxV produced '.notdef'")
    );
}

#[test]
fn test_forbidden_matches_whole_glyph_names() {
    let dir = test_dir(&[(
        "names.json",
        r#"{"configuration": {"forbidden_glyphs": ["a"]},
            "tests": [{"input": "á"}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));
    assert_eq!(codes(&report, FORBIDDEN), vec!["pass"]);
}

#[test]
fn test_allowed_collisions_are_not_reported() {
    let dir = test_dir(&[(
        "collide.json",
        r#"{"configuration": {"collision": {"bases": true}},
            "tests": [{"input": "AV", "allowed_collisions": ["A/V"]}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));
    assert_eq!(codes(&report, COLLIDES), vec!["pass"]);
}

#[test]
fn test_case_level_collision_settings() {
    let dir = test_dir(&[(
        "collide.json",
        r#"{"tests": [{"input": "TAV", "collision": {}}, {"input": "AV"}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));

    let collides = results(&report, COLLIDES);
    assert_eq!(collides.len(), 1);
    assert_eq!(
        collides[0].header,
        "collide.json: 1 collisions found while shaping"
    );
    assert_eq!(
        collides[0].items[0].heading_text(),
        Some("A/V collision found in e.g. TAV")
    );
}

#[test]
fn test_case_level_collidoscope_key() {
    let dir = test_dir(&[(
        "legacy.json",
        r#"{"tests": [{"input": "AV", "collidoscope": {"bases": true}}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));
    assert_eq!(codes(&report, COLLIDES), vec![COLLIDES]);
}

#[test]
fn test_recipe_inputs_are_expanded() {
    let dir = test_dir(&[(
        "recipe.json",
        r#"{"configuration": {"collision": {},
                              "ingredients": {"FIRST": "[AT]", "SECOND": "[VA]"}},
            "tests": [{"input": "FIRST SECOND", "input_type": "pattern"}]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));

    let collides = results(&report, COLLIDES);
    assert_eq!(collides[0].status, Status::Fail);
    // AV collides, AA TV TA do not.
    assert_eq!(
        collides[0].header,
        "recipe.json: 1 collisions found while shaping"
    );
}

/// Expands every recipe to the same strings.
struct FixedExpander(Vec<String>);

impl PatternExpander for FixedExpander {
    fn expand(
        &self,
        _recipe: &str,
        _ingredients: &IndexMap<String, String>,
    ) -> shapecheck_common::Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

#[test]
fn test_custom_expander() {
    let dir = test_dir(&[(
        "recipe.json",
        r#"{"configuration": {"collision": {}},
            "tests": [{"input": "ANY RECIPE", "input_type": "pattern"}]}"#,
    )]);
    let mut shaper = shaper();
    let collider = MockCollider::new(shaper.glyph_table(), &[("A", "V")]);
    let harness = Harness::new(collider.factory())
        .with_expander(FixedExpander(vec!["TA".to_string(), "VAV".to_string()]));
    let report = harness.run(&mut shaper, Some(dir.path()));

    let collides = results(&report, COLLIDES);
    assert_eq!(collides[0].status, Status::Fail);
    assert_eq!(
        collides[0].header,
        "recipe.json: 1 collisions found while shaping"
    );
}

#[test]
fn test_empty_directory_skips() {
    let dir = test_dir(&[("notes.txt", "not a test document")]);
    let report = run(&mut shaper(), Some(dir.path()));
    for check in [REGRESSION, FORBIDDEN, COLLIDES] {
        let headers: Vec<&str> = results(&report, check)
            .iter()
            .map(|r| r.header.as_str())
            .collect();
        assert_eq!(
            headers,
            vec!["No test files found.", "No applicable tests ran."]
        );
        assert!(results(&report, check)
            .iter()
            .all(|r| r.status == Status::Skip && r.code == "skip"));
    }
    assert!(report.passed());
}

#[test]
fn test_missing_directory_configuration() {
    let report = run(&mut shaper(), None);
    for check in [REGRESSION, FORBIDDEN, COLLIDES] {
        let results = results(&report, check);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].code, "no-dir");
        assert_eq!(
            results[0].header,
            "Shaping test directory not defined in configuration file"
        );
    }
}

#[test]
fn test_directory_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let report = run(&mut shaper(), Some(&missing));
    let regression = results(&report, REGRESSION);
    assert_eq!(regression.len(), 1);
    assert_eq!(regression[0].code, "not-dir");
    assert!(regression[0].header.ends_with("not found or not a directory."));
}

#[test]
fn test_invalid_document_does_not_stop_siblings() {
    let dir = test_dir(&[
        ("a-broken.json", "{\"tests\": ["),
        ("b-empty.json", r#"{"configuration": {}}"#),
        (
            "c-good.json",
            r#"{"tests": [{"input": "AV", "expectation": "A|V"}]}"#,
        ),
    ]);
    let report = run(&mut shaper(), Some(dir.path()));

    assert_eq!(
        codes(&report, REGRESSION),
        vec!["invalid-document", "missing-cases", "pass"]
    );
    let regression = results(&report, REGRESSION);
    assert!(regression[0].header.starts_with("a-broken.json: Invalid JSON: "));
    assert!(regression[1].header.starts_with("b-empty.json: "));
}

#[test]
fn test_missing_input_stops_document() {
    let dir = test_dir(&[
        (
            "a.json",
            r#"{"tests": [{"expectation": "A"}, {"input": "V", "expectation": "A"}]}"#,
        ),
        ("b.json", r#"{"tests": [{"input": "A", "expectation": "A"}]}"#),
    ]);
    let report = run(&mut shaper(), Some(dir.path()));

    assert_eq!(codes(&report, REGRESSION), vec!["missing-input", "pass"]);
    assert_eq!(
        results(&report, REGRESSION)[0].header,
        "a.json: test is missing an input key."
    );
}

#[test]
fn test_shaping_error_is_structural() {
    let dir = test_dir(&[
        (
            "a.json",
            r#"{"tests": [{"input": "AV", "expectation": "A|V"}, {"input": "A", "expectation": "V"}]}"#,
        ),
        ("b.json", r#"{"tests": [{"input": "A", "expectation": "A"}]}"#),
    ]);
    let mut shaper = shaper().fail_on("AV");
    let report = run(&mut shaper, Some(dir.path()));

    let regression = results(&report, REGRESSION);
    assert_eq!(codes(&report, REGRESSION), vec!["shaping-error", "pass"]);
    assert!(regression[0].header.starts_with("a.json: "));
    assert!(regression[0].items.is_empty());
}

#[test]
fn test_detector_failure_is_prepare_failed() {
    let dir = test_dir(&[(
        "collide.json",
        r#"{"configuration": {"collision": {}}, "tests": [{"input": "AV"}]}"#,
    )]);
    let mut shaper = shaper();
    let report = Harness::new(MockCollider::failing("no outlines")).run(&mut shaper, Some(dir.path()));

    let collides = results(&report, COLLIDES);
    assert_eq!(collides.len(), 1);
    assert_eq!(collides[0].code, "prepare-failed");
    assert!(collides[0].header.contains("no outlines"));
}

#[test]
fn test_font_filters() {
    let dir = test_dir(&[(
        "filters.json",
        r#"{"tests": [
            {"input": "A", "expectation": "V", "only": "Other.ttf"},
            {"input": "A", "expectation": "V", "exclude": ["Test-Regular.ttf"]}
        ]}"#,
    )]);
    let report = run(&mut shaper(), Some(dir.path()));
    let headers: Vec<&str> = results(&report, REGRESSION)
        .iter()
        .map(|r| r.header.as_str())
        .collect();
    assert_eq!(headers, vec!["No applicable tests ran."]);
}

#[test]
fn test_html_report() {
    let dir = test_dir(&[(
        "kerning.json",
        r#"{"tests": [{"input": "AV", "expectation": "A=0+500|V=1+500", "note": "kern"}]}"#,
    )]);
    let mut shaper = shaper().with_advance("V", 520).drawing();
    let report = run(&mut shaper, Some(dir.path()));

    let html = render_html(&report);
    assert!(html.contains("<h2>Check that texts shape as per expectation</h2>"));
    assert!(html.contains("<h2>Check that no forbidden glyphs are found while shaping</h2>"));
    assert!(html.contains("<h2>Check that no collisions are found while shaping</h2>"));
    assert!(html.contains("FAIL 🔥"));
    assert!(html.contains("Shaping did not match: AV (kern)"));
    assert!(html.contains("Expected: <img"));
    assert_eq!(report.font.name, "Test-Regular.ttf");
}
