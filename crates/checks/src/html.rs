//! HTML rendering of a report

use base64::{engine::general_purpose::STANDARD, Engine as _};

use shapecheck_common::diff::escape_html;

use crate::item::{Fragment, ReportItem};
use crate::report::Report;

const STYLE: &str = r#"
        body {
            font-family: sans-serif;
            max-width: 720px;
            margin: auto;
            padding-bottom: 3rem;
        }

        h3 {
            display: flex;
            align-items: baseline;
            margin-inline-start: -6em;
        }

        h3 .indicator {
            flex: 0 0 5em;
            text-align: end;
            padding-inline-end: 1em;
        }

        h3 .text {
            flex: 1 0;
            font-weight: normal;
        }

        .provenance {
            color: #666;
            font-size: small;
        }

        .items img {
            height: 100px;
            margin: 10px;
        }

        .items del {
            background-color: rgba(255, 0, 0, 0.6);
            text-decoration: none;
        }

        .items ins {
            background-color: rgba(0, 255, 0, 0.6);
            text-decoration: none;
        }

        .items pre .expected {
            background-color: rgba(255, 0, 0, 0.2);
        }

        .items pre .actual {
            background-color: rgba(0, 255, 0, 0.2);
        }
"#;

/// Wrap an SVG document in an `<img>` tag with a base64 data URI.
///
/// Each drawing defines its glyphs as `g<id>`; separate images keep those
/// ids from clashing between fonts or variation locations.
pub fn svg_to_img(svg: &str) -> String {
    format!(
        "<img src=\"data:image/svg+xml;base64,{}\" alt=\"SVG output\">",
        STANDARD.encode(svg.as_bytes())
    )
}

fn render_fragment(fragment: &Fragment) -> String {
    match fragment {
        Fragment::Heading { text } => format!("<h4>{}</h4>", escape_html(text)),
        Fragment::Parameters { values } => {
            let dump = serde_json::to_string(values).unwrap_or_default();
            format!("<pre>{}</pre>", escape_html(&dump))
        }
        Fragment::Diff { markup } => markup.to_html(),
        Fragment::Image { label, svg } => format!("{}: {}", escape_html(label), svg_to_img(svg)),
        Fragment::Overlay { svg } => format!("<div>{}</div>", svg),
        Fragment::Note { text } => format!("<p>{}</p>", escape_html(text)),
    }
}

pub fn render_item(item: &ReportItem) -> String {
    item.fragments
        .iter()
        .map(render_fragment)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Render the whole report as a standalone HTML page.
pub fn render_html(report: &Report) -> String {
    let title = escape_html(&report.title);
    let mut html = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n    <meta charset=\"utf-8\">\n    <title>{}</title>\n    <style>{}    </style>\n</head>\n<body>\n    <h1>{}</h1>\n",
        title, STYLE, title
    );

    let mut provenance = format!("Font: {}", escape_html(&report.font.name));
    if let Some(sha256) = &report.font.sha256 {
        provenance.push_str(&format!(" (sha256 {})", sha256));
    }
    provenance.push_str(&format!(
        ", generated {}",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    html.push_str(&format!("    <p class='provenance'>{}</p>\n", provenance));

    for section in report.checks.values() {
        html.push_str(&format!("<h2>{}</h2>\n", escape_html(&section.title)));
        for result in &section.results {
            html.push_str(&format!(
                "<h3><span class='indicator'>{}</span> <span class='text'>{}</span></h3>\n",
                result.status.indicator(),
                escape_html(&result.header)
            ));
            if !result.items.is_empty() {
                let items: Vec<String> = result.items.iter().map(render_item).collect();
                html.push_str(&format!(
                    "<div class='items'>\n{}\n</div>\n",
                    items.join("\n")
                ));
            }
        }
    }
    html.push_str("\n</body>\n</html>\n");
    html
}
