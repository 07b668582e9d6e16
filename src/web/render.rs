//! Server-side HTML views.
//!
//! Rendering is a pure projection of a [`SessionState`]; nothing here mutates
//! the session. All user- and model-provided text is escaped.

use std::fmt::Write;

use crate::analysis::{ComparisonRecord, MAX_PAPERS, MIN_PAPERS, PaperRecord, PaperStatus};
use crate::session::{Notice, NoticeLevel, Page, SessionState, SessionStore, StagedFile};

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; display: flex; color: #1f2933; }
nav { width: 14rem; min-height: 100vh; background: #f3f4f6; padding: 1.5rem 1rem; }
nav a { display: block; padding: .5rem .75rem; border-radius: .375rem; color: inherit; text-decoration: none; }
nav a.active { background: #dbeafe; font-weight: 600; }
main { flex: 1; padding: 1.5rem 2rem; max-width: 60rem; }
.notice { padding: .75rem 1rem; border-radius: .375rem; margin-bottom: .75rem; }
.notice.info { background: #e0f2fe; }
.notice.success { background: #dcfce7; }
.notice.warning { background: #fef9c3; }
.notice.error { background: #fee2e2; }
.metrics { display: flex; gap: 2rem; margin-bottom: 1.5rem; }
.metric strong { display: block; font-size: 1.75rem; }
.paper { border: 1px solid #e5e7eb; border-radius: .5rem; padding: 1rem; margin-bottom: 1rem; }
.badge { font-size: .75rem; padding: .125rem .5rem; border-radius: 999px; background: #dcfce7; }
.badge.processing { background: #fef9c3; }
.failed { color: #b91c1c; }
"#;

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Render the session's current page, including pending notices.
pub fn render_page(state: &SessionState) -> String {
    let page = state.view.page;
    let body = match page {
        Page::Library => library_view(&state.store),
        Page::Upload => upload_view(&state.view.staged),
        Page::Compare => compare_view(&state.store, &state.view.selection),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Research Paper Analyzer - {label}</title>
<style>{STYLE}</style>
</head>
<body>
{nav}
<main>
{notices}
{body}
</main>
</body>
</html>"#,
        label = page.label(),
        nav = nav(page),
        notices = notices(&state.view.notices),
    )
}

fn nav(current: Page) -> String {
    let mut html = String::from("<nav>\n<h2>Paper Analyzer</h2>\n");
    for page in Page::ALL {
        let class = if page == current { " class=\"active\"" } else { "" };
        let _ = writeln!(
            html,
            r#"<a href="{}"{}>{}</a>"#,
            page.path(),
            class,
            page.label()
        );
    }
    html.push_str("</nav>");
    html
}

fn notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|n| {
            let class = match n.level {
                NoticeLevel::Info => "info",
                NoticeLevel::Success => "success",
                NoticeLevel::Warning => "warning",
                NoticeLevel::Error => "error",
            };
            format!(
                r#"<div class="notice {class}">{}</div>"#,
                html_escape(&n.message)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn library_view(store: &SessionStore) -> String {
    let papers = store.papers();
    if papers.is_empty() {
        return r#"<h1>Research Paper Library</h1>
<div class="notice info">No papers yet. Upload a PDF to get started.</div>"#
            .to_string();
    }

    let analyzed = papers
        .iter()
        .filter(|p| p.analysis.status == PaperStatus::Completed)
        .count();

    let mut html = format!(
        r#"<h1>Research Paper Library</h1>
<div class="metrics">
<div class="metric"><strong>{}</strong>Total Papers</div>
<div class="metric"><strong>{}</strong>Analyzed</div>
<div class="metric"><strong>{}</strong>Categories</div>
</div>
"#,
        papers.len(),
        analyzed,
        store.category_count()
    );
    for paper in papers {
        html.push_str(&paper_entry(paper));
    }
    html
}

fn paper_entry(record: &PaperRecord) -> String {
    let paper = &record.analysis;
    let summary_class = if paper.executive_summary.is_failed() {
        " class=\"failed\""
    } else {
        ""
    };
    let findings = if paper.findings.is_failed() {
        format!(
            r#"<p class="failed">{}</p>"#,
            html_escape(&paper.findings.text())
        )
    } else {
        let items: String = paper
            .key_findings
            .iter()
            .map(|f| format!("<li>{}</li>", html_escape(f)))
            .collect();
        format!("<ul>{items}</ul>")
    };

    format!(
        r#"<div class="paper" id="paper-{id}">
<h3>{title}</h3>
<p>{authors} &middot; {year} <span class="badge {status}">{status}</span></p>
<h4>Executive Summary</h4>
<p{summary_class}>{summary}</p>
<h4>Key Findings</h4>
{findings}
</div>
"#,
        id = record.id,
        title = html_escape(&paper.title),
        authors = html_escape(&paper.authors.join(", ")),
        year = paper.year,
        status = paper.status,
        summary = html_escape(&paper.executive_summary.text()),
    )
}

fn upload_view(staged: &[StagedFile]) -> String {
    let mut html = String::from(
        r#"<h1>Upload Research Papers</h1>
<form method="post" action="/upload" enctype="multipart/form-data">
<input type="file" name="files" accept=".pdf,application/pdf" multiple>
<button type="submit">Upload</button>
</form>
"#,
    );

    if !staged.is_empty() {
        html.push_str("<h3>Ready for analysis</h3>\n<ul>\n");
        for file in staged {
            let _ = writeln!(
                html,
                "<li>{} ({} bytes)</li>",
                html_escape(&file.filename),
                file.bytes.len()
            );
        }
        html.push_str(
            r#"</ul>
<form method="post" action="/analyze"><button type="submit">Analyze</button></form>
"#,
        );
    }
    html
}

fn compare_view(store: &SessionStore, selection: &[u64]) -> String {
    let papers = store.papers();
    let mut html = String::from("<h1>Compare Papers</h1>\n");

    if papers.len() < MIN_PAPERS {
        html.push_str(&format!(
            r#"<div class="notice warning">Upload at least {MIN_PAPERS} papers to compare.</div>"#
        ));
        return html;
    }

    html.push_str(&format!(
        r#"<form method="post" action="/compare">
<label for="paper">Select {MIN_PAPERS} to {MAX_PAPERS} papers</label>
<select id="paper" name="paper" multiple size="{}">
"#,
        papers.len().min(8)
    ));
    for paper in papers {
        let selected = if selection.contains(&paper.id) {
            " selected"
        } else {
            ""
        };
        let _ = writeln!(
            html,
            r#"<option value="{}"{}>{}</option>"#,
            paper.id,
            selected,
            html_escape(&paper.analysis.title)
        );
    }
    html.push_str("</select>\n<button type=\"submit\">Compare</button>\n</form>\n");

    if let Some(comparison) = store.comparison() {
        html.push_str(&comparison_view(comparison));
    }
    html
}

fn comparison_view(record: &ComparisonRecord) -> String {
    let analysis = &record.analysis;
    let mut html = String::from("<section id=\"comparison\">\n<h2>Papers Analyzed</h2>\n<ul>\n");
    for contribution in &analysis.unique_contributions {
        let _ = writeln!(
            html,
            "<li><strong>{}</strong>: {}</li>",
            html_escape(&contribution.paper),
            html_escape(&contribution.contribution)
        );
    }
    html.push_str("</ul>\n");

    let _ = writeln!(
        html,
        "<p>Common themes: {}</p>",
        html_escape(&analysis.common_themes.join(", "))
    );

    html.push_str("<h2>Agreements</h2>\n");
    for agreement in &analysis.agreements {
        let _ = writeln!(
            html,
            "<h4>{}</h4>\n{}",
            html_escape(&agreement.title),
            facet_paragraph(agreement.description.is_failed(), &agreement.description.text())
        );
    }

    html.push_str("<h2>Contradictions</h2>\n");
    for contradiction in &analysis.contradictions {
        let _ = writeln!(
            html,
            "<h4>{}</h4>\n{}",
            html_escape(&contradiction.title),
            facet_paragraph(
                contradiction.description.is_failed(),
                &contradiction.description.text()
            )
        );
    }

    html.push_str("<h2>Research Gaps</h2>\n");
    for gap in &analysis.research_gaps {
        let _ = writeln!(
            html,
            "{}\n<p><em>{}</em></p>",
            facet_paragraph(gap.gap.is_failed(), &gap.gap.text()),
            html_escape(&gap.potential_impact)
        );
    }

    html.push_str(
        r#"<form method="post" action="/compare/reset"><button type="submit">New Comparison</button></form>
</section>
"#,
    );
    html
}

fn facet_paragraph(failed: bool, text: &str) -> String {
    if failed {
        format!(r#"<p class="failed">{}</p>"#, html_escape(text))
    } else {
        format!("<p>{}</p>", html_escape(text))
    }
}
