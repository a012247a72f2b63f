//! Markdown → HTML conversion plus the fixed report envelope.
//!
//! The converter covers the markdown subset our templates and the narrative
//! generator emit: `#`/`##`/`###` headings, `-` bullet lists, `**bold**`
//! runs, and paragraphs. Text content is escaped before markup is applied,
//! so generated narrative can never smuggle raw HTML into the envelope.

use crate::render::template::html_escape;

/// Converts a markdown document to an HTML body fragment.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut out = String::new();
    let mut in_list = false;
    let mut paragraph: Vec<String> = Vec::new();

    for raw_line in markdown.lines() {
        let line = raw_line.trim_end();

        if line.trim().is_empty() {
            flush_paragraph(&mut paragraph, &mut out);
            close_list(&mut in_list, &mut out);
            continue;
        }

        if let Some(text) = line.strip_prefix("### ") {
            flush_paragraph(&mut paragraph, &mut out);
            close_list(&mut in_list, &mut out);
            out.push_str(&format!("<h3>{}</h3>\n", inline(text)));
        } else if let Some(text) = line.strip_prefix("## ") {
            flush_paragraph(&mut paragraph, &mut out);
            close_list(&mut in_list, &mut out);
            out.push_str(&format!("<h2>{}</h2>\n", inline(text)));
        } else if let Some(text) = line.strip_prefix("# ") {
            flush_paragraph(&mut paragraph, &mut out);
            close_list(&mut in_list, &mut out);
            out.push_str(&format!("<h1>{}</h1>\n", inline(text)));
        } else if let Some(text) = line.trim_start().strip_prefix("- ") {
            flush_paragraph(&mut paragraph, &mut out);
            if !in_list {
                out.push_str("<ul>\n");
                in_list = true;
            }
            out.push_str(&format!("<li>{}</li>\n", inline(text)));
        } else {
            close_list(&mut in_list, &mut out);
            paragraph.push(inline(line));
        }
    }

    flush_paragraph(&mut paragraph, &mut out);
    close_list(&mut in_list, &mut out);
    out
}

/// Wraps an HTML body in the fixed report envelope: title, metadata block,
/// styling, footer.
pub fn wrap_report_html(title: &str, metadata: &[(&str, &str)], body: &str) -> String {
    let mut meta_rows = String::new();
    for (key, value) in metadata {
        meta_rows.push_str(&format!(
            "<div class=\"meta-row\"><span>{}</span><span>{}</span></div>\n",
            html_escape(key),
            html_escape(value)
        ));
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<style>
body {{ font-family: Georgia, serif; max-width: 48em; margin: 2em auto; color: #1a1a1a; }}
h1 {{ border-bottom: 2px solid #1a1a1a; padding-bottom: 0.3em; }}
.metadata {{ background: #f5f5f5; padding: 1em; margin: 1em 0; font-size: 0.9em; }}
.meta-row {{ display: flex; justify-content: space-between; }}
footer {{ margin-top: 3em; font-size: 0.8em; color: #777; border-top: 1px solid #ddd; }}
</style>
</head>
<body>
<header><h1>{title}</h1></header>
<div class="metadata">
{meta_rows}</div>
{body}
<footer>Generated by the report worker.</footer>
</body>
</html>
"#,
        title = html_escape(title),
        meta_rows = meta_rows,
        body = body,
    )
}

fn inline(text: &str) -> String {
    bold(&html_escape(text))
}

/// Replaces paired `**` markers with <strong> tags.
fn bold(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut open = false;
    while let Some(idx) = rest.find("**") {
        out.push_str(&rest[..idx]);
        out.push_str(if open { "</strong>" } else { "<strong>" });
        open = !open;
        rest = &rest[idx + 2..];
    }
    out.push_str(rest);
    if open {
        // Unpaired marker: close the tag rather than emit broken HTML.
        out.push_str("</strong>");
    }
    out
}

fn flush_paragraph(paragraph: &mut Vec<String>, out: &mut String) {
    if !paragraph.is_empty() {
        out.push_str(&format!("<p>{}</p>\n", paragraph.join(" ")));
        paragraph.clear();
    }
}

fn close_list(in_list: &mut bool, out: &mut String) {
    if *in_list {
        out.push_str("</ul>\n");
        *in_list = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_convert() {
        let html = markdown_to_html("# Title\n## Section\n### Sub");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<h2>Section</h2>"));
        assert!(html.contains("<h3>Sub</h3>"));
    }

    #[test]
    fn test_bullets_group_into_one_list() {
        let html = markdown_to_html("- one\n- two\n\ntext");
        assert_eq!(html.matches("<ul>").count(), 1);
        assert!(html.contains("<li>one</li>"));
        assert!(html.contains("<li>two</li>"));
        assert!(html.contains("<p>text</p>"));
    }

    #[test]
    fn test_bold_runs() {
        let html = markdown_to_html("a **bold** word");
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_raw_html_in_markdown_is_escaped() {
        let html = markdown_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_multiline_paragraph_joins() {
        let html = markdown_to_html("first line\nsecond line\n\nnext");
        assert!(html.contains("<p>first line second line</p>"));
        assert!(html.contains("<p>next</p>"));
    }

    #[test]
    fn test_envelope_contains_title_and_metadata() {
        let html = wrap_report_html(
            "Match Report",
            &[("Job", "job-1"), ("Candidate", "resume-1")],
            "<p>body</p>",
        );
        assert!(html.contains("<title>Match Report</title>"));
        assert!(html.contains("job-1"));
        assert!(html.contains("<p>body</p>"));
        assert!(html.contains("<footer>"));
    }

    #[test]
    fn test_envelope_escapes_metadata_values() {
        let html = wrap_report_html("t", &[("k", "<img>")], "");
        assert!(html.contains("&lt;img&gt;"));
    }
}
