//! Paginated artifact production.
//!
//! True layout/rasterization is delegated to an external renderer behind the
//! `PageRenderer` trait. The in-process default represents the artifact as a
//! binary-safe base64 encoding of the HTML and estimates the page count from
//! block-level content, so size/page contracts can be enforced without a
//! layout engine in the worker.

use async_trait::async_trait;
use base64::Engine;

use crate::errors::ReportError;

/// Printable lines per US-letter page at the report's base font size.
const LINES_PER_PAGE: usize = 45;

/// Paginated bytes plus the page count reported by the renderer.
#[derive(Debug, Clone)]
pub struct PaginatedArtifact {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// External collaborator that turns HTML into paginated bytes.
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, html: &str) -> Result<PaginatedArtifact, ReportError>;
}

/// Default renderer: base64 of the HTML as the binary-safe intermediate,
/// page count estimated from block-level elements.
pub struct EncodedHtmlRenderer;

#[async_trait]
impl PageRenderer for EncodedHtmlRenderer {
    async fn render(&self, html: &str) -> Result<PaginatedArtifact, ReportError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .encode(html)
            .into_bytes();
        Ok(PaginatedArtifact {
            bytes,
            page_count: estimate_page_count(html),
        })
    }
}

/// Counts block-level elements as printed lines and divides by the page
/// capacity. Long paragraphs count one line per ~90 characters of text.
pub fn estimate_page_count(html: &str) -> u32 {
    let mut lines = 0usize;
    for tag in ["<p>", "<li>", "<h1>", "<h2>", "<h3>", "<div"] {
        for (idx, _) in html.match_indices(tag) {
            lines += 1;
            if tag == "<p>" {
                // Approximate wrapping of long paragraphs.
                let rest = &html[idx..];
                if let Some(end) = rest.find("</p>") {
                    lines += rest[..end].len() / 90;
                }
            }
        }
    }
    let pages = lines.div_ceil(LINES_PER_PAGE);
    pages.max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_encoded_renderer_round_trips_html() {
        let html = "<p>report body</p>";
        let artifact = EncodedHtmlRenderer.render(html).await.unwrap();
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&artifact.bytes)
            .unwrap();
        assert_eq!(decoded, html.as_bytes());
        assert!(artifact.page_count >= 1);
    }

    #[test]
    fn test_small_document_is_one_page() {
        assert_eq!(estimate_page_count("<p>short</p>"), 1);
    }

    #[test]
    fn test_page_count_grows_with_content() {
        let many = "<li>item</li>".repeat(100);
        assert!(estimate_page_count(&many) >= 2);
    }
}
