// Template Rendering Engine
// Implements: typed-AST template parsing/substitution, markdown→HTML
// conversion with the fixed report envelope, and the paginated-artifact
// collaborator seam for PDF output.

pub mod html;
pub mod pdf;
pub mod template;
pub mod templates;

use serde::{Deserialize, Serialize};

// Re-export the public API consumed by the pipeline.
pub use pdf::{PageRenderer, PaginatedArtifact};
pub use template::{render_str, Escape};
pub use templates::TemplateKind;

/// Output format of a generated report artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    Markdown,
    Html,
    Pdf,
    Json,
}

impl OutputFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "markdown",
            OutputFormat::Html => "html",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Json => "json",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputFormat::Markdown => "text/markdown",
            OutputFormat::Html => "text/html",
            OutputFormat::Pdf => "application/pdf",
            OutputFormat::Json => "application/json",
        }
    }
}
