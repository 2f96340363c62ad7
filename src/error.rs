use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by diagram composition and document assembly.
#[derive(Error, Debug)]
pub enum RenderError {
    /// Canvas extent or raster resolution is unusable.
    #[error("invalid diagram: {0}")]
    InvalidDiagram(String),

    /// A color token could not be resolved as a named or hex color.
    #[error("invalid color token '{0}'")]
    InvalidColor(String),

    /// A document with no content blocks was submitted for rendering.
    #[error("document has no content blocks")]
    EmptyDocument,

    /// The output artifact could not be written.
    #[error("failed to write document to {path}: {source}")]
    DocumentBuild {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A spec or style file could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// SVG post-processing (parsing, rasterization) failed.
    #[error("SVG processing failed: {0}")]
    Svg(String),

    /// PDF serialization failed.
    #[error("PDF generation failed: {0}")]
    Pdf(String),

    /// IO error outside the artifact write (spec files, embedded images).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for all rendering operations.
pub type Result<T> = std::result::Result<T, RenderError>;
