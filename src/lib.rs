//! # draftsman
//!
//! Declarative diagram composition and paginated document assembly.
//!
//! Two independent components cooperate per document:
//!
//! - [`DiagramComposer`] rasterizes a [`DiagramSpec`] (boxes, circles,
//!   connectors and labels with caller-controlled coordinates) into a PNG
//!   [`ImageBuffer`], painter's order, at any resolution.
//! - [`DocumentAssembler`] paginates a [`DocumentSpec`] (headings,
//!   paragraphs, styled tables, code blocks, images, page breaks) into a
//!   single multi-page PDF.
//!
//! ```no_run
//! use draftsman::{
//!     ContentBlock, DiagramSpec, DocumentAssembler, DocumentSpec, PageSetup, ShapeSpec,
//!     StyleSheet,
//! };
//!
//! let mut diagram = DiagramSpec::new(6.0, 4.0);
//! diagram.push(ShapeSpec::Rect {
//!     x: 1.0,
//!     y: 1.0,
//!     width: 2.0,
//!     height: 1.0,
//!     fill: Some("steelblue".into()),
//!     stroke: None,
//!     stroke_width: None,
//!     rounded: true,
//! });
//!
//! let mut doc = DocumentSpec::new(PageSetup::default());
//! doc.push(ContentBlock::Heading {
//!     text: "Architecture Overview".into(),
//!     level: 1,
//!     align: draftsman::Align::Center,
//! });
//! doc.push(ContentBlock::Diagram {
//!     spec: diagram,
//!     width: None,
//!     height: None,
//! });
//!
//! let assembler = DocumentAssembler::new();
//! assembler.render_to_file(&doc, &StyleSheet::default(), "architecture.pdf")?;
//! # Ok::<(), draftsman::RenderError>(())
//! ```

pub mod color;
pub mod diagram;
pub mod document;
pub mod error;
pub mod fonts;
pub mod raster;
pub mod style;
pub mod svg;

pub use diagram::{
    ArrowHead, DiagramComposer, DiagramSpec, Extent, HAlign, ImageBuffer, LegendEntry, LineStyle,
    ShapeSpec,
};
pub use document::{
    Align, ContentBlock, DocumentAssembler, DocumentSpec, ImageSource, Margins, Orientation,
    PageSetup, PageSize,
};
pub use error::{RenderError, Result};
pub use fonts::{ApproxTextMeasure, CosmicTextMeasure, FontSpec, TextMeasure};
pub use style::StyleSheet;
