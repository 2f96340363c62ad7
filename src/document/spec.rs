use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::diagram::DiagramSpec;
use crate::error::{RenderError, Result};

/// Standard page formats (portrait dimensions in points).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageSize {
    #[default]
    A4,
    A3,
    Letter,
    Custom {
        width: f32,
        height: f32,
    },
}

impl PageSize {
    fn portrait(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::A3 => (841.89, 1190.55),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (width, height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    #[default]
    Portrait,
    Landscape,
}

/// Page margins in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    #[serde(default = "default_margin")]
    pub top: f32,
    #[serde(default = "default_margin")]
    pub bottom: f32,
    #[serde(default = "default_margin")]
    pub left: f32,
    #[serde(default = "default_margin")]
    pub right: f32,
}

fn default_margin() -> f32 {
    50.0
}

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: default_margin(),
            bottom: default_margin(),
            left: default_margin(),
            right: default_margin(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PageSetup {
    #[serde(default)]
    pub size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub margins: Margins,
}

impl PageSetup {
    /// Oriented page dimensions in points.
    pub fn dimensions(&self) -> (f32, f32) {
        let (w, h) = self.size.portrait();
        match self.orientation {
            Orientation::Portrait => (w, h),
            Orientation::Landscape => (h, w),
        }
    }

    pub fn content_width(&self) -> f32 {
        self.dimensions().0 - self.margins.left - self.margins.right
    }
}

/// Horizontal alignment of a text block inside the content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Where an embedded image's bytes come from: a file next to the spec, or
/// base64 data inlined into the spec itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSource {
    Path(PathBuf),
    Data(String),
}

impl ImageSource {
    pub fn bytes(&self) -> Result<Vec<u8>> {
        use base64::Engine as _;

        match self {
            ImageSource::Path(path) => Ok(std::fs::read(path)?),
            ImageSource::Data(encoded) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| RenderError::Config(format!("invalid base64 image data: {e}"))),
        }
    }
}

fn default_heading_level() -> u8 {
    1
}

/// One document content block, placed in declaration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Heading {
        text: String,
        #[serde(default = "default_heading_level")]
        level: u8,
        #[serde(default)]
        align: Align,
    },
    /// Body text; inline Markdown emphasis (`**bold**`, `*italic*`,
    /// `` `code` ``) is honored.
    Paragraph {
        text: String,
        #[serde(default)]
        align: Align,
    },
    Code {
        code: String,
        #[serde(default)]
        language: Option<String>,
    },
    Table {
        rows: Vec<Vec<String>>,
        /// Explicit column widths in points; empty means distribute the
        /// content width evenly.
        #[serde(default)]
        widths: Vec<f32>,
    },
    /// Raster image stretched to the declared display size (aspect ratio
    /// is not preserved). Omitted dimensions default to the native pixel
    /// size at 96 px/in.
    Image {
        source: ImageSource,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        height: Option<f32>,
    },
    /// An inline diagram, composed and embedded like an image. Display
    /// size defaults to the canvas extent at 72 pt per unit.
    Diagram {
        spec: DiagramSpec,
        #[serde(default)]
        width: Option<f32>,
        #[serde(default)]
        height: Option<f32>,
    },
    PageBreak,
    Spacer {
        height: f32,
    },
}

/// A full document description: page geometry plus ordered content.
/// Immutable once built; consumed by `DocumentAssembler::render`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSpec {
    #[serde(default)]
    pub page: PageSetup,
    pub blocks: Vec<ContentBlock>,
}

impl DocumentSpec {
    pub fn new(page: PageSetup) -> Self {
        Self {
            page,
            blocks: Vec::new(),
        }
    }

    pub fn push(&mut self, block: ContentBlock) -> &mut Self {
        self.blocks.push(block);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{Align, ContentBlock, DocumentSpec, ImageSource, Orientation, PageSetup, PageSize};

    #[test]
    fn a3_landscape_swaps_dimensions() {
        let page = PageSetup {
            size: PageSize::A3,
            orientation: Orientation::Landscape,
            ..PageSetup::default()
        };
        let (w, h) = page.dimensions();
        assert!(w > h);
        assert!((h - 841.89).abs() < 0.01);
    }

    #[test]
    fn content_width_subtracts_margins() {
        let page = PageSetup::default();
        assert!((page.content_width() - (595.28 - 100.0)).abs() < 0.01);
    }

    #[test]
    fn blocks_deserialize_from_tagged_yaml() {
        let spec: DocumentSpec = serde_yaml::from_str(
            r#"
            blocks:
              - type: heading
                text: Architecture Overview
                level: 2
                align: center
              - type: table
                rows:
                  - [Component, Port]
                  - [Gateway, "8080"]
              - type: page_break
              - type: spacer
                height: 20
            "#,
        )
        .expect("document spec must deserialize");

        assert_eq!(spec.blocks.len(), 4);
        assert!(matches!(
            spec.blocks[0],
            ContentBlock::Heading {
                level: 2,
                align: Align::Center,
                ..
            }
        ));
        assert!(matches!(spec.blocks[2], ContentBlock::PageBreak));
    }

    #[test]
    fn inline_base64_image_data_decodes() {
        let source = ImageSource::Data("aGVsbG8=".to_string());
        assert_eq!(source.bytes().unwrap(), b"hello");
    }

    #[test]
    fn garbage_base64_is_a_config_error() {
        let source = ImageSource::Data("!!!".to_string());
        assert!(source.bytes().is_err());
    }
}
