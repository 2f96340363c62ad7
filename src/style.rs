use serde::{Deserialize, Serialize};

use crate::error::{RenderError, Result};

const FONT_SIZE_BODY: f32 = 11.0;
const FONT_SIZE_CODE: f32 = 9.0;
const LINE_HEIGHT: f32 = 1.4;
const BLOCK_SPACING: f32 = 10.0;
const CELL_PADDING: f32 = 5.0;
const GRID_WIDTH: f32 = 0.75;
const CODE_PADDING: f32 = 8.0;
const CODE_RADIUS: f32 = 4.0;
const DIAGRAM_FONT_SIZE: f32 = 11.0;
const DIAGRAM_STROKE_WIDTH: f32 = 1.5;
const DIAGRAM_RASTER_DPI: u32 = 144;

/// Immutable styling configuration, passed explicitly into every
/// `compose`/`render` call. All colors are tokens resolved at render time.
///
/// Loadable from TOML; every field falls back to the built-in light theme
/// so partial style files stay valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleSheet {
    #[serde(default = "default_page_background")]
    pub page_background: String,
    #[serde(default = "default_text_color")]
    pub text_color: String,
    #[serde(default = "default_heading_color")]
    pub heading_color: String,

    #[serde(default = "default_font_size_body")]
    pub font_size_body: f32,
    #[serde(default = "default_font_size_code")]
    pub font_size_code: f32,
    #[serde(default = "default_line_height")]
    pub line_height: f32,
    #[serde(default = "default_block_spacing")]
    pub block_spacing: f32,

    #[serde(default)]
    pub table: TableStyle,
    #[serde(default)]
    pub code: CodeStyle,
    #[serde(default)]
    pub diagram: DiagramStyle,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableStyle {
    #[serde(default = "default_header_background")]
    pub header_background: String,
    #[serde(default = "default_header_text")]
    pub header_text: String,
    #[serde(default = "default_band_background")]
    pub band_background: String,
    #[serde(default = "default_grid_color")]
    pub grid_color: String,
    #[serde(default = "default_grid_width")]
    pub grid_width: f32,
    #[serde(default = "default_cell_padding")]
    pub cell_padding: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeStyle {
    #[serde(default = "default_code_background")]
    pub background: String,
    #[serde(default = "default_code_text")]
    pub text_color: String,
    #[serde(default = "default_code_padding")]
    pub padding: f32,
    #[serde(default = "default_code_radius")]
    pub radius: f32,
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
}

/// Fallback colors for diagram shapes that omit their own, plus the raster
/// resolution used for diagrams embedded in documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramStyle {
    #[serde(default = "default_diagram_background")]
    pub background: String,
    #[serde(default = "default_diagram_fill")]
    pub fill: String,
    #[serde(default = "default_diagram_stroke")]
    pub stroke: String,
    #[serde(default = "default_diagram_text")]
    pub text_color: String,
    #[serde(default = "default_diagram_font_size")]
    pub font_size: f32,
    #[serde(default = "default_diagram_stroke_width")]
    pub stroke_width: f32,
    #[serde(default = "default_diagram_raster_dpi")]
    pub raster_dpi: u32,
}

fn default_page_background() -> String {
    "#ffffff".to_string()
}
fn default_text_color() -> String {
    "#2c3e50".to_string()
}
fn default_heading_color() -> String {
    "#1a5276".to_string()
}
fn default_font_size_body() -> f32 {
    FONT_SIZE_BODY
}
fn default_font_size_code() -> f32 {
    FONT_SIZE_CODE
}
fn default_line_height() -> f32 {
    LINE_HEIGHT
}
fn default_block_spacing() -> f32 {
    BLOCK_SPACING
}
fn default_header_background() -> String {
    "#3498db".to_string()
}
fn default_header_text() -> String {
    "#ffffff".to_string()
}
fn default_band_background() -> String {
    "#f1f4f7".to_string()
}
fn default_grid_color() -> String {
    "#bdc3c7".to_string()
}
fn default_grid_width() -> f32 {
    GRID_WIDTH
}
fn default_cell_padding() -> f32 {
    CELL_PADDING
}
fn default_code_background() -> String {
    "#f6f8fa".to_string()
}
fn default_code_text() -> String {
    "#24292f".to_string()
}
fn default_code_padding() -> f32 {
    CODE_PADDING
}
fn default_code_radius() -> f32 {
    CODE_RADIUS
}
fn default_highlight_theme() -> String {
    "InspiredGitHub".to_string()
}
fn default_diagram_background() -> String {
    "#ffffff".to_string()
}
fn default_diagram_fill() -> String {
    "#eaf2f8".to_string()
}
fn default_diagram_stroke() -> String {
    "#34495e".to_string()
}
fn default_diagram_text() -> String {
    "#2c3e50".to_string()
}
fn default_diagram_font_size() -> f32 {
    DIAGRAM_FONT_SIZE
}
fn default_diagram_stroke_width() -> f32 {
    DIAGRAM_STROKE_WIDTH
}
fn default_diagram_raster_dpi() -> u32 {
    DIAGRAM_RASTER_DPI
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            page_background: default_page_background(),
            text_color: default_text_color(),
            heading_color: default_heading_color(),
            font_size_body: default_font_size_body(),
            font_size_code: default_font_size_code(),
            line_height: default_line_height(),
            block_spacing: default_block_spacing(),
            table: TableStyle::default(),
            code: CodeStyle::default(),
            diagram: DiagramStyle::default(),
        }
    }
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            header_background: default_header_background(),
            header_text: default_header_text(),
            band_background: default_band_background(),
            grid_color: default_grid_color(),
            grid_width: default_grid_width(),
            cell_padding: default_cell_padding(),
        }
    }
}

impl Default for CodeStyle {
    fn default() -> Self {
        Self {
            background: default_code_background(),
            text_color: default_code_text(),
            padding: default_code_padding(),
            radius: default_code_radius(),
            highlight_theme: default_highlight_theme(),
        }
    }
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self {
            background: default_diagram_background(),
            fill: default_diagram_fill(),
            stroke: default_diagram_stroke(),
            text_color: default_diagram_text(),
            font_size: default_diagram_font_size(),
            stroke_width: default_diagram_stroke_width(),
            raster_dpi: default_diagram_raster_dpi(),
        }
    }
}

impl StyleSheet {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RenderError::Config(format!("failed to parse style sheet: {e}")))
    }

    /// Heading point size for levels 1..=3; deeper levels fall back to the
    /// body size.
    pub fn heading_size(&self, level: u8) -> f32 {
        let scale = match level {
            1 => 2.0,
            2 => 1.6,
            3 => 1.35,
            _ => 1.0,
        };
        self.font_size_body * scale
    }
}

#[cfg(test)]
mod tests {
    use super::StyleSheet;

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let style = StyleSheet::from_toml_str(
            r##"
            text_color = "#111111"

            [table]
            header_background = "#222222"
            "##,
        )
        .expect("partial style must parse");

        assert_eq!(style.text_color, "#111111");
        assert_eq!(style.table.header_background, "#222222");
        assert_eq!(style.table.header_text, StyleSheet::default().table.header_text);
        assert_eq!(style.page_background, "#ffffff");
    }

    #[test]
    fn heading_sizes_shrink_with_level() {
        let style = StyleSheet::default();
        assert!(style.heading_size(1) > style.heading_size(2));
        assert!(style.heading_size(2) > style.heading_size(3));
        assert_eq!(style.heading_size(6), style.font_size_body);
    }
}
