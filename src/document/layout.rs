//! Pagination: walks a block list with a vertical cursor, emitting one SVG
//! canvas per page. Blocks that no longer fit start a new page; explicit
//! page breaks force one.

use log::{debug, warn};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use syntect::easy::HighlightLines;
use syntect::highlighting::Theme as HighlightTheme;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use super::spec::{Align, ContentBlock, DocumentSpec, Margins};
use crate::color;
use crate::diagram::{DiagramComposer, DiagramSpec};
use crate::error::{RenderError, Result};
use crate::fonts::{FontSpec, TextMeasure};
use crate::style::StyleSheet;
use crate::svg::{Anchor, SvgCanvas, TextOptions};

const INLINE_CODE_PAD: f32 = 2.0;
const PX_TO_PT: f32 = 72.0 / 96.0;

/// Style tokens resolved once per render so a bad color fails before any
/// page is produced.
struct Palette {
    page_background: String,
    text: String,
    heading: String,
    header_background: String,
    header_text: String,
    band_background: String,
    grid: String,
    code_background: String,
    code_text: String,
}

impl Palette {
    fn resolve(style: &StyleSheet) -> Result<Self> {
        let svg = |token: &str| color::resolve(token).map(|c| c.to_svg());
        Ok(Self {
            page_background: svg(&style.page_background)?,
            text: svg(&style.text_color)?,
            heading: svg(&style.heading_color)?,
            header_background: svg(&style.table.header_background)?,
            header_text: svg(&style.table.header_text)?,
            band_background: svg(&style.table.band_background)?,
            grid: svg(&style.table.grid_color)?,
            code_background: svg(&style.code.background)?,
            code_text: svg(&style.code.text_color)?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Span {
    text: String,
    bold: bool,
    italic: bool,
    code: bool,
}

impl Span {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            bold: false,
            italic: false,
            code: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Run {
    x: f32,
    text: String,
    font: FontSpec,
}

#[derive(Debug, Clone)]
struct Line {
    runs: Vec<Run>,
    width: f32,
}

/// Split paragraph text into styled spans, honoring inline Markdown
/// emphasis and code.
fn parse_inline(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut bold = 0usize;
    let mut italic = 0usize;

    for event in Parser::new(text) {
        match event {
            Event::Start(Tag::Strong) => bold += 1,
            Event::End(TagEnd::Strong) => bold = bold.saturating_sub(1),
            Event::Start(Tag::Emphasis) => italic += 1,
            Event::End(TagEnd::Emphasis) => italic = italic.saturating_sub(1),
            Event::Text(t) => spans.push(Span {
                text: t.to_string(),
                bold: bold > 0,
                italic: italic > 0,
                code: false,
            }),
            Event::Code(c) => spans.push(Span {
                text: c.to_string(),
                bold: false,
                italic: false,
                code: true,
            }),
            Event::SoftBreak | Event::HardBreak => spans.push(Span::plain(" ")),
            _ => {}
        }
    }

    spans
}

/// Column widths: explicit values win, leftover page width is distributed
/// evenly across the undeclared columns.
pub(crate) fn column_widths(explicit: &[f32], cols: usize, content_width: f32) -> Vec<f32> {
    if explicit.is_empty() {
        return vec![content_width / cols as f32; cols];
    }

    let mut widths: Vec<f32> = explicit.iter().copied().take(cols).collect();
    if widths.len() < cols {
        let used: f32 = widths.iter().sum();
        let remaining = cols - widths.len();
        let share = ((content_width - used).max(0.0)) / remaining as f32;
        widths.extend(std::iter::repeat(share).take(remaining));
    }
    widths
}

pub(crate) struct Paginator<'a, M: TextMeasure> {
    measure: &'a M,
    composer: DiagramComposer,
    syntaxes: &'a SyntaxSet,
    highlight_theme: &'a HighlightTheme,
    style: &'a StyleSheet,
    palette: Palette,
    page_width: f32,
    page_height: f32,
    margins: Margins,
    content_width: f32,
    pages: Vec<String>,
    canvas: SvgCanvas,
    cursor: f32,
    page_has_content: bool,
}

impl<'a, M: TextMeasure> Paginator<'a, M> {
    pub(crate) fn new(
        measure: &'a M,
        syntaxes: &'a SyntaxSet,
        highlight_theme: &'a HighlightTheme,
        style: &'a StyleSheet,
        spec: &DocumentSpec,
    ) -> Result<Self> {
        let palette = Palette::resolve(style)?;
        let (page_width, page_height) = spec.page.dimensions();
        if !(page_width > 0.0) || !(page_height > 0.0) {
            return Err(RenderError::Config(format!(
                "page dimensions must be positive, got {page_width}x{page_height}"
            )));
        }

        let margins = spec.page.margins;
        Ok(Self {
            measure,
            composer: DiagramComposer::new(),
            syntaxes,
            highlight_theme,
            style,
            palette,
            page_width,
            page_height,
            margins,
            content_width: page_width - margins.left - margins.right,
            pages: Vec::new(),
            canvas: SvgCanvas::new(page_width, page_height),
            cursor: margins.top,
            page_has_content: false,
        })
    }

    pub(crate) fn run(mut self, spec: &DocumentSpec) -> Result<Vec<String>> {
        let mut prev_was_break = false;

        for block in &spec.blocks {
            if matches!(block, ContentBlock::PageBreak) {
                // One page turn per boundary: a break directly after
                // another break is a no-op.
                if !prev_was_break {
                    self.finish_page();
                }
                prev_was_break = true;
                continue;
            }
            prev_was_break = false;

            match block {
                ContentBlock::Heading { text, level, align } => {
                    let size = self.style.heading_size(*level);
                    let spans = [Span::plain(text)];
                    self.emit_text_block(&spans, size, true, Heading, *align);
                }
                ContentBlock::Paragraph { text, align } => {
                    let spans = parse_inline(text);
                    self.emit_text_block(&spans, self.style.font_size_body, false, Body, *align);
                }
                ContentBlock::Code { code, language } => {
                    self.emit_code_block(code, language.as_deref());
                }
                ContentBlock::Table { rows, widths } => {
                    self.emit_table(rows, widths);
                }
                ContentBlock::Image {
                    source,
                    width,
                    height,
                } => {
                    let bytes = source.bytes()?;
                    self.emit_image(&bytes, *width, *height)?;
                }
                ContentBlock::Diagram {
                    spec: diagram,
                    width,
                    height,
                } => {
                    self.emit_diagram(diagram, *width, *height)?;
                }
                ContentBlock::Spacer { height } => {
                    if height.is_finite() && *height > 0.0 {
                        self.cursor = (self.cursor + height).min(self.bottom_limit());
                    }
                }
                ContentBlock::PageBreak => unreachable!("handled above"),
            }
        }

        // The current page is always emitted, so a trailing page break
        // yields a trailing blank page.
        self.finish_page();
        Ok(self.pages)
    }

    fn bottom_limit(&self) -> f32 {
        self.page_height - self.margins.bottom
    }

    fn finish_page(&mut self) {
        let full = std::mem::replace(
            &mut self.canvas,
            SvgCanvas::new(self.page_width, self.page_height),
        );
        self.pages.push(full.finish(&self.palette.page_background));
        self.cursor = self.margins.top;
        self.page_has_content = false;
        debug!("page {} finished", self.pages.len());
    }

    /// Reserve vertical space for a block, breaking the page first when it
    /// no longer fits. Returns the block's top edge.
    fn place(&mut self, height: f32) -> f32 {
        if self.page_has_content && self.cursor + height > self.bottom_limit() {
            debug!("{height:.1}pt block overflows remaining space, breaking page");
            self.finish_page();
        }
        let y = self.cursor;
        self.cursor += height + self.style.block_spacing;
        self.page_has_content = true;
        y
    }

    fn wrap_spans(&self, spans: &[Span], base_size: f32, bold_all: bool, max_width: f32) -> Vec<Line> {
        let mut lines = Vec::new();
        let mut runs: Vec<Run> = Vec::new();
        let mut cursor_x = 0.0f32;
        let mut pending_space = false;

        for span in spans {
            let font = FontSpec {
                size: if span.code { base_size * 0.9 } else { base_size },
                bold: span.bold || bold_all,
                italic: span.italic,
                mono: span.code,
            };
            let (space_width, _) = self.measure.measure(" ", &font, None);

            let words: Vec<&str> = span.text.split_whitespace().collect();
            if words.is_empty() {
                if !span.text.is_empty() {
                    pending_space = true;
                }
                continue;
            }
            if span.text.starts_with(|c: char| c.is_whitespace()) {
                pending_space = true;
            }

            for (i, word) in words.iter().enumerate() {
                if i > 0 {
                    pending_space = true;
                }

                let (word_width, _) = self.measure.measure(word, &font, None);
                let gap = if pending_space && cursor_x > 0.0 {
                    space_width
                } else {
                    0.0
                };

                if cursor_x > 0.0 && cursor_x + gap + word_width > max_width {
                    lines.push(Line {
                        runs: std::mem::take(&mut runs),
                        width: cursor_x,
                    });
                    cursor_x = 0.0;
                    runs.push(Run {
                        x: 0.0,
                        text: (*word).to_string(),
                        font,
                    });
                    cursor_x += word_width;
                } else {
                    runs.push(Run {
                        x: cursor_x + gap,
                        text: (*word).to_string(),
                        font,
                    });
                    cursor_x += gap + word_width;
                }
                pending_space = false;
            }

            if span.text.ends_with(|c: char| c.is_whitespace()) {
                pending_space = true;
            }
        }

        if !runs.is_empty() || lines.is_empty() {
            lines.push(Line {
                runs,
                width: cursor_x,
            });
        }
        lines
    }

    fn emit_text_block(
        &mut self,
        spans: &[Span],
        size: f32,
        bold_all: bool,
        role: TextRole,
        align: Align,
    ) {
        let lines = self.wrap_spans(spans, size, bold_all, self.content_width);
        let line_height = size * self.style.line_height;
        let height = lines.len() as f32 * line_height;
        let y0 = self.place(height);

        for (i, line) in lines.iter().enumerate() {
            let dx = match align {
                Align::Left => 0.0,
                Align::Center => ((self.content_width - line.width) / 2.0).max(0.0),
                Align::Right => (self.content_width - line.width).max(0.0),
            };
            let baseline = y0 + i as f32 * line_height + size;

            for run in &line.runs {
                let x = self.margins.left + dx + run.x;
                if run.font.mono {
                    let (w, _) = self.measure.measure(&run.text, &run.font, None);
                    self.canvas.rect(
                        x - INLINE_CODE_PAD,
                        baseline - run.font.size,
                        w + INLINE_CODE_PAD * 2.0,
                        run.font.size * 1.3,
                        self.style.code.radius,
                        &self.palette.code_background,
                        None,
                    );
                }

                let fill = if run.font.mono {
                    &self.palette.code_text
                } else {
                    match role {
                        Heading => &self.palette.heading,
                        Body => &self.palette.text,
                    }
                };
                self.canvas.text(
                    x,
                    baseline,
                    &run.text,
                    &TextOptions {
                        size: run.font.size,
                        fill,
                        anchor: Anchor::Start,
                        bold: run.font.bold,
                        italic: run.font.italic,
                        mono: run.font.mono,
                    },
                );
            }
        }
    }

    fn emit_code_block(&mut self, code: &str, language: Option<&str>) {
        let size = self.style.font_size_code;
        let line_height = size * self.style.line_height;
        let pad = self.style.code.padding;

        let mut lines: Vec<&str> = LinesWithEndings::from(code).collect();
        if lines.is_empty() {
            lines.push("");
        }
        let height = lines.len() as f32 * line_height + pad * 2.0;
        let y0 = self.place(height);

        self.canvas.rect(
            self.margins.left,
            y0,
            self.content_width,
            height,
            self.style.code.radius,
            &self.palette.code_background,
            None,
        );

        let syntax = language.and_then(|token| self.syntaxes.find_syntax_by_token(token));
        let mut highlighter =
            syntax.map(|syntax| HighlightLines::new(syntax, self.highlight_theme));
        let font = FontSpec::mono(size);

        for (i, raw_line) in lines.iter().enumerate() {
            let baseline = y0 + pad + size + i as f32 * line_height;
            let mut x = self.margins.left + pad;

            let ranges = highlighter
                .as_mut()
                .and_then(|h| h.highlight_line(raw_line, self.syntaxes).ok());

            match ranges {
                Some(ranges) => {
                    for (hl, fragment) in ranges {
                        let fragment = fragment.trim_end_matches('\n');
                        if fragment.is_empty() {
                            continue;
                        }
                        let fg = hl.foreground;
                        let fill = format!("#{:02x}{:02x}{:02x}", fg.r, fg.g, fg.b);
                        self.canvas.text(
                            x,
                            baseline,
                            fragment,
                            &TextOptions {
                                mono: true,
                                ..TextOptions::plain(size, &fill)
                            },
                        );
                        let (w, _) = self.measure.measure(fragment, &font, None);
                        x += w;
                    }
                }
                None => {
                    let text = raw_line.trim_end_matches('\n');
                    if !text.is_empty() {
                        self.canvas.text(
                            x,
                            baseline,
                            text,
                            &TextOptions {
                                mono: true,
                                ..TextOptions::plain(size, &self.palette.code_text)
                            },
                        );
                    }
                }
            }
        }
    }

    fn emit_table(&mut self, rows: &[Vec<String>], widths: &[f32]) {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        if rows.is_empty() || cols == 0 {
            warn!("skipping empty table");
            return;
        }

        let col_widths = column_widths(widths, cols, self.content_width);
        let table_width: f32 = col_widths.iter().sum();
        let pad = self.style.table.cell_padding;

        // Wrap every cell up front so row heights are known before placing.
        let mut cell_lines: Vec<Vec<Vec<Line>>> = Vec::with_capacity(rows.len());
        let mut row_heights: Vec<f32> = Vec::with_capacity(rows.len());
        for (r, row) in rows.iter().enumerate() {
            let header = r == 0;
            let size = self.style.font_size_body;
            let line_height = size * self.style.line_height;
            let mut max_height = line_height;
            let mut per_cell = Vec::with_capacity(cols);

            for c in 0..cols {
                let text = row.get(c).map(String::as_str).unwrap_or("");
                let spans = [Span::plain(text)];
                let lines =
                    self.wrap_spans(&spans, size, header, (col_widths[c] - pad * 2.0).max(size));
                max_height = max_height.max(lines.len() as f32 * line_height);
                per_cell.push(lines);
            }

            row_heights.push(max_height + pad * 2.0);
            cell_lines.push(per_cell);
        }

        let total_height: f32 = row_heights.iter().sum();
        let y0 = self.place(total_height);
        let x0 = self.margins.left;
        let size = self.style.font_size_body;
        let line_height = size * self.style.line_height;

        let mut y = y0;
        for (r, row_height) in row_heights.iter().enumerate() {
            // Header background, then alternating banding below it.
            if r == 0 {
                self.canvas.rect(
                    x0,
                    y,
                    table_width,
                    *row_height,
                    0.0,
                    &self.palette.header_background,
                    None,
                );
            } else if (r - 1) % 2 == 1 {
                self.canvas.rect(
                    x0,
                    y,
                    table_width,
                    *row_height,
                    0.0,
                    &self.palette.band_background,
                    None,
                );
            }

            let mut x = x0;
            for c in 0..cols {
                for (i, line) in cell_lines[r][c].iter().enumerate() {
                    let baseline = y + pad + size + i as f32 * line_height;
                    for run in &line.runs {
                        let fill = if r == 0 {
                            &self.palette.header_text
                        } else {
                            &self.palette.text
                        };
                        self.canvas.text(
                            x + pad + run.x,
                            baseline,
                            &run.text,
                            &TextOptions {
                                size: run.font.size,
                                fill,
                                anchor: Anchor::Start,
                                bold: run.font.bold,
                                italic: run.font.italic,
                                mono: run.font.mono,
                            },
                        );
                    }
                }
                x += col_widths[c];
            }

            y += row_height;
        }

        // Grid: outer frame plus row/column separators.
        let grid = self.palette.grid.clone();
        let gw = self.style.table.grid_width;
        let mut boundary = y0;
        self.canvas.line(x0, boundary, x0 + table_width, boundary, &grid, gw, None);
        for row_height in &row_heights {
            boundary += row_height;
            self.canvas.line(x0, boundary, x0 + table_width, boundary, &grid, gw, None);
        }
        let mut x = x0;
        self.canvas.line(x, y0, x, y0 + total_height, &grid, gw, None);
        for width in &col_widths {
            x += width;
            self.canvas.line(x, y0, x, y0 + total_height, &grid, gw, None);
        }
    }

    fn emit_image(&mut self, bytes: &[u8], width: Option<f32>, height: Option<f32>) -> Result<()> {
        let native = imagesize::blob_size(bytes).ok();
        let mime = match imagesize::image_type(bytes) {
            Ok(imagesize::ImageType::Jpeg) => "image/jpeg",
            Ok(imagesize::ImageType::Gif) => "image/gif",
            Ok(imagesize::ImageType::Webp) => "image/webp",
            _ => "image/png",
        };

        let native_pt =
            native.map(|s| (s.width as f32 * PX_TO_PT, s.height as f32 * PX_TO_PT));
        let (w, h) = match (width, height, native_pt) {
            (Some(w), Some(h), _) => (w, h),
            (Some(w), None, Some((nw, nh))) => (w, w * nh / nw),
            (None, Some(h), Some((nw, nh))) => (h * nw / nh, h),
            (None, None, Some(dims)) => dims,
            _ => {
                return Err(RenderError::Config(
                    "image dimensions missing and not derivable from the data".to_string(),
                ));
            }
        };

        if w > self.content_width {
            warn!("image is {w:.0}pt wide, wider than the {:.0}pt content area", self.content_width);
        }

        let y0 = self.place(h);
        let x = self.margins.left + ((self.content_width - w) / 2.0).max(0.0);
        self.canvas.image(x, y0, w, h, mime, bytes);
        Ok(())
    }

    fn emit_diagram(
        &mut self,
        diagram: &DiagramSpec,
        width: Option<f32>,
        height: Option<f32>,
    ) -> Result<()> {
        let buffer = self
            .composer
            .compose(diagram, self.style, self.style.diagram.raster_dpi)?;

        let w = width.unwrap_or(diagram.extent.width * 72.0);
        let h = height.unwrap_or(diagram.extent.height * 72.0);
        let y0 = self.place(h);
        let x = self.margins.left + ((self.content_width - w) / 2.0).max(0.0);
        self.canvas.image(x, y0, w, h, "image/png", &buffer.data);
        Ok(())
    }
}

use TextRole::{Body, Heading};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextRole {
    Heading,
    Body,
}

#[cfg(test)]
mod tests {
    use super::{Span, column_widths, parse_inline};

    #[test]
    fn three_auto_columns_split_content_width_evenly() {
        let widths = column_widths(&[], 3, 495.0);
        assert_eq!(widths.len(), 3);
        for w in &widths {
            assert!((w - 165.0).abs() <= 1.0);
        }
    }

    #[test]
    fn explicit_widths_win_and_leftover_is_shared() {
        let widths = column_widths(&[100.0], 3, 400.0);
        assert_eq!(widths[0], 100.0);
        assert!((widths[1] - 150.0).abs() <= 1.0);
        assert!((widths[2] - 150.0).abs() <= 1.0);
    }

    #[test]
    fn inline_markdown_produces_styled_spans() {
        let spans = parse_inline("plain **bold** and `code`");
        assert!(spans.iter().any(|s| s.bold && s.text == "bold"));
        assert!(spans.iter().any(|s| s.code && s.text == "code"));
        assert!(
            spans
                .iter()
                .any(|s| !s.bold && !s.code && s.text.contains("plain"))
        );
    }

    #[test]
    fn plain_span_helper_is_unstyled() {
        let span = Span::plain("x");
        assert!(!span.bold && !span.italic && !span.code);
    }
}
