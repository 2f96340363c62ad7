//! Minimal SVG emission. Both the diagram composer and the document
//! assembler draw by appending elements to an [`SvgCanvas`]; the finished
//! string feeds resvg (raster) or svg2pdf (vector).

/// XML 1.0 valid char ranges:
/// - 0x09, 0x0A, 0x0D
/// - 0x20..=0xD7FF
/// - 0xE000..=0xFFFD
/// - 0x10000..=0x10FFFF
fn is_valid_xml_char(c: char) -> bool {
    matches!(
        c as u32,
        0x09 | 0x0A | 0x0D | 0x20..=0xD7FF | 0xE000..=0xFFFD | 0x10000..=0x10FFFF
    )
}

/// Escape text for use in SVG content and attributes, dropping characters
/// XML 1.0 forbids outright.
pub fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if !is_valid_xml_char(c) {
            continue;
        }
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Accumulates SVG elements for one canvas (a diagram or a document page).
pub struct SvgCanvas {
    width: f32,
    height: f32,
    body: String,
}

impl SvgCanvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            body: String::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn rect(&mut self, x: f32, y: f32, w: f32, h: f32, rx: f32, fill: &str, stroke: Option<(&str, f32)>) {
        self.body.push_str(&format!(
            r#"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}""#
        ));
        if rx > 0.0 {
            self.body.push_str(&format!(r#" rx="{rx:.2}""#));
        }
        self.body.push_str(&format!(r#" fill="{fill}""#));
        if let Some((color, width)) = stroke {
            self.body
                .push_str(&format!(r#" stroke="{color}" stroke-width="{width:.2}""#));
        }
        self.body.push_str(" />");
    }

    pub fn circle(&mut self, cx: f32, cy: f32, r: f32, fill: &str, stroke: Option<(&str, f32)>) {
        self.body
            .push_str(&format!(r#"<circle cx="{cx:.2}" cy="{cy:.2}" r="{r:.2}" fill="{fill}""#));
        if let Some((color, width)) = stroke {
            self.body
                .push_str(&format!(r#" stroke="{color}" stroke-width="{width:.2}""#));
        }
        self.body.push_str(" />");
    }

    #[allow(clippy::too_many_arguments)]
    pub fn line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, stroke: &str, width: f32, dash: Option<&str>) {
        self.body.push_str(&format!(
            r#"<line x1="{x1:.2}" y1="{y1:.2}" x2="{x2:.2}" y2="{y2:.2}" stroke="{stroke}" stroke-width="{width:.2}""#
        ));
        if let Some(pattern) = dash {
            self.body
                .push_str(&format!(r#" stroke-dasharray="{pattern}""#));
        }
        self.body.push_str(" />");
    }

    pub fn polygon(&mut self, points: &[(f32, f32)], fill: &str, stroke: Option<(&str, f32)>) {
        let coords = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.body.push_str(&format!(r#"<polygon points="{coords}" fill="{fill}""#));
        if let Some((color, width)) = stroke {
            self.body
                .push_str(&format!(r#" stroke="{color}" stroke-width="{width:.2}""#));
        }
        self.body.push_str(" />");
    }

    pub fn polyline(&mut self, points: &[(f32, f32)], stroke: &str, width: f32) {
        let coords = points
            .iter()
            .map(|(x, y)| format!("{x:.2},{y:.2}"))
            .collect::<Vec<_>>()
            .join(" ");
        self.body.push_str(&format!(
            r#"<polyline points="{coords}" fill="none" stroke="{stroke}" stroke-width="{width:.2}" />"#
        ));
    }

    pub fn text(&mut self, x: f32, y: f32, content: &str, opts: &TextOptions) {
        let family = if opts.mono { "monospace" } else { "sans-serif" };
        let anchor = match opts.anchor {
            Anchor::Start => "",
            Anchor::Middle => r#" text-anchor="middle""#,
            Anchor::End => r#" text-anchor="end""#,
        };
        let weight = if opts.bold { r#" font-weight="700""# } else { "" };
        let style = if opts.italic {
            r#" font-style="italic""#
        } else {
            ""
        };
        self.body.push_str(&format!(
            r#"<text x="{x:.2}" y="{y:.2}" font-family="{family}" font-size="{size:.2}" fill="{fill}"{anchor}{weight}{style}>{text}</text>"#,
            size = opts.size,
            fill = opts.fill,
            text = escape_xml(content),
        ));
    }

    /// Embed an already-encoded raster image, stretched to the target box.
    pub fn image(&mut self, x: f32, y: f32, w: f32, h: f32, mime: &str, data: &[u8]) {
        use base64::Engine as _;

        let encoded = base64::engine::general_purpose::STANDARD.encode(data);
        self.body.push_str(&format!(
            r#"<image x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" preserveAspectRatio="none" xlink:href="data:{mime};base64,{encoded}" />"#
        ));
    }

    /// Serialize as a standalone SVG document with an opaque background.
    pub fn finish(self, background: &str) -> String {
        format!(
            concat!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" "#,
                r#"width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                r#"<rect width="100%" height="100%" fill="{bg}" />{body}</svg>"#
            ),
            w = self.width,
            h = self.height,
            bg = background,
            body = self.body,
        )
    }
}

/// Text element attributes.
pub struct TextOptions<'a> {
    pub size: f32,
    pub fill: &'a str,
    pub anchor: Anchor,
    pub bold: bool,
    pub italic: bool,
    pub mono: bool,
}

impl<'a> TextOptions<'a> {
    pub fn plain(size: f32, fill: &'a str) -> Self {
        Self {
            size,
            fill,
            anchor: Anchor::Start,
            bold: false,
            italic: false,
            mono: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Start,
    Middle,
    End,
}

#[cfg(test)]
mod tests {
    use super::{Anchor, SvgCanvas, TextOptions, escape_xml};

    #[test]
    fn escapes_special_chars_and_drops_invalid_ones() {
        let s = "A\u{0007}<b & \"c\">";
        assert_eq!(escape_xml(s), "A&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn keeps_valid_whitespace_controls() {
        let s = "a\tb\nc\rd";
        assert_eq!(escape_xml(s), s);
    }

    #[test]
    fn finished_document_declares_viewbox_and_background() {
        let mut canvas = SvgCanvas::new(200.0, 100.0);
        canvas.rect(10.0, 10.0, 50.0, 20.0, 0.0, "#ff0000", None);
        let svg = canvas.finish("#ffffff");

        assert!(svg.starts_with("<svg"));
        assert!(svg.contains(r#"viewBox="0 0 200 100""#));
        assert!(svg.contains(r##"fill="#ffffff""##));
        assert!(svg.contains(r#"<rect x="10.00""#));
    }

    #[test]
    fn text_honors_anchor_and_weight() {
        let mut canvas = SvgCanvas::new(10.0, 10.0);
        canvas.text(
            5.0,
            5.0,
            "hi",
            &TextOptions {
                anchor: Anchor::Middle,
                bold: true,
                ..TextOptions::plain(12.0, "#000000")
            },
        );
        let svg = canvas.finish("white");
        assert!(svg.contains(r#"text-anchor="middle""#));
        assert!(svg.contains(r#"font-weight="700""#));
    }
}
