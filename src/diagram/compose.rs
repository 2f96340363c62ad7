use log::warn;

use super::spec::{ArrowHead, DiagramSpec, HAlign, LineStyle, ShapeSpec};
use crate::color;
use crate::error::{RenderError, Result};
use crate::raster;
use crate::style::StyleSheet;
use crate::svg::{Anchor, SvgCanvas, TextOptions};

/// One canvas unit maps to this many SVG points (72/in, matching the
/// document side where 72 pt = 1 inch).
const UNIT: f32 = 72.0;

const LEGEND_SWATCH: f32 = 12.0;
const LEGEND_MARGIN: f32 = 12.0;
const ARROW_LENGTH: f32 = 10.0;
const ARROW_HALF_WIDTH: f32 = 5.0;

/// A rasterized diagram: PNG-encoded pixels plus dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Deterministic rasterizer for [`DiagramSpec`] values. Holds no state;
/// every call is a pure function of the spec, stylesheet and resolution,
/// so independent threads may compose concurrently.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiagramComposer;

impl DiagramComposer {
    pub fn new() -> Self {
        Self
    }

    /// Rasterize a diagram at the given resolution. The buffer's pixel
    /// dimensions are the canvas extent times `dpi`, rounded up.
    pub fn compose(&self, spec: &DiagramSpec, style: &StyleSheet, dpi: u32) -> Result<ImageBuffer> {
        if dpi == 0 {
            return Err(RenderError::InvalidDiagram(
                "resolution must be positive".to_string(),
            ));
        }

        let svg = self.compose_svg(spec, style)?;
        let (data, width, height) = raster::svg_to_png(&svg, dpi as f32 / UNIT)?;
        Ok(ImageBuffer {
            data,
            width,
            height,
        })
    }

    /// The vector form of [`compose`](Self::compose): shapes in declared
    /// order (painter's algorithm), legend on top.
    pub fn compose_svg(&self, spec: &DiagramSpec, style: &StyleSheet) -> Result<String> {
        if !(spec.extent.width > 0.0) || !(spec.extent.height > 0.0) {
            return Err(RenderError::InvalidDiagram(format!(
                "canvas extent must be positive, got {}x{}",
                spec.extent.width, spec.extent.height
            )));
        }

        let defaults = &style.diagram;
        let background = color::resolve(&defaults.background)?.to_svg();
        let mut canvas = SvgCanvas::new(spec.extent.width * UNIT, spec.extent.height * UNIT);

        for (index, shape) in spec.shapes.iter().enumerate() {
            self.draw_shape(&mut canvas, spec, style, index, shape)?;
        }

        self.draw_legend(&mut canvas, spec, style)?;

        Ok(canvas.finish(&background))
    }

    fn draw_shape(
        &self,
        canvas: &mut SvgCanvas,
        spec: &DiagramSpec,
        style: &StyleSheet,
        index: usize,
        shape: &ShapeSpec,
    ) -> Result<()> {
        let defaults = &style.diagram;

        match shape {
            ShapeSpec::Rect {
                x,
                y,
                width,
                height,
                fill,
                stroke,
                stroke_width,
                rounded,
            } => {
                let fill = resolve_or(fill.as_deref(), &defaults.fill)?;
                let stroke = resolve_or(stroke.as_deref(), &defaults.stroke)?;
                if !geometry_ok(&[*x, *y, *width, *height]) || *width <= 0.0 || *height <= 0.0 {
                    warn!("skipping rect #{index}: degenerate geometry");
                    return Ok(());
                }
                check_extent(spec, index, *x + *width, *y + *height);

                let rx = if *rounded {
                    (6.0_f32).min(*height * UNIT / 4.0)
                } else {
                    0.0
                };
                canvas.rect(
                    *x * UNIT,
                    *y * UNIT,
                    *width * UNIT,
                    *height * UNIT,
                    rx,
                    &fill,
                    Some((&stroke, stroke_width.unwrap_or(defaults.stroke_width))),
                );
            }
            ShapeSpec::Circle {
                cx,
                cy,
                radius,
                fill,
                stroke,
                stroke_width,
            } => {
                let fill = resolve_or(fill.as_deref(), &defaults.fill)?;
                let stroke = resolve_or(stroke.as_deref(), &defaults.stroke)?;
                if !geometry_ok(&[*cx, *cy, *radius]) || *radius <= 0.0 {
                    warn!("skipping circle #{index}: degenerate geometry");
                    return Ok(());
                }
                check_extent(spec, index, *cx + *radius, *cy + *radius);

                canvas.circle(
                    *cx * UNIT,
                    *cy * UNIT,
                    *radius * UNIT,
                    &fill,
                    Some((&stroke, stroke_width.unwrap_or(defaults.stroke_width))),
                );
            }
            ShapeSpec::Connector {
                x1,
                y1,
                x2,
                y2,
                stroke,
                stroke_width,
                arrow,
                line,
            } => {
                let stroke = resolve_or(stroke.as_deref(), &defaults.stroke)?;
                if !geometry_ok(&[*x1, *y1, *x2, *y2]) {
                    warn!("skipping connector #{index}: degenerate geometry");
                    return Ok(());
                }
                check_extent(spec, index, x1.max(*x2), y1.max(*y2));

                let width = stroke_width.unwrap_or(defaults.stroke_width);
                let dash = match line {
                    LineStyle::Solid => None,
                    LineStyle::Dashed => Some("6,4"),
                    LineStyle::Dotted => Some("2,3"),
                };
                let (px1, py1, px2, py2) = (x1 * UNIT, y1 * UNIT, x2 * UNIT, y2 * UNIT);
                canvas.line(px1, py1, px2, py2, &stroke, width, dash);

                if *arrow != ArrowHead::None {
                    let angle = (py2 - py1).atan2(px2 - px1);
                    draw_arrow_head(canvas, px2, py2, angle, *arrow, &stroke, width);
                }
            }
            ShapeSpec::Label {
                x,
                y,
                text,
                size,
                color: label_color,
                align,
            } => {
                let fill = resolve_or(label_color.as_deref(), &defaults.text_color)?;
                let size = size.unwrap_or(defaults.font_size);
                if !geometry_ok(&[*x, *y]) || size <= 0.0 || text.is_empty() {
                    warn!("skipping label #{index}: degenerate geometry or empty text");
                    return Ok(());
                }
                check_extent(spec, index, *x, *y);

                let anchor = match align {
                    HAlign::Left => Anchor::Start,
                    HAlign::Center => Anchor::Middle,
                    HAlign::Right => Anchor::End,
                };
                canvas.text(
                    *x * UNIT,
                    *y * UNIT,
                    text,
                    &TextOptions {
                        anchor,
                        ..TextOptions::plain(size, &fill)
                    },
                );
            }
        }

        Ok(())
    }

    fn draw_legend(
        &self,
        canvas: &mut SvgCanvas,
        spec: &DiagramSpec,
        style: &StyleSheet,
    ) -> Result<()> {
        if spec.legend.is_empty() {
            return Ok(());
        }

        let defaults = &style.diagram;
        let text_color = color::resolve(&defaults.text_color)?.to_svg();
        let stroke = color::resolve(&defaults.stroke)?.to_svg();
        let font_size = defaults.font_size * 0.9;
        let row_height = font_size * 1.5;

        let total = spec.legend.len() as f32 * row_height;
        let mut y = spec.extent.height * UNIT - LEGEND_MARGIN - total;

        for entry in &spec.legend {
            let swatch = color::resolve(&entry.color)?.to_svg();
            canvas.rect(
                LEGEND_MARGIN,
                y,
                LEGEND_SWATCH,
                LEGEND_SWATCH,
                2.0,
                &swatch,
                Some((&stroke, 0.75)),
            );
            canvas.text(
                LEGEND_MARGIN + LEGEND_SWATCH + 6.0,
                y + LEGEND_SWATCH - 2.5,
                &entry.label,
                &TextOptions::plain(font_size, &text_color),
            );
            y += row_height;
        }

        Ok(())
    }
}

fn resolve_or(token: Option<&str>, fallback: &str) -> Result<String> {
    Ok(color::resolve(token.unwrap_or(fallback))?.to_svg())
}

fn geometry_ok(values: &[f32]) -> bool {
    values.iter().all(|v| v.is_finite())
}

fn check_extent(spec: &DiagramSpec, index: usize, max_x: f32, max_y: f32) {
    if max_x > spec.extent.width || max_y > spec.extent.height || max_x < 0.0 || max_y < 0.0 {
        warn!(
            "shape #{index} reaches ({max_x:.2},{max_y:.2}), outside the {}x{} canvas",
            spec.extent.width, spec.extent.height
        );
    }
}

fn draw_arrow_head(
    canvas: &mut SvgCanvas,
    x: f32,
    y: f32,
    angle: f32,
    head: ArrowHead,
    stroke: &str,
    width: f32,
) {
    let cos = angle.cos();
    let sin = angle.sin();
    let p1 = (
        x - cos * ARROW_LENGTH + sin * ARROW_HALF_WIDTH,
        y - sin * ARROW_LENGTH - cos * ARROW_HALF_WIDTH,
    );
    let p2 = (
        x - cos * ARROW_LENGTH - sin * ARROW_HALF_WIDTH,
        y - sin * ARROW_LENGTH + cos * ARROW_HALF_WIDTH,
    );

    match head {
        ArrowHead::Filled => canvas.polygon(&[(x, y), p1, p2], stroke, None),
        ArrowHead::Open => canvas.polyline(&[p1, (x, y), p2], stroke, width),
        ArrowHead::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagramComposer, UNIT};
    use crate::diagram::spec::{ArrowHead, DiagramSpec, LegendEntry, LineStyle, ShapeSpec};
    use crate::error::RenderError;
    use crate::style::StyleSheet;

    fn rect(x: f32, y: f32, w: f32, h: f32, fill: &str) -> ShapeSpec {
        ShapeSpec::Rect {
            x,
            y,
            width: w,
            height: h,
            fill: Some(fill.to_string()),
            stroke: None,
            stroke_width: None,
            rounded: false,
        }
    }

    #[test]
    fn rejects_non_positive_extent() {
        let composer = DiagramComposer::new();
        let style = StyleSheet::default();
        let spec = DiagramSpec::new(0.0, 4.0);

        match composer.compose_svg(&spec, &style) {
            Err(RenderError::InvalidDiagram(_)) => {}
            other => panic!("expected InvalidDiagram, got {other:?}"),
        }
    }

    #[test]
    fn rejects_zero_dpi() {
        let composer = DiagramComposer::new();
        let spec = DiagramSpec::new(2.0, 2.0);
        match composer.compose(&spec, &StyleSheet::default(), 0) {
            Err(RenderError::InvalidDiagram(_)) => {}
            other => panic!("expected InvalidDiagram, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_color_fails_the_compose() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(2.0, 2.0);
        spec.push(rect(0.0, 0.0, 1.0, 1.0, "definitely-not-a-color"));

        match composer.compose_svg(&spec, &StyleSheet::default()) {
            Err(RenderError::InvalidColor(token)) => {
                assert_eq!(token, "definitely-not-a-color");
            }
            other => panic!("expected InvalidColor, got {other:?}"),
        }
    }

    #[test]
    fn degenerate_shapes_are_skipped_not_fatal() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(4.0, 4.0);
        spec.push(rect(0.5, 0.5, -2.0, 1.0, "#ff0000"));
        spec.push(ShapeSpec::Circle {
            cx: 1.0,
            cy: 1.0,
            radius: 0.0,
            fill: None,
            stroke: None,
            stroke_width: None,
        });

        let svg = composer
            .compose_svg(&spec, &StyleSheet::default())
            .expect("bad shapes must not abort the diagram");

        // Only the background rect survives.
        assert_eq!(svg.matches("<rect").count(), 1);
        assert_eq!(svg.matches("<circle").count(), 0);
    }

    #[test]
    fn out_of_extent_shapes_still_render() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(2.0, 2.0);
        spec.push(rect(1.5, 1.5, 3.0, 3.0, "#00ff00"));

        let svg = composer.compose_svg(&spec, &StyleSheet::default()).unwrap();
        assert_eq!(svg.matches("<rect").count(), 2);
    }

    #[test]
    fn connector_emits_dash_pattern_and_arrow() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(4.0, 4.0);
        spec.push(ShapeSpec::Connector {
            x1: 0.5,
            y1: 0.5,
            x2: 3.0,
            y2: 0.5,
            stroke: Some("#333333".to_string()),
            stroke_width: None,
            arrow: ArrowHead::Filled,
            line: LineStyle::Dashed,
        });

        let svg = composer.compose_svg(&spec, &StyleSheet::default()).unwrap();
        assert!(svg.contains(r#"stroke-dasharray="6,4""#));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn legend_entries_draw_swatch_and_caption() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(4.0, 3.0);
        spec.legend.push(LegendEntry {
            label: "command side".to_string(),
            color: "steelblue".to_string(),
        });

        let svg = composer.compose_svg(&spec, &StyleSheet::default()).unwrap();
        assert!(svg.contains("command side"));
        assert!(svg.contains("#4682b4"));
    }

    #[test]
    fn pixel_dimensions_track_extent_times_dpi() {
        let composer = DiagramComposer::new();
        let spec = DiagramSpec::new(2.0, 1.5);
        let buffer = composer.compose(&spec, &StyleSheet::default(), 100).unwrap();

        assert!((buffer.width as i64 - 200).abs() <= 1);
        assert!((buffer.height as i64 - 150).abs() <= 1);
    }

    #[test]
    fn later_shape_occludes_earlier_one() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(2.0, 2.0);
        spec.push(rect(0.5, 0.5, 1.0, 1.0, "#ff0000"));
        spec.push(rect(0.5, 0.5, 1.0, 1.0, "#0000ff"));

        let buffer = composer.compose(&spec, &StyleSheet::default(), 72).unwrap();
        let pixmap = tiny_skia::Pixmap::decode_png(&buffer.data).expect("valid png");
        let center = pixmap
            .pixel(UNIT as u32, UNIT as u32)
            .expect("center pixel inside canvas");

        assert_eq!(center.blue(), 255);
        assert_eq!(center.red(), 0);
    }

    #[test]
    fn compose_is_deterministic() {
        let composer = DiagramComposer::new();
        let mut spec = DiagramSpec::new(3.0, 2.0);
        spec.push(rect(0.2, 0.2, 2.0, 1.0, "#2e86c1"));
        let style = StyleSheet::default();

        let first = composer.compose(&spec, &style, 96).unwrap();
        let second = composer.compose(&spec, &style, 96).unwrap();
        assert_eq!(first, second);
    }
}
