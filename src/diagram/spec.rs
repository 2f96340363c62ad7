use serde::{Deserialize, Serialize};

/// Canvas extent in abstract units (one unit renders as 72 pt, so the
/// extent behaves like a size in inches).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Extent {
    pub width: f32,
    pub height: f32,
}

/// Connector arrow-head style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrowHead {
    #[default]
    None,
    Open,
    Filled,
}

/// Connector line style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

/// Horizontal alignment of a text label around its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// One declarative shape. Coordinates are canvas units with the origin at
/// the top-left corner; colors are tokens resolved at compose time, and
/// omitted colors fall back to the stylesheet's diagram defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeSpec {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default)]
        fill: Option<String>,
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: Option<f32>,
        #[serde(default)]
        rounded: bool,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        #[serde(default)]
        fill: Option<String>,
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: Option<f32>,
    },
    Connector {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        #[serde(default)]
        stroke: Option<String>,
        #[serde(default)]
        stroke_width: Option<f32>,
        #[serde(default)]
        arrow: ArrowHead,
        #[serde(default)]
        line: LineStyle,
    },
    Label {
        x: f32,
        y: f32,
        text: String,
        #[serde(default)]
        size: Option<f32>,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        align: HAlign,
    },
}

/// A legend row: color swatch plus caption, drawn in the bottom-left
/// corner after all shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: String,
}

/// A complete diagram description: canvas extent, shapes in paint order,
/// optional legend. Built once by the caller and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagramSpec {
    pub extent: Extent,
    pub shapes: Vec<ShapeSpec>,
    #[serde(default)]
    pub legend: Vec<LegendEntry>,
}

impl DiagramSpec {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            extent: Extent { width, height },
            shapes: Vec::new(),
            legend: Vec::new(),
        }
    }

    pub fn push(&mut self, shape: ShapeSpec) -> &mut Self {
        self.shapes.push(shape);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{DiagramSpec, ShapeSpec};

    #[test]
    fn shapes_deserialize_from_tagged_json() {
        let spec: DiagramSpec = serde_json::from_str(
            r##"{
                "extent": {"width": 8.0, "height": 5.0},
                "shapes": [
                    {"type": "rect", "x": 1, "y": 1, "width": 2, "height": 1, "fill": "#ff0000", "rounded": true},
                    {"type": "connector", "x1": 1, "y1": 1, "x2": 3, "y2": 2, "arrow": "filled", "line": "dashed"},
                    {"type": "label", "x": 2, "y": 1.5, "text": "gateway", "align": "left"}
                ],
                "legend": [{"label": "service", "color": "steelblue"}]
            }"##,
        )
        .expect("diagram spec must deserialize");

        assert_eq!(spec.shapes.len(), 3);
        assert!(matches!(spec.shapes[0], ShapeSpec::Rect { rounded: true, .. }));
        assert_eq!(spec.legend[0].color, "steelblue");
    }

    #[test]
    fn optional_attributes_default_off() {
        let shape: ShapeSpec =
            serde_json::from_str(r#"{"type": "rect", "x": 0, "y": 0, "width": 1, "height": 1}"#)
                .unwrap();
        match shape {
            ShapeSpec::Rect {
                fill,
                stroke,
                rounded,
                ..
            } => {
                assert!(fill.is_none());
                assert!(stroke.is_none());
                assert!(!rounded);
            }
            _ => panic!("expected rect"),
        }
    }
}
