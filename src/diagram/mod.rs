mod compose;
mod spec;

pub use compose::{DiagramComposer, ImageBuffer};
pub use spec::{ArrowHead, DiagramSpec, Extent, HAlign, LegendEntry, LineStyle, ShapeSpec};
