//! SVG post-processing: rasterization through resvg and single-page PDF
//! conversion through svg2pdf. Multi-page assembly lives in
//! [`crate::document::pdf`].

use resvg::usvg;
use tiny_skia::{Pixmap, Transform};

use crate::error::{RenderError, Result};

/// Rasterize an SVG document, scaling uniformly. Returns the PNG bytes and
/// the pixel dimensions.
pub fn svg_to_png(svg: &str, scale: f32) -> Result<(Vec<u8>, u32, u32)> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(RenderError::Svg(format!("invalid raster scale: {scale}")));
    }

    let mut opts = usvg::Options::default();
    {
        let fontdb = opts.fontdb_mut();
        fontdb.load_system_fonts();
        configure_font_fallbacks(fontdb);
    }

    let tree = usvg::Tree::from_str(svg, &opts)
        .map_err(|e| RenderError::Svg(format!("failed to parse SVG: {e}")))?;

    let width = (tree.size().width() * scale).ceil() as u32;
    let height = (tree.size().height() * scale).ceil() as u32;

    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| RenderError::Svg(format!("cannot allocate {width}x{height} pixmap")))?;
    let transform = Transform::from_scale(scale, scale);
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    let data = pixmap
        .encode_png()
        .map_err(|e| RenderError::Svg(format!("failed to encode PNG: {e}")))?;

    Ok((data, width, height))
}

/// Convert one SVG document into a standalone single-page PDF. Text is
/// kept as paths so the output never depends on viewer-side fonts.
pub fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let opts = svg2pdf_options();

    let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
        .map_err(|e| RenderError::Svg(format!("failed to parse SVG: {e}")))?;

    let options = svg2pdf::ConversionOptions {
        embed_text: false,
        ..Default::default()
    };
    let page_options = svg2pdf::PageOptions::default();

    svg2pdf::to_pdf(&tree, options, page_options)
        .map_err(|e| RenderError::Pdf(format!("SVG to PDF conversion failed: {e}")))
}

/// usvg options for the svg2pdf pipeline with system fonts loaded and
/// generic families mapped to whatever is actually installed.
pub(crate) fn svg2pdf_options() -> svg2pdf::usvg::Options<'static> {
    let mut fontdb = svg2pdf::usvg::fontdb::Database::new();
    fontdb.load_system_fonts();
    configure_font_fallbacks_svg2pdf(&mut fontdb);

    svg2pdf::usvg::Options {
        fontdb: std::sync::Arc::new(fontdb),
        ..Default::default()
    }
}

// The generic `sans-serif`/`monospace` families the renderers emit must
// resolve even on systems without the usual aliases; pick the closest
// installed face by name.
fn configure_font_fallbacks(fontdb: &mut usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") {
                sans_family = Some(family.clone());
            }
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_sans_serif_family(family);
        fontdb.set_serif_family(family);
    }
    if let Some(family) = mono_family
        .as_deref()
        .or(sans_family.as_deref())
        .or(first_family.as_deref())
    {
        fontdb.set_monospace_family(family);
    }
}

// Same fallback pass for svg2pdf's bundled usvg, which is a distinct type.
fn configure_font_fallbacks_svg2pdf(fontdb: &mut svg2pdf::usvg::fontdb::Database) {
    let mut sans_family: Option<String> = None;
    let mut mono_family: Option<String> = None;
    let mut first_family: Option<String> = None;

    for face in fontdb.faces() {
        for (family, _) in &face.families {
            if first_family.is_none() {
                first_family = Some(family.clone());
            }
            let lower = family.to_ascii_lowercase();
            if sans_family.is_none() && lower.contains("sans") {
                sans_family = Some(family.clone());
            }
            if mono_family.is_none() && (lower.contains("mono") || lower.contains("code")) {
                mono_family = Some(family.clone());
            }
        }
    }

    if let Some(family) = sans_family.as_deref().or(first_family.as_deref()) {
        fontdb.set_sans_serif_family(family);
        fontdb.set_serif_family(family);
    }
    if let Some(family) = mono_family
        .as_deref()
        .or(sans_family.as_deref())
        .or(first_family.as_deref())
    {
        fontdb.set_monospace_family(family);
    }
}

#[cfg(test)]
mod tests {
    use super::svg_to_png;
    use crate::error::RenderError;

    const MINIMAL_SVG: &str = concat!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="40" height="20" viewBox="0 0 40 20">"#,
        r##"<rect width="100%" height="100%" fill="#ffffff" /></svg>"##
    );

    #[test]
    fn scale_multiplies_pixel_dimensions() {
        let (_, w, h) = svg_to_png(MINIMAL_SVG, 2.0).unwrap();
        assert_eq!((w, h), (80, 40));
    }

    #[test]
    fn rejects_non_positive_scale() {
        assert!(matches!(
            svg_to_png(MINIMAL_SVG, 0.0),
            Err(RenderError::Svg(_))
        ));
        assert!(matches!(
            svg_to_png(MINIMAL_SVG, f32::NAN),
            Err(RenderError::Svg(_))
        ));
    }

    #[test]
    fn malformed_svg_is_reported() {
        assert!(matches!(
            svg_to_png("<svg", 1.0),
            Err(RenderError::Svg(_))
        ));
    }
}
