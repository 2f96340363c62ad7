//! Multi-page PDF assembly: every paginated SVG becomes a form XObject
//! (via svg2pdf) placed on its own page of a single pdf-writer document.

use std::collections::HashMap;

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref};

use crate::error::{RenderError, Result};
use crate::raster;

const PAGE_XOBJECT: Name<'static> = Name(b"P0");

pub(crate) fn assemble(pages: &[String], page_width: f32, page_height: f32) -> Result<Vec<u8>> {
    let opts = raster::svg2pdf_options();

    let mut alloc = Ref::new(1);
    let catalog_id = alloc.bump();
    let tree_id = alloc.bump();

    let mut pdf = Pdf::new();
    let mut page_ids = Vec::with_capacity(pages.len());

    for svg in pages {
        let tree = svg2pdf::usvg::Tree::from_str(svg, &opts)
            .map_err(|e| RenderError::Svg(format!("failed to parse page SVG: {e}")))?;
        let conversion = svg2pdf::ConversionOptions {
            embed_text: false,
            ..Default::default()
        };
        let (chunk, chunk_root) = svg2pdf::to_chunk(&tree, conversion)
            .map_err(|e| RenderError::Pdf(format!("page conversion failed: {e}")))?;

        // Renumber the chunk's object ids into this document's sequence.
        let mut id_map = HashMap::new();
        let chunk = chunk.renumber(|old| *id_map.entry(old).or_insert_with(|| alloc.bump()));
        let xobject_id = id_map[&chunk_root];
        pdf.extend(&chunk);

        let content_id = alloc.bump();
        let page_id = alloc.bump();

        // The XObject is normalized to the unit square; scale it to cover
        // the page.
        let mut content = Content::new();
        content.save_state();
        content.transform([page_width, 0.0, 0.0, page_height, 0.0, 0.0]);
        content.x_object(PAGE_XOBJECT);
        content.restore_state();
        pdf.stream(content_id, &content.finish());

        let mut page = pdf.page(page_id);
        page.media_box(Rect::new(0.0, 0.0, page_width, page_height));
        page.parent(tree_id);
        page.contents(content_id);
        page.resources().x_objects().pair(PAGE_XOBJECT, xobject_id);
        page.finish();
        page_ids.push(page_id);
    }

    pdf.catalog(catalog_id).pages(tree_id);
    pdf.pages(tree_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    Ok(pdf.finish())
}
