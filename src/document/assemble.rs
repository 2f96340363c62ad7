use std::path::Path;

use syntect::highlighting::{Theme as HighlightTheme, ThemeSet};
use syntect::parsing::SyntaxSet;

use super::layout::Paginator;
use super::pdf;
use super::spec::DocumentSpec;
use crate::error::{RenderError, Result};
use crate::fonts::{CosmicTextMeasure, TextMeasure};
use crate::style::StyleSheet;

/// Turns a [`DocumentSpec`] into a single paginated PDF artifact.
///
/// The assembler owns only immutable resources (font system, syntax
/// definitions); each `render` call is an independent transformation of
/// its inputs. Two renders racing on the same output path are resolved by
/// the filesystem: last writer wins.
pub struct DocumentAssembler<M: TextMeasure = CosmicTextMeasure> {
    measure: M,
    syntaxes: SyntaxSet,
    highlight_themes: ThemeSet,
}

impl DocumentAssembler<CosmicTextMeasure> {
    pub fn new() -> Self {
        Self::with_measure(CosmicTextMeasure::new())
    }
}

impl Default for DocumentAssembler<CosmicTextMeasure> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: TextMeasure> DocumentAssembler<M> {
    /// Build an assembler around a custom metrics provider.
    pub fn with_measure(measure: M) -> Self {
        Self {
            measure,
            syntaxes: SyntaxSet::load_defaults_newlines(),
            highlight_themes: ThemeSet::load_defaults(),
        }
    }

    fn highlight_theme(&self, style: &StyleSheet) -> &HighlightTheme {
        self.highlight_themes
            .themes
            .get(&style.code.highlight_theme)
            .unwrap_or_else(|| {
                self.highlight_themes
                    .themes
                    .values()
                    .next()
                    .expect("syntect default theme set is never empty")
            })
    }

    /// Lay the content blocks out onto pages; one SVG document per page.
    pub fn paginate(&self, spec: &DocumentSpec, style: &StyleSheet) -> Result<Vec<String>> {
        if spec.blocks.is_empty() {
            return Err(RenderError::EmptyDocument);
        }

        Paginator::new(
            &self.measure,
            &self.syntaxes,
            self.highlight_theme(style),
            style,
            spec,
        )?
        .run(spec)
    }

    /// Render the full document to PDF bytes in memory.
    pub fn render(&self, spec: &DocumentSpec, style: &StyleSheet) -> Result<Vec<u8>> {
        let pages = self.paginate(spec, style)?;
        let (width, height) = spec.page.dimensions();
        pdf::assemble(&pages, width, height)
    }

    /// Render and persist. The document is built entirely in memory first
    /// and written with a single call, so a failed render leaves no
    /// artifact behind.
    pub fn render_to_file(
        &self,
        spec: &DocumentSpec,
        style: &StyleSheet,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.render(spec, style)?;
        std::fs::write(path, bytes).map_err(|source| RenderError::DocumentBuild {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::DocumentAssembler;
    use crate::document::spec::{Align, ContentBlock, DocumentSpec, PageSetup};
    use crate::error::RenderError;
    use crate::fonts::ApproxTextMeasure;
    use crate::style::StyleSheet;

    fn assembler() -> DocumentAssembler<ApproxTextMeasure> {
        DocumentAssembler::with_measure(ApproxTextMeasure)
    }

    fn paragraph(text: &str) -> ContentBlock {
        ContentBlock::Paragraph {
            text: text.to_string(),
            align: Align::Left,
        }
    }

    fn doc(blocks: Vec<ContentBlock>) -> DocumentSpec {
        DocumentSpec {
            page: PageSetup::default(),
            blocks,
        }
    }

    #[test]
    fn empty_document_is_rejected_before_any_output() {
        let spec = doc(vec![]);
        match assembler().render(&spec, &StyleSheet::default()) {
            Err(RenderError::EmptyDocument) => {}
            other => panic!("expected EmptyDocument, got {other:?}"),
        }
    }

    #[test]
    fn empty_document_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("out.pdf");
        let spec = doc(vec![]);

        let result = assembler().render_to_file(&spec, &StyleSheet::default(), &target);
        assert!(matches!(result, Err(RenderError::EmptyDocument)));
        assert!(!target.exists());
    }

    #[test]
    fn unwritable_path_is_a_document_build_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("missing").join("out.pdf");
        let spec = doc(vec![paragraph("content")]);

        match assembler().render_to_file(&spec, &StyleSheet::default(), &target) {
            Err(RenderError::DocumentBuild { path, .. }) => assert_eq!(path, target),
            other => panic!("expected DocumentBuild, got {other:?}"),
        }
    }

    #[test]
    fn single_block_fits_on_one_page() {
        let pages = assembler()
            .paginate(&doc(vec![paragraph("hello world")]), &StyleSheet::default())
            .unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("hello"));
    }

    #[test]
    fn overflowing_content_starts_new_pages_automatically() {
        let blocks: Vec<_> = (0..120)
            .map(|i| paragraph(&format!("paragraph number {i} with some running text")))
            .collect();
        let pages = assembler()
            .paginate(&doc(blocks), &StyleSheet::default())
            .unwrap();
        assert!(pages.len() > 1, "120 paragraphs cannot fit one A4 page");
    }

    #[test]
    fn explicit_page_break_forces_a_new_page() {
        let pages = assembler()
            .paginate(
                &doc(vec![
                    paragraph("first"),
                    ContentBlock::PageBreak,
                    paragraph("second"),
                ]),
                &StyleSheet::default(),
            )
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("first"));
        assert!(!pages[0].contains("second"));
        assert!(pages[1].contains("second"));
    }

    #[test]
    fn consecutive_page_breaks_collapse_to_one_turn() {
        let pages = assembler()
            .paginate(
                &doc(vec![
                    paragraph("first"),
                    ContentBlock::PageBreak,
                    ContentBlock::PageBreak,
                    paragraph("second"),
                ]),
                &StyleSheet::default(),
            )
            .unwrap();

        assert_eq!(pages.len(), 2, "double break must not insert a blank page");
        assert!(pages[1].contains("second"));
    }

    #[test]
    fn leading_double_break_yields_exactly_one_blank_page() {
        let pages = assembler()
            .paginate(
                &doc(vec![
                    ContentBlock::PageBreak,
                    ContentBlock::PageBreak,
                    paragraph("content"),
                ]),
                &StyleSheet::default(),
            )
            .unwrap();

        assert_eq!(pages.len(), 2);
        assert!(!pages[0].contains("<text"), "first page must be blank");
        assert!(pages[1].contains("content"));
    }

    #[test]
    fn title_and_table_read_in_declaration_order() {
        let spec = doc(vec![
            ContentBlock::Heading {
                text: "Title".to_string(),
                level: 1,
                align: Align::Left,
            },
            ContentBlock::Table {
                rows: vec![
                    vec!["A".to_string(), "B".to_string()],
                    vec!["1".to_string(), "2".to_string()],
                ],
                widths: vec![],
            },
            ContentBlock::PageBreak,
        ]);

        let pages = assembler().paginate(&spec, &StyleSheet::default()).unwrap();
        assert_eq!(pages.len(), 2, "trailing break adds a blank page");

        let first = &pages[0];
        let positions: Vec<usize> = [">Title<", ">A<", ">B<", ">1<", ">2<"]
            .iter()
            .map(|needle| {
                first
                    .find(*needle)
                    .unwrap_or_else(|| panic!("page one must contain {needle}"))
            })
            .collect();
        assert!(
            positions.windows(2).all(|w| w[0] < w[1]),
            "reading order must match declaration order"
        );
    }

    #[test]
    fn pagination_is_deterministic() {
        let spec = doc(vec![
            ContentBlock::Heading {
                text: "Report".to_string(),
                level: 2,
                align: Align::Center,
            },
            paragraph("body text with **bold** and `code` runs"),
        ]);
        let style = StyleSheet::default();
        let a = assembler().paginate(&spec, &style).unwrap();
        let b = assembler().paginate(&spec, &style).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn render_produces_pdf_bytes() {
        let spec = doc(vec![paragraph("smoke test")]);
        let bytes = assembler().render(&spec, &StyleSheet::default()).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
    }

    #[test]
    fn identical_specs_render_identical_artifacts() {
        let spec = doc(vec![
            paragraph("stable output"),
            ContentBlock::PageBreak,
            paragraph("across calls"),
        ]);
        let style = StyleSheet::default();

        let dir = tempfile::tempdir().unwrap();
        let first_path = dir.path().join("a.pdf");
        let second_path = dir.path().join("b.pdf");
        let a = assembler();
        a.render_to_file(&spec, &style, &first_path).unwrap();
        a.render_to_file(&spec, &style, &second_path).unwrap();

        let first = std::fs::read(&first_path).unwrap();
        let second = std::fs::read(&second_path).unwrap();
        assert_eq!(first, second);
    }
}
