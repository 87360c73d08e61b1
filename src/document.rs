//! The intermediate paragraph document.
//!
//! Extraction accumulates one [`DocElement::Text`] per successful page (plus
//! optional page-break elements) into a [`PageDocument`], which serialises to
//! a `.docx` file. The reformat stage reads the paragraph texts back with
//! [`read_paragraph_texts`] rather than keeping the document in memory, so
//! the two stages can run in separate processes.

use std::fs::File;
use std::path::Path;

use docx_rs::{read_docx, BreakType, Docx, DocumentChild, Paragraph, Run};
use tracing::debug;

use crate::error::Pdf2TexError;

/// One element of the intermediate document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocElement {
    /// A paragraph of recognised text.
    Text(String),
    /// A page break. Reads back as an empty paragraph.
    PageBreak,
}

/// An ordered sequence of paragraphs, one per successfully recognised page.
///
/// Element order equals page order. Failed pages contribute nothing, so a
/// document holds at most as many text elements as the source PDF has pages.
#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    elements: Vec<DocElement>,
}

impl PageDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a paragraph of text.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.elements.push(DocElement::Text(text.into()));
    }

    /// Append a page break.
    pub fn push_page_break(&mut self) {
        self.elements.push(DocElement::PageBreak);
    }

    /// All elements in insertion order.
    pub fn elements(&self) -> &[DocElement] {
        &self.elements
    }

    /// Number of text paragraphs (page breaks excluded).
    pub fn text_count(&self) -> usize {
        self.elements
            .iter()
            .filter(|e| matches!(e, DocElement::Text(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Serialise the document to a `.docx` file at `path`.
    ///
    /// Each text element becomes one docx paragraph; each break element
    /// becomes a paragraph holding a single page-break run.
    pub fn write_docx(&self, path: impl AsRef<Path>) -> Result<(), Pdf2TexError> {
        let path = path.as_ref();
        let mut docx = Docx::new();

        for element in &self.elements {
            docx = match element {
                DocElement::Text(text) => {
                    docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(text)))
                }
                DocElement::PageBreak => docx.add_paragraph(
                    Paragraph::new().add_run(Run::new().add_break(BreakType::Page)),
                ),
            };
        }

        let file = File::create(path).map_err(|e| Pdf2TexError::DocumentWriteFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        docx.build()
            .pack(file)
            .map_err(|e| Pdf2TexError::DocumentWriteFailed {
                path: path.to_path_buf(),
                detail: e.to_string(),
            })?;

        debug!("Wrote document: {} ({} elements)", path.display(), self.elements.len());
        Ok(())
    }
}

/// Read every paragraph's text from a `.docx` file, in document order.
///
/// Texts are trimmed; page-break paragraphs read back as empty strings and
/// are kept, matching what the reformatter expects to join.
pub fn read_paragraph_texts(path: impl AsRef<Path>) -> Result<Vec<String>, Pdf2TexError> {
    let path = path.as_ref();
    let buf = std::fs::read(path).map_err(|e| Pdf2TexError::DocumentReadFailed {
        path: path.to_path_buf(),
        detail: e.to_string(),
    })?;
    let docx = read_docx(&buf).map_err(|e| Pdf2TexError::DocumentReadFailed {
        path: path.to_path_buf(),
        detail: format!("{:?}", e),
    })?;

    let texts: Vec<String> = docx
        .document
        .children
        .iter()
        .filter_map(|child| match child {
            DocumentChild::Paragraph(p) => Some(p.raw_text().trim().to_string()),
            _ => None,
        })
        .collect();

    debug!("Read {} paragraphs from {}", texts.len(), path.display());
    Ok(texts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_count_ignores_breaks() {
        let mut doc = PageDocument::new();
        doc.push_text("page one");
        doc.push_page_break();
        doc.push_text("page two");
        assert_eq!(doc.text_count(), 2);
        assert_eq!(doc.elements().len(), 3);
    }

    #[test]
    fn round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.docx");

        let mut doc = PageDocument::new();
        doc.push_text("alpha");
        doc.push_text("beta");
        doc.push_page_break();
        doc.push_text("gamma");
        doc.write_docx(&path).unwrap();

        let texts = read_paragraph_texts(&path).unwrap();
        assert_eq!(texts, vec!["alpha", "beta", "", "gamma"]);
    }

    #[test]
    fn empty_document_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.docx");

        PageDocument::new().write_docx(&path).unwrap();
        let texts = read_paragraph_texts(&path).unwrap();
        assert!(texts.is_empty());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = read_paragraph_texts("no-such-file.docx").unwrap_err();
        assert!(matches!(err, Pdf2TexError::DocumentReadFailed { .. }));
    }
}
