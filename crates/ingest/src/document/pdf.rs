use lopdf::Document;

use super::{ExtractionError, PageContent};

/// Extract text page by page.
///
/// A page whose content cannot be decoded contributes an empty string so one
/// damaged page never loses the rest of the document.
pub fn extract_pdf(bytes: &[u8]) -> Result<Vec<PageContent>, ExtractionError> {
    let doc = Document::load_mem(bytes).map_err(|e| ExtractionError::PdfError(e.to_string()))?;

    let pages = doc.get_pages();
    tracing::info!("PDF has {} pages", pages.len());

    let mut out = Vec::with_capacity(pages.len());
    for (i, page_number) in pages.keys().enumerate() {
        let text = match doc.extract_text(&[*page_number]) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(page = page_number, error = %e, "page text extraction failed, using empty text");
                String::new()
            }
        };
        tracing::debug!("Extracted {} characters from page {}", text.chars().count(), i + 1);
        out.push(PageContent {
            page_number: i + 1,
            text,
        });
    }

    Ok(out)
}
