pub mod chunker;
mod pdf;
mod txt;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("PDF extraction failed: {0}")]
    PdfError(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A page of extracted text.
#[derive(Debug, Clone)]
pub struct PageContent {
    /// 1-based page number (for PDFs). For TXT, always 1.
    pub page_number: usize,
    /// The extracted text content. Empty when the page could not be read.
    pub text: String,
}

/// Result of extracting text from a document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Filename the bytes came from.
    pub filename: String,
    /// File type: "pdf" or "txt"
    pub file_type: String,
    /// Extracted pages in document order.
    pub pages: Vec<PageContent>,
}

impl ExtractedDocument {
    /// All page texts, each followed by a newline.
    pub fn full_text(&self) -> String {
        let mut text = String::with_capacity(self.total_chars() + self.pages.len());
        for page in &self.pages {
            text.push_str(&page.text);
            text.push('\n');
        }
        text
    }

    /// Total character count across all pages.
    pub fn total_chars(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// Lower-cased extension of `filename` if it is a format we can read.
pub fn supported_extension(filename: &str) -> Result<String, ExtractionError> {
    match filename.rsplit_once('.') {
        Some((_, ext)) if matches!(ext.to_lowercase().as_str(), "pdf" | "txt") => {
            Ok(ext.to_lowercase())
        }
        _ => Err(ExtractionError::UnsupportedFormat(filename.to_string())),
    }
}

/// Extract text from file bytes based on the filename's extension.
pub fn extract_text(bytes: &[u8], filename: &str) -> Result<ExtractedDocument, ExtractionError> {
    let ext = supported_extension(filename)?;

    let pages = if ext == "pdf" {
        pdf::extract_pdf(bytes)?
    } else {
        txt::extract_txt(bytes)?
    };

    Ok(ExtractedDocument {
        filename: filename.to_string(),
        file_type: ext,
        pages,
    })
}

/// Collapse line breaks into spaces and trim the ends.
pub fn normalize_text(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .trim()
        .to_string()
}
