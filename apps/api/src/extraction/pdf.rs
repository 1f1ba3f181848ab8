//! Raw text out of an uploaded PDF.
//!
//! The upload is spooled to a named temporary file that is removed when it drops,
//! whether parsing succeeds, fails or panics.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to spool upload: {0}")]
    Spool(#[from] std::io::Error),

    #[error("could not read PDF: {0}")]
    Unreadable(String),

    #[error("PDF contains no extractable text")]
    NoText,

    #[error("PDF text extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// True when `filename` has a `.pdf` extension (any case).
pub fn is_pdf_filename(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
}

pub async fn extract_pdf_text(data: Bytes) -> Result<String, DocumentError> {
    let task = tokio::task::spawn_blocking(move || extract_blocking(&data));

    let text = tokio::time::timeout(EXTRACTION_TIMEOUT, task)
        .await
        .map_err(|_| DocumentError::Timeout(EXTRACTION_TIMEOUT))?
        .map_err(|e| DocumentError::Unreadable(format!("PDF parser crashed: {e}")))??;

    if text.trim().is_empty() {
        return Err(DocumentError::NoText);
    }
    Ok(text)
}

fn extract_blocking(data: &[u8]) -> Result<String, DocumentError> {
    let mut temp_file = tempfile::Builder::new()
        .prefix("resume-")
        .suffix(".pdf")
        .tempfile()?;
    temp_file.write_all(data)?;
    temp_file.flush()?;

    pdf_extract::extract_text(temp_file.path()).map_err(|e| DocumentError::Unreadable(e.to_string()))
}

/// Small generated PDFs for tests.
#[cfg(test)]
pub mod fixtures {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// One-page PDF with each of `lines` drawn in Courier. No lines means no text.
    pub fn pdf_with_lines(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        });

        let mut operations = Vec::new();
        if !lines.is_empty() {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
            operations.push(Operation::new("TL", vec![16.into()]));
            operations.push(Operation::new("Td", vec![72.into(), 720.into()]));
            for line in lines {
                operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }
}
