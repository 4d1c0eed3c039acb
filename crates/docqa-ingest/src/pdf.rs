use anyhow::{anyhow, Result};
use std::path::Path;
use std::process::Command;

use docqa_core::error::Error;

use crate::pages::PageRecord;

/// Extract a PDF into per-page records by shelling out to `pdftotext`.
///
/// Pages arrive separated by form feeds. Blank pages are dropped but page
/// numbering stays 1-indexed over the original document, so citations
/// match the printed page.
pub fn extract_pdf_pages(pdf_path: &Path) -> Result<Vec<PageRecord>> {
    let source = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf_path.display().to_string());
    let output = Command::new("pdftotext")
        .arg("-layout")
        .arg(pdf_path)
        .arg("-")
        .output()
        .map_err(|e| anyhow!("failed to run pdftotext (is poppler installed?): {}", e))?;
    if !output.status.success() {
        return Err(Error::Operation(format!(
            "pdftotext failed for {}: {}",
            pdf_path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        ))
        .into());
    }
    let text = String::from_utf8_lossy(&output.stdout);
    let mut pages = Vec::new();
    for (idx, page) in text.split('\u{000C}').enumerate() {
        let trimmed = page.trim();
        if trimmed.is_empty() {
            continue;
        }
        pages.push(PageRecord {
            text: trimmed.to_string(),
            source: source.clone(),
            page: (idx + 1) as u32,
        });
    }
    tracing::info!("extracted {} non-empty pages from {}", pages.len(), source);
    Ok(pages)
}
