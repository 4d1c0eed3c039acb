use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One extracted PDF page, before chunking. `page` is 1-indexed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub text: String,
    pub source: String,
    pub page: u32,
}

/// A page is treated as a table of contents when more than 30% of its
/// non-empty lines end in a bare page number after a ". " separator
/// (dotted-leader lines).
pub fn is_table_of_contents_page(text: &str) -> bool {
    let mut leader_lines = 0usize;
    let mut total_lines = 0usize;
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        total_lines += 1;
        if let Some((_, tail)) = line.rsplit_once(". ") {
            let tail = tail.trim();
            if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
                leader_lines += 1;
            }
        }
    }
    total_lines > 0 && (leader_lines as f32 / total_lines as f32) > 0.3
}

pub fn load_parsed_pages(path: &Path) -> Result<Vec<PageRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading parsed pages from {}", path.display()))?;
    let pages: Vec<PageRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing page records from {}", path.display()))?;
    Ok(pages)
}

pub fn save_parsed_pages(path: &Path, pages: &[PageRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(pages)?;
    fs::write(path, json).with_context(|| format!("writing parsed pages to {}", path.display()))?;
    Ok(())
}
