use std::env;
use std::path::PathBuf;

use docqa_core::config::{expand_path, Config};
use docqa_ingest::{extract_pdf_pages, is_table_of_contents_page, save_parsed_pages};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;

    let args: Vec<String> = env::args().skip(1).collect();
    let pdf_dir = args.first().map(PathBuf::from).unwrap_or_else(|| {
        expand_path(config.get::<String>("data.pdf_dir").unwrap_or_else(|_| "data/pdfs".to_string()))
    });
    let out_path = expand_path(
        config
            .get::<String>("data.parsed_pages")
            .unwrap_or_else(|_| "data/parsed_pages.json".to_string()),
    );

    println!("docqa-parse\n===========");
    println!("PDF directory: {}", pdf_dir.display());

    let mut all_pages = Vec::new();
    let mut skipped = 0usize;
    let mut file_count = 0usize;
    for entry in WalkDir::new(&pdf_dir).into_iter().filter_map(|e| e.ok()) {
        let is_pdf = entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            continue;
        }
        let pages = extract_pdf_pages(entry.path())?;
        println!("Processing '{}' ({} non-empty pages)", entry.path().display(), pages.len());
        file_count += 1;
        for page in pages {
            if is_table_of_contents_page(&page.text) {
                tracing::warn!(
                    "page {} of '{}' skipped (looks like a table of contents)",
                    page.page,
                    page.source
                );
                skipped += 1;
                continue;
            }
            all_pages.push(page);
        }
    }

    if file_count == 0 {
        eprintln!("No PDF files found under {}.", pdf_dir.display());
        std::process::exit(1);
    }

    save_parsed_pages(&out_path, &all_pages)?;
    println!(
        "📊 Saved {} pages ({} skipped as ToC) to {}",
        all_pages.len(),
        skipped,
        out_path.display()
    );
    Ok(())
}
