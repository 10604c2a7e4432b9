//! Print Reading Order
//!
//! Prints the paragraphs detected on each page of a JSON fragment dump.
//!
//! Usage:
//!   cargo run --release --bin reading_order -- pages.json
//!   cargo run --release --bin reading_order -- pages.json --strategy line --page 3
//!   cargo run --release --bin reading_order -- pages.json --config session.json --verbose

use pdf_narrator::config::{ParagraphStrategy, SessionConfig};
use pdf_narrator::document::{DocumentRecord, InMemoryDocument, TextSource};
use pdf_narrator::layout::{create_builder, FurnitureDetector, FurniturePredicate};
use pdf_narrator::DocumentId;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

struct PrintConfig {
    input: Option<PathBuf>,
    config: Option<PathBuf>,
    strategy: Option<ParagraphStrategy>,
    page: Option<u32>,
    verbose: bool,
}

impl PrintConfig {
    fn from_args() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut input = None;
        let mut config = None;
        let mut strategy = None;
        let mut page = None;
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" => {
                    i += 1;
                    if i < args.len() {
                        config = Some(PathBuf::from(&args[i]));
                    }
                },
                "--strategy" => {
                    i += 1;
                    if i < args.len() {
                        strategy = match args[i].as_str() {
                            "line" | "line_level" => Some(ParagraphStrategy::LineLevel),
                            "fragment" | "fragment_level" => Some(ParagraphStrategy::FragmentLevel),
                            other => {
                                eprintln!("Unknown strategy '{}', using the configured one", other);
                                None
                            },
                        };
                    }
                },
                "--page" => {
                    i += 1;
                    if i < args.len() {
                        page = args[i].parse().ok();
                    }
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                other if input.is_none() && !other.starts_with('-') => {
                    input = Some(PathBuf::from(other));
                },
                _ => {},
            }
            i += 1;
        }

        Self {
            input,
            config,
            strategy,
            page,
            verbose,
        }
    }
}

fn main() -> ExitCode {
    let args = PrintConfig::from_args();
    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let Some(input) = args.input.as_ref() else {
        eprintln!("Usage: reading_order <pages.json> [--strategy fragment|line] [--page N]");
        eprintln!("                     [--config session.json] [--verbose]");
        return ExitCode::FAILURE;
    };

    match run(input, &args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn run(input: &Path, args: &PrintConfig) -> pdf_narrator::Result<()> {
    let start = Instant::now();
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_json_file(path)?,
        None => SessionConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        config.strategy = strategy;
    }

    let bytes = std::fs::read(input)?;
    let document = InMemoryDocument::from_json_str(&String::from_utf8_lossy(&bytes))?;
    let file_name = input
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let record = DocumentRecord::describe(DocumentId::from_bytes(&bytes), &document, &file_name);

    let predicate = FurnitureDetector::new(config.furniture.clone()).detect(&document)?;
    let builder = create_builder(config.strategy, &config.layout);

    println!("{} ({} pages)", record.title, record.page_count);
    println!("id: {}", record.id);
    match predicate {
        FurniturePredicate::AcceptAll => println!("furniture: none detected"),
        _ => println!("furniture: {:?}", predicate),
    }
    println!("strategy: {}", builder.name());

    let pages = match args.page {
        Some(page) => page..=page,
        None => 1..=document.page_count(),
    };
    let mut total = 0;
    for page in pages {
        let text = document.page_text(page)?;
        let paragraphs = builder.build(&text.fragments, &predicate);
        println!();
        println!("=== Page {} ({} paragraphs) ===", page, paragraphs.len());
        for (index, paragraph) in paragraphs.iter().enumerate() {
            println!("[{}] {}", index, paragraph.full_text());
        }
        total += paragraphs.len();
    }

    println!();
    println!("{} paragraphs in {:.1}ms", total, start.elapsed().as_secs_f64() * 1000.0);
    Ok(())
}
