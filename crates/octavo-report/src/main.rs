//! Corpus citation report tool.
//!
//! Reads a JSON corpus manifest describing document order, per-document
//! listings and citation occurrences, and bibliography files; runs the full
//! load, register, resolve, cross-reference pipeline; and prints the
//! resolved listings, rendered sample references, and collected diagnostics.

use anyhow::{Context, Result};
use clap::Parser;
use octavo_bibdata::BibDatabase;
use octavo_cite::{
    CiteConfig, CitationRegistry, HyperlinkBuilder, ListKind, StyleRegistry, render_inlines,
    resolve_citations, resolve_reference,
};
use octavo_diagnostics::{DiagnosticSink, Location, MemorySink, Severity};
use octavo_filter::parse_filter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "octavo-report")]
#[command(about = "Resolve a corpus manifest and report its citations")]
struct Args {
    /// Path to the corpus manifest (JSON)
    #[arg(value_name = "MANIFEST")]
    manifest: PathBuf,

    /// Exit nonzero when any warning is reported
    #[arg(long)]
    strict: bool,
}

/// The corpus manifest. Documents appear in reading order.
#[derive(Debug, Deserialize)]
struct Manifest {
    bib_files: Vec<PathBuf>,
    #[serde(default = "default_style")]
    default_style: String,
    documents: Vec<DocumentSpec>,
}

fn default_style() -> String {
    "alpha".to_string()
}

#[derive(Debug, Deserialize)]
struct DocumentSpec {
    id: String,
    #[serde(default)]
    listings: Vec<ListingSpec>,
    #[serde(default)]
    citations: Vec<CitationSpec>,
    /// Cross-reference targets to render for this document, each a
    /// comma-separated key list.
    #[serde(default)]
    references: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ListingSpec {
    #[serde(default = "default_line")]
    line: usize,
    filter: Option<String>,
    style: Option<String>,
    list_kind: Option<ListKind>,
    #[serde(default)]
    label_prefix: String,
    #[serde(default)]
    key_prefix: String,
}

#[derive(Debug, Deserialize)]
struct CitationSpec {
    #[serde(default = "default_line")]
    line: usize,
    keys: Vec<String>,
}

fn default_line() -> usize {
    1
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "octavo=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let warnings = run(&args)?;
    if args.strict && warnings > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn run(args: &Args) -> Result<usize> {
    let content = fs::read_to_string(&args.manifest)
        .context(format!("failed to read manifest {:?}", args.manifest))?;
    let manifest: Manifest =
        serde_json::from_str(&content).context("failed to parse corpus manifest")?;
    let base_dir = args.manifest.parent().unwrap_or(Path::new("."));

    let styles = Arc::new(StyleRegistry::builtin());
    let bib_sources: Vec<PathBuf> = manifest
        .bib_files
        .iter()
        .map(|path| base_dir.join(path))
        .collect();
    let config = CiteConfig::new(bib_sources, manifest.default_style.clone());
    config
        .check(&styles)
        .map_err(|err| anyhow::anyhow!(err.to_diagnostic().to_string()))?;

    let mut db = BibDatabase::new();
    db.load_all(&config.bib_sources)
        .context("failed to load bibliography files")?;

    let sink = MemorySink::new();
    let mut registry = CitationRegistry::new(styles);
    for document in &manifest.documents {
        for spec in &document.listings {
            let mut listing = config.listing(&document.id, spec.line);
            if let Some(style) = &spec.style {
                listing.style = style.clone();
            }
            if let Some(kind) = spec.list_kind {
                listing.list_kind = kind;
            }
            listing.label_prefix = spec.label_prefix.clone();
            listing.key_prefix = spec.key_prefix.clone();
            if let Some(source) = &spec.filter {
                match parse_filter(source) {
                    Ok(program) => listing.filter = program,
                    Err(err) => {
                        // recoverable: fall back to the default selection
                        let mut diagnostic = err.to_diagnostic();
                        diagnostic.severity = Severity::Warning;
                        sink.report(diagnostic.at(Location::new(&document.id, spec.line)));
                    }
                }
            }
            registry
                .register_listing(listing)
                .map_err(|err| anyhow::anyhow!(err.to_diagnostic().to_string()))?;
        }
        for citation in &document.citations {
            registry
                .register_citation_ref(&document.id, citation.line, citation.keys.clone())
                .map_err(|err| anyhow::anyhow!(err.to_diagnostic().to_string()))?;
        }
    }

    let reading_order: Vec<String> = manifest
        .documents
        .iter()
        .map(|document| document.id.clone())
        .collect();
    resolve_citations(&mut registry, &db, &reading_order, &sink)
        .map_err(|err| anyhow::anyhow!(err.to_diagnostic().to_string()))?;

    report_listings(&registry);
    report_references(&registry, &manifest, &sink)?;

    let diagnostics = sink.reported();
    if !diagnostics.is_empty() {
        println!("\ndiagnostics:");
        for diagnostic in &diagnostics {
            println!("  {diagnostic}");
        }
    }
    let warnings = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Warning)
        .count();
    println!(
        "\n{} citations, {} warnings",
        registry.citations().len(),
        warnings
    );
    Ok(warnings)
}

fn report_listings(registry: &CitationRegistry) {
    for (listing_id, listing) in registry.listings() {
        println!(
            "listing {listing_id} ({}:{}, style {}, {})",
            listing.document, listing.line, listing.style, listing.list_kind
        );
        for citation in registry
            .citations()
            .iter()
            .filter(|citation| citation.listing_id == *listing_id)
        {
            let anchor = citation.citation_id.as_deref().unwrap_or("-");
            println!("  [{}] {} -> {}", citation.label, citation.full_key, anchor);
        }
    }
}

fn report_references(
    registry: &CitationRegistry,
    manifest: &Manifest,
    sink: &MemorySink,
) -> Result<()> {
    let builder = HyperlinkBuilder;
    for document in &manifest.documents {
        for target in &document.references {
            let rendered = resolve_reference(registry, &builder, &document.id, target, sink)
                .map_err(|err| anyhow::anyhow!(err.to_diagnostic().to_string()))?;
            println!("{}: {} => {}", document.id, target, render_inlines(&rendered));
        }
    }
    Ok(())
}
