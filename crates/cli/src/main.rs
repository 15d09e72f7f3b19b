//! Classplit CLI: split service classes out of a monolithic C++ source.
//!
//! Calls `classplit-core` directly. Logs go to stderr, results to stdout.

use clap::{Parser, Subcommand};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::debug;

use classplit_core::dedupe::{dedupe_file, DedupeOutcome};
use classplit_core::locate::locate;
use classplit_core::raw_strings::{convert_files, FileConversion};
use classplit_core::types::*;
use classplit_core::{load_config, run, RunOptions, SplitConfig};

/// Classplit: move classes out of one big translation unit into their own files.
#[derive(Parser)]
#[command(name = "classplit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON instead of human-readable text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract the configured classes and splice the include block
    Extract {
        /// Project root holding .classplit.toml (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Source file, overriding the configured one
        #[arg(long)]
        source: Option<PathBuf>,

        /// Report what would happen without writing anything
        #[arg(long)]
        dry_run: bool,

        /// Also write <Class>.h declaration headers
        #[arg(long)]
        headers: bool,
    },
    /// Show where a class starts and ends
    Locate {
        /// Class name
        class: String,

        /// Hinted start line (1-indexed)
        #[arg(long)]
        start: usize,

        /// Hinted end line (1-indexed, default: start)
        #[arg(long)]
        end: Option<usize>,

        /// Project root holding .classplit.toml (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,

        /// Source file, overriding the configured one
        #[arg(long)]
        source: Option<PathBuf>,
    },
    /// Remove a duplicated include block
    Dedupe {
        /// File to clean up
        file: PathBuf,

        /// Text identifying the block (default: the configured include banner)
        #[arg(long)]
        marker: Option<String>,

        /// Project root holding .classplit.toml (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Rewrite raw string literals as plain quoted literals
    RawStrings {
        /// Files to convert (default: raw_string_files from config)
        files: Vec<PathBuf>,

        /// Project root holding .classplit.toml (default: current directory)
        #[arg(long)]
        root: Option<PathBuf>,
    },
}

fn fail(message: impl Display) -> ! {
    eprintln!("{message}");
    std::process::exit(1);
}

fn resolve_root(root: Option<PathBuf>) -> PathBuf {
    let root = match root {
        Some(r) => r,
        None => std::env::current_dir()
            .unwrap_or_else(|e| fail(format!("Could not determine current directory: {e}"))),
    };
    root.canonicalize().unwrap_or_else(|e| fail(format!("Path not found: {}: {e}", root.display())))
}

fn load(root: Option<PathBuf>, source: Option<PathBuf>) -> SplitConfig {
    let root = resolve_root(root);
    let mut config = load_config(&root).unwrap_or_else(|e| fail(e));
    if let Some(source) = source {
        config.source = source;
    }
    debug!(root = %config.root.display(), source = %config.source.display(), "Loaded config");
    config
}

fn print_json<T: serde::Serialize>(value: &T) {
    println!("{}", serde_json::to_string_pretty(value).unwrap());
}

fn describe(outcome: &ClassOutcome) -> &'static str {
    match outcome {
        ClassOutcome::Extracted { .. } => "extracted",
        ClassOutcome::BoundaryNotFound => "skipped: declaration not found",
        ClassOutcome::EndNotFound => "skipped: end not found",
    }
}

fn print_report(report: &RunReport) {
    for class in &report.classes {
        match (class.lines, &class.unit) {
            (Some((start, end)), Some(unit)) => {
                println!("{:<28} {:>6}-{:<6} {}", class.name, start, end, unit.display());
            }
            _ => println!("{:<28} {}", class.name, describe(&class.outcome)),
        }
    }
    if let Some(line) = report.include_line {
        println!("\nInclude block at line {line}");
    }
    for header in &report.headers_written {
        println!("Header: {}", header.display());
    }
    eprintln!(
        "\n{} of {} classes extracted, {} -> {} lines ({} removed){}",
        report.extracted_count(),
        report.classes.len(),
        report.original_lines,
        report.final_lines,
        report.reduction,
        if report.dry_run { " [dry run]" } else { "" }
    );
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("classplit=info".parse().unwrap()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Extract { root, source, dry_run, headers } => {
            let config = load(root, source);
            let options = RunOptions { dry_run, emit_headers: headers || config.emit_headers };
            let report = run(&config, options).unwrap_or_else(|e| fail(e));

            if cli.json {
                print_json(&report);
            } else {
                print_report(&report);
            }
        }
        Commands::Locate { class, start, end, root, source } => {
            let config = load(root, source);
            let path = config.source_path();
            let buffer = SourceBuffer::read(&path).unwrap_or_else(|e| fail(e));

            let start = start.max(1);
            let end = end.unwrap_or(start).max(start);
            let request = ExtractionRequest::new(&class, start - 1, end - 1);
            let located = locate(&buffer, &request, &config.base_class);

            if cli.json {
                let output = match located {
                    Ok(range) => serde_json::json!({
                        "class": class,
                        "found": true,
                        "start_line": range.start + 1,
                        "end_line": range.end + 1,
                        "lines": range.line_count(),
                    }),
                    Err(e) => serde_json::json!({
                        "class": class,
                        "found": false,
                        "reason": ClassOutcome::from(e),
                    }),
                };
                print_json(&output);
            } else {
                match located {
                    Ok(range) => println!(
                        "{class}: lines {}-{} ({} lines)",
                        range.start + 1,
                        range.end + 1,
                        range.line_count()
                    ),
                    Err(e) => fail(format!("{class}: {e}")),
                }
            }
        }
        Commands::Dedupe { file, marker, root } => {
            let marker = match marker {
                Some(m) => m,
                None => load(root, None).include_banner,
            };
            let outcome = dedupe_file(&file, &marker).unwrap_or_else(|e| fail(e));

            if cli.json {
                print_json(&outcome);
            } else {
                match outcome {
                    DedupeOutcome::Removed { start, end } => {
                        println!("Removed lines {}-{} from {}", start + 1, end + 1, file.display());
                    }
                    DedupeOutcome::NoDuplicate => println!("No duplicate block in {}", file.display()),
                }
            }
        }
        Commands::RawStrings { files, root } => {
            let root = resolve_root(root);
            let files: Vec<PathBuf> = if files.is_empty() {
                let config = load_config(&root).unwrap_or_else(|e| fail(e));
                config.raw_string_files.iter().map(|f| root.join(f)).collect()
            } else {
                files
            };
            if files.is_empty() {
                fail("No files given and raw_string_files is empty");
            }
            let summary = convert_files(&files).unwrap_or_else(|e| fail(e));

            if cli.json {
                print_json(&summary);
            } else {
                for (path, status) in &summary.files {
                    let status = match status {
                        FileConversion::Converted => "converted",
                        FileConversion::NoConversionNeeded => "no conversion needed",
                        FileConversion::Missing => "missing",
                    };
                    println!("{:<60} {}", display_path(path, &root), status);
                }
                eprintln!("\n{} of {} files converted", summary.converted_count(), summary.files.len());
            }
        }
    }
}

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
