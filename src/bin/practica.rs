//! Command-line entry point.
//!
//! One-shot batch invocation: optionally refresh the knowledge base, then
//! scan the repository, match rules, and print a report. Ingestion outcomes
//! never affect scan-and-match — a refresh where every source fails still
//! produces recommendations.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use practica::{
    match_rules, refresh, render, scan_repo, AdvisorResult, HttpClient, KbConfig, KnowledgeBase,
    Settings, Tone,
};

/// How many KB items the JSON report includes.
const JSON_INTEL_LIMIT: usize = 15;
/// How many KB items the text report includes.
const TEXT_INTEL_LIMIT: usize = 10;

#[derive(Debug, Parser)]
#[command(name = "practica", version, about = "Repo scan + best-practice suggestions")]
struct Cli {
    /// Refresh the knowledge base from configured sources before reporting.
    #[arg(long)]
    refresh: bool,

    /// Path to the repository to scan.
    #[arg(long, default_value = ".")]
    repo: PathBuf,

    /// Presentation tone: concise, friendly, formal or teaching.
    #[arg(long, default_value = "friendly", value_parser = parse_tone)]
    tone: Tone,

    /// Emit the full report as JSON.
    #[arg(long)]
    json: bool,

    /// Knowledge-base directory.
    #[arg(long, default_value = "practica.kb")]
    kb: PathBuf,

    /// Settings file (JSON); built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Verbose logging.
    #[arg(long, short)]
    verbose: bool,
}

fn parse_tone(s: &str) -> Result<Tone, String> {
    s.parse()
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("practica=debug")
    } else {
        EnvFilter::new("practica=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> AdvisorResult<()> {
    let settings = match &cli.config {
        Some(path) => Settings::from_path(path)?,
        None => Settings::builtin(),
    };

    let kb = KnowledgeBase::open(&cli.kb, KbConfig::default())?;

    if cli.refresh {
        let client = HttpClient::new()?;
        refresh(&kb, &settings.sources, &client)?;
    }

    let facts = scan_repo(&cli.repo);
    let suggestions = match_rules(&settings.rules, &facts);

    if cli.json {
        let report = serde_json::json!({
            "facts": facts,
            "suggestions": suggestions,
            "kb_latest": kb.latest_items(JSON_INTEL_LIMIT),
        });
        // Pretty JSON is part of the report contract, not a debug aid.
        println!(
            "{}",
            serde_json::to_string_pretty(&report)
                .map_err(|e| practica::AdvisorError::config(e.to_string()))?
        );
        return Ok(());
    }

    print_text_report(&kb, &facts, &suggestions, cli.tone);
    Ok(())
}

fn print_text_report(
    kb: &KnowledgeBase,
    facts: &practica::FactSet,
    suggestions: &[practica::MatchResult],
    tone: Tone,
) {
    println!("=== Repo facts ===");
    let languages: Vec<String> = facts.languages().into_iter().collect();
    if languages.is_empty() {
        println!("Languages: (none)");
    } else {
        println!("Languages: {}", languages.join(", "));
    }
    let flag = |name: &str| {
        facts
            .get(name)
            .and_then(practica::FactValue::as_bool)
            .unwrap_or(false)
    };
    println!("Ruff: {}  ESLint: {}", flag("has_ruff"), flag("has_eslint"));

    println!("\n=== Suggestions ===");
    if suggestions.is_empty() {
        println!("No suggestions 🎉");
    }
    for suggestion in suggestions {
        println!("- [{}] {}", suggestion.severity, render(suggestion, tone));
        for source in &suggestion.sources {
            println!("    • {source}");
        }
    }

    println!("\n=== Latest intel (KB) ===");
    for item in kb.latest_items(TEXT_INTEL_LIMIT) {
        println!("• {} — {}", item.title, item.url);
    }
}
