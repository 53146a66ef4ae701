//! gather-cli: run the research gather pipeline for one ticker.
//!
//! Usage:
//!   gather-cli --ticker CAKE --name "The Cheesecake Factory"
//!   gather-cli --ticker CAKE --sources news,social --json
//!   gather-cli --ticker CAKE --output report.md --dry-run
//!
//! When `--name`/`--theme`/`--directive` are omitted they are taken from the
//! watchlist entry, so a heartbeat only needs the ticker. The combined
//! Markdown goes to stdout by default; `--json` prints the structured
//! outcome instead and `--output` writes the Markdown to a file. The
//! summary line always goes to stderr. Exit code is non-zero when no source
//! produced data.

use gatherers::GatherPipeline;
use research_core::{GatherRequest, Source};
use watchlist_store::WatchlistStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gather_cli=info,gatherers=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(ticker) = flag_value(&args, "--ticker") else {
        usage();
        std::process::exit(2);
    };

    // Fill gaps from the watchlist entry, if one exists
    let store = match flag_value(&args, "--file") {
        Some(path) => WatchlistStore::new(path),
        None => WatchlistStore::new(WatchlistStore::default_path()),
    };
    let entry = store
        .load()
        .ok()
        .and_then(|watchlist| watchlist.find(&ticker).cloned());

    let name = flag_value(&args, "--name")
        .or_else(|| entry.as_ref().map(|e| e.company_name.clone()))
        .unwrap_or_else(|| ticker.clone());
    let theme =
        flag_value(&args, "--theme").or_else(|| entry.as_ref().and_then(|e| e.theme.clone()));
    let directive = flag_value(&args, "--directive")
        .or_else(|| entry.as_ref().and_then(|e| e.directive.clone()));

    let sources = match flag_value(&args, "--sources") {
        Some(list) => parse_sources(&list)?,
        None => Source::ALL.to_vec(),
    };

    let dry_run = args.iter().any(|a| a == "--dry-run");
    let request = GatherRequest::new(&ticker, &name)
        .with_theme(theme)
        .with_directive(directive);

    let pipeline = GatherPipeline::new();
    let outcome = pipeline.run(&request, &sources, dry_run).await;

    // Markdown goes to stdout (or --output); the summary always to stderr
    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else if let Some(path) = flag_value(&args, "--output") {
        if let Some(parent) = std::path::Path::new(&path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, outcome.combined_markdown())?;
        eprintln!("research written to {path}");
    } else {
        println!("{}", outcome.combined_markdown());
    }

    let dry = if outcome.dry_run { " [dry run]" } else { "" };
    eprintln!("gathered{dry}: {}", outcome.summary);
    for stored in &outcome.stored {
        eprintln!("  stored: {}", stored.key);
    }

    if !outcome.success {
        std::process::exit(1);
    }
    Ok(())
}

fn parse_sources(list: &str) -> anyhow::Result<Vec<Source>> {
    let mut sources = Vec::new();
    for name in list.split(',') {
        let source = Source::parse(name)
            .ok_or_else(|| anyhow::anyhow!("unknown source '{}'; valid: news, fundamentals, social, market", name.trim()))?;
        if !sources.contains(&source) {
            sources.push(source);
        }
    }
    Ok(sources)
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn usage() {
    eprintln!("Usage:");
    eprintln!("  gather-cli --ticker T [--name N] [--theme S] [--directive S]");
    eprintln!("             [--sources news,fundamentals,social,market]");
    eprintln!("             [--json] [--output PATH] [--dry-run] [--file WATCHLIST]");
}
