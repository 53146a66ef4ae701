//! score-cli: run the two-pass significance scorer over a gathered report.
//!
//! Usage:
//!   score-cli --ticker CAKE --input report.md
//!   gather-cli --ticker CAKE --output /dev/stdout | score-cli --ticker CAKE
//!
//! Models and threshold come from the watchlist global settings; the
//! inference endpoint from INFERENCE_BASE_URL / INFERENCE_API_KEY. A failed
//! inference call exits non-zero with no partial output; the caller skips
//! this ticker until the next heartbeat.

use std::io::Read;

use report_store::{Alert, AlertKind, ChatTemplate};
use research_core::Source;
use significance_scorer::{OpenAiBackend, ScorerConfig, SignificanceScorer};
use watchlist_store::WatchlistStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_cli=info,significance_scorer=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let Some(ticker) = flag_value(&args, "--ticker") else {
        usage();
        std::process::exit(2);
    };

    let report = match flag_value(&args, "--input") {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("cannot read {path}: {e}"))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if report.trim().is_empty() {
        eprintln!("error: empty report (use --input PATH or pipe Markdown on stdin)");
        std::process::exit(1);
    }

    let store = match flag_value(&args, "--file") {
        Some(path) => WatchlistStore::new(path),
        None => WatchlistStore::new(WatchlistStore::default_path()),
    };
    let watchlist = store.load().unwrap_or_default();
    let settings = watchlist.settings();
    let company = watchlist
        .find(&ticker)
        .map(|e| e.company_name.clone())
        .unwrap_or_else(|| ticker.clone());

    let config = ScorerConfig {
        cheap_model: settings.cheap_model,
        strong_model: settings.strong_model,
        threshold: settings.significance_threshold,
    };

    let backend = match OpenAiBackend::from_env() {
        Ok(backend) => backend,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let scorer = SignificanceScorer::new(Box::new(backend), config);
    let score = match scorer.score(&ticker, &report).await {
        Ok(score) => score,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if args.iter().any(|a| a == "--json") {
        println!("{}", serde_json::to_string_pretty(&score)?);
    } else {
        let alert = Alert::new(AlertKind::SignificantFinding {
            company,
            source: flag_value(&args, "--source")
                .and_then(|s| Source::parse(&s))
                .unwrap_or(Source::News),
            score,
        });
        println!("{}", ChatTemplate::render(&alert));
    }

    Ok(())
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn usage() {
    eprintln!("Usage:");
    eprintln!("  score-cli --ticker T [--input PATH] [--source S] [--json] [--file WATCHLIST]");
    eprintln!();
    eprintln!("  reads the report from --input or stdin; scoring needs");
    eprintln!("  INFERENCE_API_KEY (or OPENAI_API_KEY) in the environment");
}
