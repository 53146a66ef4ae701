//! watchlist-cli: manage the tracked-ticker watchlist.
//!
//! Usage:
//!   watchlist-cli show
//!   watchlist-cli add --ticker CAKE --name "The Cheesecake Factory" [--theme S]
//!   watchlist-cli remove --ticker CAKE
//!   watchlist-cli set-directive --ticker CAKE --theme S --directive S
//!   watchlist-cli set-global --key significance_threshold --value 6
//!
//! `--file PATH` overrides the default store location.

use chrono::Utc;
use watchlist_store::{WatchlistError, WatchlistStore};

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "watchlist_cli=info".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first().cloned() else {
        usage();
        std::process::exit(2);
    };

    let store = match flag_value(&args, "--file") {
        Some(path) => WatchlistStore::new(path),
        None => WatchlistStore::new(WatchlistStore::default_path()),
    };

    match run(&command, &args, &store) {
        Ok(Some(message)) => println!("{message}"),
        Ok(None) => {}
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

fn run(
    command: &str,
    args: &[String],
    store: &WatchlistStore,
) -> Result<Option<String>, WatchlistError> {
    // show is read-only; every mutation holds the advisory lock
    let _lock = if command == "show" {
        None
    } else {
        Some(store.lock()?)
    };
    let mut watchlist = store.load()?;

    let message = match command {
        "show" => {
            println!("{}", watchlist.render());
            return Ok(None);
        }
        "add" => {
            let ticker = require(args, "--ticker")?;
            let name = require(args, "--name")?;
            let message = watchlist.add(
                &ticker,
                &name,
                flag_value(args, "--theme"),
                Utc::now().date_naive(),
            )?;
            store.save(&watchlist)?;
            message
        }
        "remove" => {
            let ticker = require(args, "--ticker")?;
            let message = watchlist.remove(&ticker)?;
            store.save(&watchlist)?;
            message
        }
        "set-directive" => {
            let ticker = require(args, "--ticker")?;
            let theme = require(args, "--theme")?;
            let directive = require(args, "--directive")?;
            let message = watchlist.set_directive(&ticker, &theme, &directive)?;
            store.save(&watchlist)?;
            message
        }
        "set-global" => {
            let key = require(args, "--key")?;
            let value = require(args, "--value")?;
            let message = watchlist.set_global(&key, &value)?;
            store.save(&watchlist)?;
            message
        }
        other => {
            usage();
            return Err(WatchlistError::Validation(format!(
                "unknown command '{other}'"
            )));
        }
    };

    Ok(Some(message))
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn require(args: &[String], name: &str) -> Result<String, WatchlistError> {
    flag_value(args, name)
        .ok_or_else(|| WatchlistError::Validation(format!("{name} is required")))
}

fn usage() {
    eprintln!("Usage:");
    eprintln!("  watchlist-cli show");
    eprintln!("  watchlist-cli add --ticker T --name N [--theme S]");
    eprintln!("  watchlist-cli remove --ticker T");
    eprintln!("  watchlist-cli set-directive --ticker T --theme S --directive S");
    eprintln!("  watchlist-cli set-global --key K --value V");
    eprintln!();
    eprintln!("  --file PATH   override the watchlist file location");
}
