//! schedule-cli: list, check, and commit periodic briefing schedules.
//!
//! Usage:
//!   schedule-cli --list
//!   schedule-cli --check [--agent A] [--json]
//!   schedule-cli --mark-run ID [--agent A]
//!   schedule-cli --add ID --cron "0 8 * * 1-5" [--agent A]
//!   schedule-cli --remove ID
//!
//! `--check` is side-effect free; callers execute the due briefings and then
//! commit each with `--mark-run`. `--file PATH` overrides the store
//! location.

use chrono::Utc;
use schedule_checker::{Schedule, ScheduleError, ScheduleStore};

fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schedule_cli=info,schedule_checker=warn".into()),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let store = match flag_value(&args, "--file") {
        Some(path) => ScheduleStore::new(path),
        None => ScheduleStore::new(ScheduleStore::default_path()),
    };

    if let Err(e) = run(&args, &store) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run(args: &[String], store: &ScheduleStore) -> Result<(), ScheduleError> {
    let mutating = ["--mark-run", "--add", "--remove"]
        .iter()
        .any(|flag| flag_value(args, flag).is_some());
    let _lock = if mutating { Some(store.lock()?) } else { None };

    let mut schedule = store.load()?;
    let now = Utc::now();

    if args.iter().any(|a| a == "--list") {
        list(&schedule, now);
        return Ok(());
    }

    if args.iter().any(|a| a == "--check") {
        let agent = flag_value(args, "--agent");
        let due = schedule.due_entries(now, agent.as_deref());

        if args.iter().any(|a| a == "--json") {
            let payload: Vec<serde_json::Value> = due
                .iter()
                .map(|e| {
                    serde_json::json!({
                        "id": e.id,
                        "cron": e.cron,
                        "agent_scope": e.agent_scope,
                        "last_run": e.last_run,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "[]".into()));
        } else if due.is_empty() {
            println!("nothing due at {}", now.to_rfc3339());
        } else {
            for entry in due {
                println!("due: {} ({}) [{}]", entry.id, entry.cron, entry.agent_scope);
            }
        }
        return Ok(());
    }

    if let Some(id) = flag_value(args, "--mark-run") {
        if let (Some(agent), Some(entry)) = (flag_value(args, "--agent"), schedule.find(&id)) {
            if !entry.in_scope(Some(&agent)) {
                return Err(ScheduleError::Validation(format!(
                    "entry '{}' is scoped to '{}', not '{}'",
                    id, entry.agent_scope, agent
                )));
            }
        }
        let message = schedule.mark_run(&id, now)?;
        store.save(&schedule)?;
        println!("{message}");
        return Ok(());
    }

    if let Some(id) = flag_value(args, "--add") {
        let cron = flag_value(args, "--cron")
            .ok_or_else(|| ScheduleError::Validation("--cron is required with --add".into()))?;
        let agent = flag_value(args, "--agent");
        let message = schedule.add(&id, &cron, agent.as_deref())?;
        store.save(&schedule)?;
        println!("{message}");
        return Ok(());
    }

    if let Some(id) = flag_value(args, "--remove") {
        let message = schedule.remove(&id)?;
        store.save(&schedule)?;
        println!("{message}");
        return Ok(());
    }

    usage();
    Err(ScheduleError::Validation("no command given".into()))
}

fn list(schedule: &Schedule, now: chrono::DateTime<Utc>) {
    if schedule.entries.is_empty() {
        println!("no schedule entries");
        return;
    }

    for entry in &schedule.entries {
        let last = entry
            .last_run
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never".into());
        let next = entry
            .next_occurrence(now)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| "never (unparseable cron)".into());
        println!(
            "{} ({}) [{}] last run: {} | next: {}",
            entry.id, entry.cron, entry.agent_scope, last, next
        );
    }
}

fn flag_value(args: &[String], name: &str) -> Option<String> {
    args.iter()
        .position(|a| a == name)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn usage() {
    eprintln!("Usage:");
    eprintln!("  schedule-cli --list");
    eprintln!("  schedule-cli --check [--agent A] [--json]");
    eprintln!("  schedule-cli --mark-run ID [--agent A]");
    eprintln!("  schedule-cli --add ID --cron EXPR [--agent A]");
    eprintln!("  schedule-cli --remove ID");
    eprintln!();
    eprintln!("  --file PATH   override the schedule file location");
}
