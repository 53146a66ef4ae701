//! Schedule checker: decides which cron-like entries are due and records
//! last-run timestamps.
//!
//! The check itself has no side effect. Callers follow a read/then-commit
//! protocol: `due_entries` to find what is due, execute the briefing, then
//! `mark_run` to set `last_run`. A crash after executing but before marking
//! can duplicate a firing across restarts: accepted at-least-once delivery,
//! not exactly-once.

pub mod cron;
mod store;

pub use cron::{minute_start, CronExpr, CronParseError};
pub use store::ScheduleStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] research_core::StoreError),
}

/// One periodic briefing entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub id: String,
    pub cron: String,
    /// "all", or the name of the single agent this entry belongs to
    #[serde(default = "scope_all")]
    pub agent_scope: String,
    #[serde(default)]
    pub last_run: Option<DateTime<Utc>>,
}

fn scope_all() -> String {
    "all".to_string()
}

impl ScheduleEntry {
    pub fn in_scope(&self, agent: Option<&str>) -> bool {
        match agent {
            None => true,
            Some(agent) => self.agent_scope == "all" || self.agent_scope == agent,
        }
    }

    /// Due iff the cron fields match `now`'s minute and this occurrence has
    /// not been marked run yet. Malformed expressions fail closed: never due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        let expr = match CronExpr::parse(&self.cron) {
            Ok(expr) => expr,
            Err(e) => {
                tracing::warn!(id = %self.id, cron = %self.cron, "unparseable cron expression, never due: {e}");
                return false;
            }
        };

        if !expr.matches(now) {
            return false;
        }

        match self.last_run {
            None => true,
            Some(last_run) => last_run < minute_start(now),
        }
    }

    /// Next firing after `now`, for display. `None` for malformed
    /// expressions or anything beyond a year out.
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        CronExpr::parse(&self.cron).ok()?.next_occurrence(now)
    }
}

/// The whole schedule document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    #[serde(default)]
    pub entries: Vec<ScheduleEntry>,
}

impl Schedule {
    pub fn find(&self, id: &str) -> Option<&ScheduleEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Entries due at `now`, optionally filtered to one agent's scope.
    /// Side-effect free and idempotent within a matching minute.
    pub fn due_entries(&self, now: DateTime<Utc>, agent: Option<&str>) -> Vec<&ScheduleEntry> {
        self.entries
            .iter()
            .filter(|e| e.in_scope(agent))
            .filter(|e| e.is_due(now))
            .collect()
    }

    /// The explicit commit half of the protocol: record that `id` fired.
    /// `last_run` never regresses.
    pub fn mark_run(&mut self, id: &str, now: DateTime<Utc>) -> Result<String, ScheduleError> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ScheduleError::Validation(format!("no schedule entry '{}'", id)))?;

        match entry.last_run {
            Some(previous) if previous >= now => {
                tracing::debug!(id, "mark_run kept existing last_run; timestamps never regress");
            }
            _ => entry.last_run = Some(now),
        }

        Ok(format!("Marked '{}' run at {}.", id, now.to_rfc3339()))
    }

    /// Add an entry. The cron expression is validated here so a typo is
    /// caught at add time; hand-edited files still fail closed at check time.
    pub fn add(
        &mut self,
        id: &str,
        cron: &str,
        agent_scope: Option<&str>,
    ) -> Result<String, ScheduleError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ScheduleError::Validation("entry id cannot be empty".to_string()));
        }
        if self.find(id).is_some() {
            return Err(ScheduleError::Validation(format!(
                "schedule entry '{}' already exists",
                id
            )));
        }
        CronExpr::parse(cron)
            .map_err(|e| ScheduleError::Validation(format!("bad cron expression: {e}")))?;

        self.entries.push(ScheduleEntry {
            id: id.to_string(),
            cron: cron.trim().to_string(),
            agent_scope: agent_scope.unwrap_or("all").to_string(),
            last_run: None,
        });

        Ok(format!("Added schedule entry '{}' ({}).", id, cron.trim()))
    }

    pub fn remove(&mut self, id: &str) -> Result<String, ScheduleError> {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        if self.entries.len() == before {
            return Err(ScheduleError::Validation(format!("no schedule entry '{}'", id)));
        }
        Ok(format!("Removed schedule entry '{}'.", id))
    }
}
