use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use research_core::normalize_ticker;

use crate::WatchlistError;

/// One tracked ticker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchlistEntry {
    pub ticker: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub added: Option<NaiveDate>,
}

/// Global scorer settings, stored alongside the tickers and read by the
/// significance scorer on each heartbeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub significance_threshold: u8,
    pub cheap_model: String,
    pub strong_model: String,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            significance_threshold: 5,
            cheap_model: "gpt-4o-mini".to_string(),
            strong_model: "gpt-4o".to_string(),
        }
    }
}

/// The whole watchlist document. The store owns this exclusively; no other
/// component writes it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Watchlist {
    #[serde(default)]
    pub tickers: Vec<WatchlistEntry>,
    #[serde(default)]
    pub global_settings: Option<GlobalSettings>,
}

impl Watchlist {
    pub fn find(&self, symbol: &str) -> Option<&WatchlistEntry> {
        let normalized = normalize_ticker(symbol);
        self.tickers.iter().find(|t| t.ticker == normalized)
    }

    fn find_mut(&mut self, symbol: &str) -> Option<&mut WatchlistEntry> {
        let normalized = normalize_ticker(symbol);
        self.tickers.iter_mut().find(|t| t.ticker == normalized)
    }

    /// Add a ticker. Duplicate symbols and empty names are rejected.
    pub fn add(
        &mut self,
        symbol: &str,
        company_name: &str,
        theme: Option<String>,
        today: NaiveDate,
    ) -> Result<String, WatchlistError> {
        let ticker = normalize_ticker(symbol);
        if ticker.is_empty() {
            return Err(WatchlistError::Validation(
                "ticker symbol cannot be empty".to_string(),
            ));
        }
        if company_name.trim().is_empty() {
            return Err(WatchlistError::Validation(
                "company name cannot be empty".to_string(),
            ));
        }
        if self.find(&ticker).is_some() {
            return Err(WatchlistError::Validation(format!(
                "${} is already on the watchlist",
                ticker
            )));
        }

        let name = company_name.trim().to_string();
        self.tickers.push(WatchlistEntry {
            ticker: ticker.clone(),
            company_name: name.clone(),
            theme,
            directive: None,
            added: Some(today),
        });

        Ok(format!("Added ${} ({}) to the watchlist.", ticker, name))
    }

    pub fn remove(&mut self, symbol: &str) -> Result<String, WatchlistError> {
        let ticker = normalize_ticker(symbol);
        let before = self.tickers.len();
        self.tickers.retain(|t| t.ticker != ticker);

        if self.tickers.len() == before {
            return Err(WatchlistError::Validation(format!(
                "${} is not on the watchlist",
                ticker
            )));
        }
        Ok(format!("Removed ${} from the watchlist.", ticker))
    }

    /// Set a ticker's research theme and directive. Takes effect on the next
    /// heartbeat cycle.
    pub fn set_directive(
        &mut self,
        symbol: &str,
        theme: &str,
        directive: &str,
    ) -> Result<String, WatchlistError> {
        let entry = self.find_mut(symbol).ok_or_else(|| {
            WatchlistError::Validation(format!(
                "${} is not on the watchlist",
                normalize_ticker(symbol)
            ))
        })?;

        entry.theme = Some(theme.trim().to_string());
        entry.directive = Some(directive.trim().to_string());
        Ok(format!(
            "Set directive for ${}. Effective next heartbeat.",
            entry.ticker
        ))
    }

    /// Update one global scorer setting by key.
    pub fn set_global(&mut self, key: &str, value: &str) -> Result<String, WatchlistError> {
        let settings = self.global_settings.get_or_insert_with(GlobalSettings::default);

        match key {
            "significance_threshold" => {
                let threshold: u8 = value.parse().ok().filter(|t| (1..=10).contains(t)).ok_or_else(
                    || {
                        WatchlistError::Validation(format!(
                            "significance_threshold must be an integer 1-10, got '{}'",
                            value
                        ))
                    },
                )?;
                settings.significance_threshold = threshold;
            }
            "cheap_model" => settings.cheap_model = value.to_string(),
            "strong_model" => settings.strong_model = value.to_string(),
            other => {
                return Err(WatchlistError::Validation(format!(
                    "unknown setting '{}'; valid: significance_threshold, cheap_model, strong_model",
                    other
                )))
            }
        }

        Ok(format!("Set global {} = {}. Effective next heartbeat.", key, value))
    }

    pub fn settings(&self) -> GlobalSettings {
        self.global_settings.clone().unwrap_or_default()
    }

    /// Human-readable listing for the `show` command.
    pub fn render(&self) -> String {
        if self.tickers.is_empty() {
            return "No tickers on the watchlist. Add one to start tracking.".to_string();
        }

        let mut lines = vec!["Watchlist".to_string(), String::new()];

        if let Some(settings) = &self.global_settings {
            lines.push(format!(
                "significance threshold: {} | cheap model: {} | strong model: {}",
                settings.significance_threshold, settings.cheap_model, settings.strong_model
            ));
            lines.push(String::new());
        }

        for entry in &self.tickers {
            let since = entry
                .added
                .map(|d| format!(" (since {})", d))
                .unwrap_or_default();
            lines.push(format!("${} — {}{}", entry.ticker, entry.company_name, since));
            if let Some(theme) = &entry.theme {
                lines.push(format!("  theme: {}", theme));
            }
            if let Some(directive) = &entry.directive {
                lines.push(format!("  directive: {}", directive));
            }
        }

        lines.join("\n")
    }
}
