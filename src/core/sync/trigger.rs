//! What woke the orchestrator
//!
//! The trigger is recorded in logs and summaries only; a run behaves the same
//! whichever way it was invoked.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Origin of a sync run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncTrigger {
    /// Platform background scheduler
    #[default]
    Scheduled,
    /// User pressed "sync now"
    Manual,
    /// App came to the foreground with a stale last sync
    ForegroundStale,
}

impl std::fmt::Display for SyncTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncTrigger::Scheduled => "scheduled",
            SyncTrigger::Manual => "manual",
            SyncTrigger::ForegroundStale => "foreground",
        };
        f.write_str(s)
    }
}

impl FromStr for SyncTrigger {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scheduled" => Ok(SyncTrigger::Scheduled),
            "manual" => Ok(SyncTrigger::Manual),
            "foreground" | "foreground_stale" => Ok(SyncTrigger::ForegroundStale),
            other => Err(format!(
                "Unknown trigger '{other}'. Must be one of: scheduled, manual, foreground"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trigger() {
        assert_eq!("manual".parse::<SyncTrigger>().unwrap(), SyncTrigger::Manual);
        assert_eq!(
            "Foreground".parse::<SyncTrigger>().unwrap(),
            SyncTrigger::ForegroundStale
        );
        assert!("hourly".parse::<SyncTrigger>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for trigger in [
            SyncTrigger::Scheduled,
            SyncTrigger::Manual,
            SyncTrigger::ForegroundStale,
        ] {
            assert_eq!(trigger.to_string().parse::<SyncTrigger>().unwrap(), trigger);
        }
    }
}
