//! Retained postmortem trace of every signal application.
//!
//! Live progress goes to `tracing`; this log is what a caller gets handed
//! when collection fails, so it can be dumped or attached to a bug report.

use std::fmt::Write as _;

use serde::Serialize;

use crate::state::State;

/// One definition as it looked right after a signal was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedState {
    pub type_description: String,
    pub scope: String,
    pub state: State,
    pub requirements: String,
}

impl LoggedState {
    pub fn dump(&self) -> String {
        format!(
            "{} {}: {} ({})",
            self.type_description, self.scope, self.state, self.requirements
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateLogEntry {
    pub signal: String,
    pub states: Vec<LoggedState>,
}

/// Ordered application log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StateLog {
    entries: Vec<StateLogEntry>,
}

impl StateLog {
    pub fn entries(&self) -> &[StateLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Signal descriptions in application order.
    pub fn signals(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.signal.as_str())
    }

    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (index, entry) in self.entries.iter().enumerate() {
            let _ = writeln!(out, "#{index} {}", entry.signal);
            for state in &entry.states {
                let _ = writeln!(out, "    {}", state.dump());
            }
        }
        out
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Accumulates entries while the processor runs.
#[derive(Debug, Default)]
pub struct StateLogBuilder {
    entries: Vec<StateLogEntry>,
}

impl StateLogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&mut self, signal: String, states: Vec<LoggedState>) {
        self.entries.push(StateLogEntry { signal, states });
    }

    pub fn build(&self) -> StateLog {
        StateLog {
            entries: self.entries.clone(),
        }
    }
}
