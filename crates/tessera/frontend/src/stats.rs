// Tessera
// Copyright (C) 2025 Tessera Project

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Per-goal-name scheduling statistics
//!
//! The scheduler accumulates, keyed by goal name: how many task bodies ran
//! (`attempts`), how many goals ended in success (`reached`) or failure
//! (`unreached`), and cumulative wall time. `unreached` counts every goal
//! that ended failed, whether or not its body ran; a goal whose pass was
//! disabled in configuration counts as reached without an attempt.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::time::Duration;

/// Counters for one goal name (or for the whole run, in totals).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalStats {
    /// Task bodies actually invoked
    pub attempts: u64,
    /// Goals that ended in success
    pub reached: u64,
    /// Goals that ended in failure
    pub unreached: u64,
    /// Cumulative wall time spent in task bodies
    pub elapsed: Duration,
}

/// The named statistics sink.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stats {
    goals: BTreeMap<String, GoalStats>,
    totals: GoalStats,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, name: &str) -> &mut GoalStats {
        self.goals.entry(name.to_string()).or_default()
    }

    pub fn record_attempt(&mut self, name: &str) {
        self.entry(name).attempts += 1;
        self.totals.attempts += 1;
    }

    pub fn record_reached(&mut self, name: &str) {
        self.entry(name).reached += 1;
        self.totals.reached += 1;
    }

    pub fn record_unreached(&mut self, name: &str) {
        self.entry(name).unreached += 1;
        self.totals.unreached += 1;
    }

    pub fn record_time(&mut self, name: &str, elapsed: Duration) {
        self.entry(name).elapsed += elapsed;
        self.totals.elapsed += elapsed;
    }

    /// Counters for one goal name, if anything was recorded under it.
    pub fn get(&self, name: &str) -> Option<&GoalStats> {
        self.goals.get(name)
    }

    /// Run-wide totals.
    pub fn totals(&self) -> &GoalStats {
        &self.totals
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &GoalStats)> {
        self.goals.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Human-readable per-goal report, sorted by goal name.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        for (name, s) in &self.goals {
            let _ = writeln!(
                out,
                "{}: attempts={} reached={} unreached={} time={:?}",
                name, s.attempts, s.reached, s.unreached, s.elapsed
            );
        }
        let t = &self.totals;
        let _ = writeln!(
            out,
            "total: attempts={} reached={} unreached={} time={:?}",
            t.attempts, t.reached, t.unreached, t.elapsed
        );
        out
    }
}
