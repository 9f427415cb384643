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

//! Scheduler configuration

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Options the scheduler consults while driving goals.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Goal names whose task bodies are skipped; the goal is marked
    /// successful without running.
    pub disabled_passes: HashSet<String>,
    /// When set, only command-line jobs are compiled to completion; jobs
    /// pulled in by cross-file references are advanced only as far as the
    /// references require.
    pub compile_command_line_only: bool,
}

impl SchedulerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip the named pass, marking its goals successful without running.
    pub fn disable_pass(mut self, name: impl Into<String>) -> Self {
        self.disabled_passes.insert(name.into());
        self
    }

    /// Restrict full compilation to command-line jobs.
    pub fn compile_command_line_only(mut self, value: bool) -> Self {
        self.compile_command_line_only = value;
        self
    }
}
