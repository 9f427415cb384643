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

//! Scheduling error types

use thiserror::Error;

/// Signal raised when a goal is re-requested while it is already running and
/// is not marked re-entrant.
///
/// The signal propagates by ordinary return values through every `attempt`
/// frame on the way out and is caught only by the top-level driver
/// ([`Scheduler::run_to_completion`](crate::scheduler::Scheduler::run_to_completion)),
/// which treats it as overall failure. Each frame it passes through marks its
/// own goal failed first, so no goal is left in a running state afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cyclic dependency on goal `{goal}`")]
pub struct CyclicDependency {
    /// Name of the goal that was re-entered
    pub goal: String,
    /// Names of the goals active when the cycle was detected, outermost first
    pub stack: Vec<String>,
}

impl CyclicDependency {
    pub(crate) fn new(goal: String, stack: Vec<String>) -> Self {
        Self { goal, stack }
    }
}

/// Result of attempting a goal: `Ok(true)` if the goal was reached,
/// `Ok(false)` if it failed, `Err` if a cycle was detected.
pub type AttemptResult = Result<bool, CyclicDependency>;
