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

//! Diagnostic reporting and per-job error accounting
//!
//! Each compilation unit owns an [`ErrorSink`]. The sink exposes a
//! monotonically increasing error count; the scheduler snapshots the count
//! around every task invocation to detect passes that introduced diagnostics
//! without explicitly failing.

use crate::position::Position;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{error, warn};

/// Severity of a reported diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Advisory; does not count toward the error total
    Warning,
    /// A compilation error attributable to the input
    Error,
    /// An unrecoverable fault (e.g. a pass panicked)
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
            Severity::Fatal => write!(f, "fatal"),
        }
    }
}

/// A single diagnostic message.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{severity}: {message}")]
pub struct Diagnostic {
    /// How serious the diagnostic is
    pub severity: Severity,
    /// Human-readable message
    pub message: String,
    /// Position in the source, when known
    pub position: Option<Position>,
}

impl Diagnostic {
    /// Create a diagnostic with the given severity.
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            position: None,
        }
    }

    /// Create an error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Create a fatal diagnostic.
    pub fn fatal(message: impl Into<String>) -> Self {
        Self::new(Severity::Fatal, message)
    }

    /// Attach a source position.
    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// Accumulates diagnostics for one compilation unit.
///
/// The error count only ever increases; callers that need to know whether a
/// region of code reported errors snapshot the count before and compare
/// after.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorSink {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
}

impl ErrorSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic. Diagnostics at [`Severity::Error`] or above
    /// increment the monotonic error count.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => warn!("{}", diagnostic),
            Severity::Error | Severity::Fatal => error!("{}", diagnostic),
        }
        if diagnostic.severity >= Severity::Error {
            self.error_count += 1;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Number of error-or-worse diagnostics reported so far. Monotonically
    /// increasing.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// True if at least one error-or-worse diagnostic has been reported.
    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    /// All diagnostics reported so far, in order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
