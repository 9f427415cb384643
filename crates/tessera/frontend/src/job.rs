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

//! Per-source compilation units
//!
//! A [`Job`] binds a [`Source`] to its mutable artifact (the AST) and a
//! private error sink, and records the milestones the job has reached. Once
//! the job's final `End` milestone succeeds, its slot in the job table is
//! replaced by a completion sentinel and the artifact is released; no further
//! goal may address it.

use crate::extension::Extension;
use tessera_common::{ErrorSink, Source};

/// Handle to a job in the scheduler's job table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(usize);

impl JobId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(&self) -> usize {
        self.0
    }
}

/// One compilation unit: a source, its artifact, and its diagnostics.
pub struct Job<X: Extension> {
    source: Source,
    /// The AST root. `None` until the parse milestone populates it; owned
    /// exclusively by this job until completion.
    ast: Option<X::Ast>,
    errors: ErrorSink,
    /// Error count snapshot taken just before a task body runs for this job.
    initial_error_count: usize,
    /// Set when any task body for this job strictly increased the error
    /// count, even if the task itself claimed success.
    reported_errors: bool,
    /// Conjunction of every task result reported for this job so far.
    ok: bool,
    /// Names of the milestones reached for this job, in order.
    reached: Vec<String>,
}

impl<X: Extension> Job<X> {
    pub fn new(source: Source) -> Self {
        Self {
            source,
            ast: None,
            errors: ErrorSink::new(),
            initial_error_count: 0,
            reported_errors: false,
            ok: true,
            reached: Vec::new(),
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn ast(&self) -> Option<&X::Ast> {
        self.ast.as_ref()
    }

    pub fn ast_mut(&mut self) -> Option<&mut X::Ast> {
        self.ast.as_mut()
    }

    /// Hand the artifact off to a pass. The pass must put it back with
    /// [`set_ast`](Self::set_ast) when it is done rewriting.
    pub fn take_ast(&mut self) -> Option<X::Ast> {
        self.ast.take()
    }

    pub fn set_ast(&mut self, ast: X::Ast) {
        self.ast = Some(ast);
    }

    pub fn errors(&self) -> &ErrorSink {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorSink {
        &mut self.errors
    }

    /// True if any task body for this job introduced diagnostics, whether or
    /// not the task reported failure. Downstream milestones consult this to
    /// decide whether to proceed.
    pub fn reported_errors(&self) -> bool {
        self.reported_errors
    }

    /// True while every task run for this job has reported success.
    pub fn status(&self) -> bool {
        self.ok
    }

    /// Milestone names reached for this job, in the order they were reached.
    pub fn reached(&self) -> &[String] {
        &self.reached
    }

    pub fn has_reached(&self, milestone: &str) -> bool {
        self.reached.iter().any(|m| m == milestone)
    }

    pub(crate) fn snapshot_error_count(&mut self) {
        self.initial_error_count = self.errors.error_count();
    }

    /// Compare the sink against the snapshot taken before the task ran; a
    /// strict increase means this invocation introduced diagnostics.
    pub(crate) fn note_reported_errors(&mut self) {
        if self.errors.error_count() > self.initial_error_count {
            self.reported_errors = true;
        }
    }

    pub(crate) fn update_status(&mut self, ok: bool) {
        self.ok &= ok;
    }

    pub(crate) fn record_reached(&mut self, milestone: &str) {
        self.reached.push(milestone.to_string());
    }
}

/// Slot in the job table: either a live job or the completion sentinel left
/// behind once `End` succeeded and the artifact was released.
pub(crate) enum JobSlot<X: Extension> {
    Active(Job<X>),
    Completed,
}
