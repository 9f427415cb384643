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

//! Task bodies and the context they run in
//!
//! A [`Pass`] is the body invoked when a goal is attempted. It receives a
//! [`PassContext`] carrying the active job, its artifact and error sink, and
//! a handle back into the scheduler for registering jobs and attempting
//! further goals mid-execution (how cross-file dependencies are discovered).

use crate::error::AttemptResult;
use crate::extension::Extension;
use crate::goal::{GoalId, GoalSpec};
use crate::job::{Job, JobId};
use crate::scheduler::Scheduler;
use tessera_common::{Diagnostic, ErrorSink, Source};

/// A unit of work run when a goal is attempted.
///
/// Returns `Ok(true)` on success and `Ok(false)` on failure; a nested
/// [`PassContext::attempt`] that detects a cycle yields an `Err` that the
/// body should propagate with `?`.
pub trait Pass<X: Extension> {
    fn run(&mut self, cx: &mut PassContext<'_, X>) -> AttemptResult;
}

/// Ambient state for a running task body.
///
/// This is the explicit replacement for global "current compiler" state: the
/// body sees its own goal, the owning job, and the scheduler it may re-enter.
pub struct PassContext<'a, X: Extension> {
    pub(crate) scheduler: &'a mut Scheduler<X>,
    pub(crate) goal: GoalId,
    pub(crate) job: Option<JobId>,
}

impl<'a, X: Extension> PassContext<'a, X> {
    /// The goal this body is running for.
    pub fn goal(&self) -> GoalId {
        self.goal
    }

    pub fn goal_name(&self) -> &str {
        self.scheduler.goals().name(self.goal)
    }

    /// The job this goal targets, if it is a per-source goal.
    pub fn job_id(&self) -> Option<JobId> {
        self.job
    }

    pub fn job(&self) -> Option<&Job<X>> {
        self.job.and_then(|id| self.scheduler.job(id))
    }

    pub fn job_mut(&mut self) -> Option<&mut Job<X>> {
        let id = self.job?;
        self.scheduler.job_mut(id)
    }

    pub fn ast(&self) -> Option<&X::Ast> {
        self.job().and_then(|j| j.ast())
    }

    pub fn ast_mut(&mut self) -> Option<&mut X::Ast> {
        self.job_mut().and_then(|j| j.ast_mut())
    }

    /// Install the artifact for the owning job (e.g. after parsing).
    ///
    /// Panics if this goal has no job: producing an artifact from a job-less
    /// goal is a programming error.
    pub fn set_ast(&mut self, ast: X::Ast) {
        match self.job_mut() {
            Some(job) => job.set_ast(ast),
            None => panic!("set_ast on a goal with no job"),
        }
    }

    /// Report a diagnostic into the owning job's error sink, or into the
    /// scheduler-wide sink for job-less goals.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        match self.job_mut() {
            Some(job) => job.errors_mut().report(diagnostic),
            None => self.scheduler.errors_mut().report(diagnostic),
        }
    }

    pub fn errors(&self) -> Option<&ErrorSink> {
        self.job().map(|j| j.errors())
    }

    /// Attempt another goal synchronously, re-entering the scheduler.
    pub fn attempt(&mut self, goal: GoalId) -> AttemptResult {
        self.scheduler.attempt(goal)
    }

    /// Canonicalize a freshly constructed goal. Always use the returned id.
    pub fn intern(&mut self, spec: GoalSpec<X>) -> GoalId {
        self.scheduler.intern(spec)
    }

    /// Register (or retrieve) a job for another source. Returns `None` if
    /// that source already completed compilation.
    pub fn add_job(&mut self, source: Source) -> Option<JobId> {
        self.scheduler.add_job(source)
    }

    /// Register a job and set up its milestone chain in one step.
    pub fn load_source(&mut self, source: Source, compile: bool) -> Option<JobId> {
        self.scheduler.load_source(source, compile)
    }

    /// Mark the owning job complete, releasing its slot and artifact.
    pub fn complete_job(&mut self) {
        if let Some(id) = self.job {
            self.scheduler.complete_job(id);
        }
    }

    /// Full access to the scheduler for anything not covered above.
    pub fn scheduler(&mut self) -> &mut Scheduler<X> {
        self.scheduler
    }
}

/// Adapter turning a closure into a [`Pass`].
pub struct FnPass<F> {
    f: F,
}

impl<F> FnPass<F> {
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<X, F> Pass<X> for FnPass<F>
where
    X: Extension,
    F: FnMut(&mut PassContext<'_, X>) -> AttemptResult,
{
    fn run(&mut self, cx: &mut PassContext<'_, X>) -> AttemptResult {
        (self.f)(cx)
    }
}

/// A visitor over a job's artifact.
///
/// The node type stays opaque to the core; extensions define the traversal.
pub trait AstVisitor<A> {
    /// Called before the traversal; returning false skips it and fails the
    /// pass.
    fn begin(&mut self) -> bool {
        true
    }

    /// Rewrite the artifact, reporting diagnostics into the job's sink.
    fn visit(&mut self, ast: A, errors: &mut ErrorSink) -> A;

    /// Called after the traversal.
    fn finish(&mut self) {}
}

/// A pass which runs a visitor over the owning job's artifact.
///
/// The pass succeeds iff the visitor introduced no new errors: the error
/// count is snapshotted around the traversal, so a structurally complete
/// rewrite that logged diagnostics still fails.
pub struct VisitorPass<V> {
    visitor: V,
}

impl<V> VisitorPass<V> {
    pub fn new(visitor: V) -> Self {
        Self { visitor }
    }

    pub fn visitor(&self) -> &V {
        &self.visitor
    }
}

impl<X, V> Pass<X> for VisitorPass<V>
where
    X: Extension,
    V: AstVisitor<X::Ast>,
{
    fn run(&mut self, cx: &mut PassContext<'_, X>) -> AttemptResult {
        let Some(job) = cx.job_mut() else {
            panic!("visitor pass run for a goal with no job");
        };

        if !self.visitor.begin() {
            return Ok(false);
        }

        let before = job.errors().error_count();
        let Some(ast) = job.take_ast() else {
            panic!("visitor pass on {}: artifact missing (has the parser run?)", job.source());
        };

        let ast = self.visitor.visit(ast, job.errors_mut());
        job.set_ast(ast);
        self.visitor.finish();

        let after = job.errors().error_count();
        Ok(after == before)
    }
}
