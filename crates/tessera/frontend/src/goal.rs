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

//! Goals: named, memoizable units of scheduled work
//!
//! A goal's identity is structural: the kind of work, the job it targets, and
//! any extra parameter (such as a symbol being looked up). Identity is what
//! the intern table canonicalizes on; status and prerequisites are mutable
//! state attached to the canonical instance.

use crate::extension::Extension;
use crate::job::JobId;
use crate::pass::Pass;
use std::fmt;

/// Status of a goal.
///
/// `Pending -> Running -> {Success, Fail}` is the normal path. The two extra
/// running states mark re-entry: `RunningRecursive` for goals explicitly
/// declared re-entrant, `RunningWillFail` for a re-request of a goal that is
/// not, which signals an unresolvable cycle. `Success` and `Fail` are
/// terminal; a goal is attempted at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Never attempted
    Pending,
    /// Task body currently on the active call stack
    Running,
    /// Re-requested while running; permitted because the goal is re-entrant
    RunningRecursive,
    /// Re-requested while running and not re-entrant: an unresolvable cycle
    RunningWillFail,
    /// Reached; cached forever
    Success,
    /// Failed; cached forever
    Fail,
}

impl Status {
    /// True for the two cached terminal states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Success | Status::Fail)
    }

    /// True while the goal is on the active call stack.
    pub fn is_running(&self) -> bool {
        matches!(self, Status::Running | Status::RunningRecursive | Status::RunningWillFail)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Pending => "pending",
            Status::Running => "running",
            Status::RunningRecursive => "running (recursive)",
            Status::RunningWillFail => "running (will fail)",
            Status::Success => "success",
            Status::Fail => "fail",
        };
        write!(f, "{}", s)
    }
}

/// Canonical handle to an interned goal.
///
/// Two requests for goals with equal identity yield the same `GoalId`, so a
/// status update made through one requester is visible to every other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GoalId(usize);

impl GoalId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn index(&self) -> usize {
        self.0
    }
}

/// Structural identity of a goal: kind of work, target job, extra parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GoalKey {
    /// Name of the kind of work, e.g. `TypeChecked`
    pub name: String,
    /// The job the work targets, if any
    pub job: Option<JobId>,
    /// Extra identity parameter, e.g. the qualified name being looked up
    pub param: Option<String>,
}

/// Which jobs an [all-jobs barrier](GoalBody::Barrier) covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierScope {
    /// Every job ever registered
    AllJobs,
    /// Jobs requested for compilation (command-line jobs, plus jobs loaded
    /// with the compile flag unless the configuration restricts compilation
    /// to the command line)
    CommandLine,
}

/// Description of a barrier: "every job in scope has reached `milestone`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarrierSpec {
    /// The milestone every in-scope job must reach
    pub milestone: String,
    /// Which jobs count
    pub scope: BarrierScope,
}

/// What happens when a goal's prerequisites are satisfied.
pub(crate) enum GoalBody<X: Extension> {
    /// A task body, run at most once. The box is taken out when the goal
    /// runs, so a second invocation is impossible by construction.
    Task(Option<Box<dyn Pass<X>>>),
    /// Attempt a milestone for every job in scope, all of them, then succeed
    /// iff all did.
    Barrier(BarrierSpec),
    /// No body; trivially succeeds once prerequisites do.
    Marker,
}

/// A goal description handed to [`Scheduler::intern`](crate::scheduler::Scheduler::intern).
///
/// Interning either canonicalizes this spec into a fresh goal or returns the
/// already-interned goal with the same identity (in which case this spec's
/// body is dropped: equal identity means equal work).
pub struct GoalSpec<X: Extension> {
    pub(crate) key: GoalKey,
    pub(crate) reentrant: bool,
    pub(crate) body: GoalBody<X>,
}

impl<X: Extension> GoalSpec<X> {
    /// A per-job goal with a task body.
    pub fn task(name: impl Into<String>, job: JobId, pass: impl Pass<X> + 'static) -> Self {
        Self::task_boxed(name, job, Box::new(pass))
    }

    /// A per-job goal with an already-boxed task body.
    pub fn task_boxed(name: impl Into<String>, job: JobId, pass: Box<dyn Pass<X>>) -> Self {
        Self {
            key: GoalKey {
                name: name.into(),
                job: Some(job),
                param: None,
            },
            reentrant: false,
            body: GoalBody::Task(Some(pass)),
        }
    }

    /// A job-less lookup goal, identified by an extra parameter (typically
    /// the qualified name of the symbol to resolve).
    pub fn lookup(name: impl Into<String>, param: impl Into<String>, pass: impl Pass<X> + 'static) -> Self {
        Self {
            key: GoalKey {
                name: name.into(),
                job: None,
                param: Some(param.into()),
            },
            reentrant: false,
            body: GoalBody::Task(Some(Box::new(pass))),
        }
    }

    /// A goal with no body of its own; succeeds once its prerequisites do.
    pub fn marker(name: impl Into<String>, job: Option<JobId>) -> Self {
        Self {
            key: GoalKey {
                name: name.into(),
                job,
                param: None,
            },
            reentrant: false,
            body: GoalBody::Marker,
        }
    }

    /// A barrier goal: reached when every job in `scope` has reached
    /// `milestone`.
    pub fn barrier(name: impl Into<String>, milestone: impl Into<String>, scope: BarrierScope) -> Self {
        Self {
            key: GoalKey {
                name: name.into(),
                job: None,
                param: None,
            },
            reentrant: false,
            body: GoalBody::Barrier(BarrierSpec {
                milestone: milestone.into(),
                scope,
            }),
        }
    }

    /// Permit this goal to be re-requested while it is running. A re-request
    /// then returns a provisional "not yet reached" answer instead of raising
    /// a cyclic-dependency signal.
    pub fn reentrant(mut self) -> Self {
        self.reentrant = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(Status::Success.is_terminal());
        assert!(Status::Fail.is_terminal());
        assert!(!Status::Pending.is_terminal());
        assert!(!Status::Running.is_terminal());

        assert!(Status::Running.is_running());
        assert!(Status::RunningRecursive.is_running());
        assert!(Status::RunningWillFail.is_running());
        assert!(!Status::Pending.is_running());
        assert!(!Status::Success.is_running());
    }

    #[test]
    fn test_key_equality_is_structural() {
        let job = JobId::new(0);
        let a = GoalKey {
            name: "TypeChecked".to_string(),
            job: Some(job),
            param: None,
        };
        let b = GoalKey {
            name: "TypeChecked".to_string(),
            job: Some(job),
            param: None,
        };
        let c = GoalKey {
            name: "TypeChecked".to_string(),
            job: Some(JobId::new(1)),
            param: None,
        };
        let d = GoalKey {
            name: "LookupGlobalType".to_string(),
            job: None,
            param: Some("java.lang.Object".to_string()),
        };
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }
}
