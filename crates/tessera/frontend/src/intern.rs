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

//! The goal intern table
//!
//! Canonicalizes goals by structural identity so that requesting "the same"
//! unit of work twice yields one shared status cell. Goals live in an arena;
//! a [`GoalId`] is the canonical reference.

use crate::extension::Extension;
use crate::goal::{BarrierSpec, GoalBody, GoalId, GoalKey, GoalSpec, Status};
use crate::job::JobId;
use crate::pass::Pass;
use std::collections::HashMap;
use tracing::trace;

struct GoalData<X: Extension> {
    key: GoalKey,
    prereqs: Vec<GoalId>,
    status: Status,
    reentrant: bool,
    body: GoalBody<X>,
}

/// Arena of canonical goals plus the identity index.
pub struct GoalTable<X: Extension> {
    goals: Vec<GoalData<X>>,
    index: HashMap<GoalKey, GoalId>,
}

impl<X: Extension> GoalTable<X> {
    pub fn new() -> Self {
        Self {
            goals: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Canonicalize a goal spec. If a goal with the same identity was interned
    /// before, its id is returned and the new spec's body is dropped: equal
    /// identity means equal work, and the existing status cell must stay
    /// authoritative for every requester.
    pub fn intern(&mut self, spec: GoalSpec<X>) -> GoalId {
        if let Some(&id) = self.index.get(&spec.key) {
            trace!("interned existing goal {:?}", spec.key);
            return id;
        }
        let id = GoalId::new(self.goals.len());
        self.index.insert(spec.key.clone(), id);
        self.goals.push(GoalData {
            key: spec.key,
            prereqs: Vec::new(),
            status: Status::Pending,
            reentrant: spec.reentrant,
            body: spec.body,
        });
        id
    }

    /// Look up an already-interned goal by identity.
    pub fn lookup(&self, key: &GoalKey) -> Option<GoalId> {
        self.index.get(key).copied()
    }

    pub fn status(&self, id: GoalId) -> Status {
        self.goals[id.index()].status
    }

    pub(crate) fn set_status(&mut self, id: GoalId, status: Status) {
        self.goals[id.index()].status = status;
    }

    pub fn name(&self, id: GoalId) -> &str {
        &self.goals[id.index()].key.name
    }

    pub fn key(&self, id: GoalId) -> &GoalKey {
        &self.goals[id.index()].key
    }

    pub fn job(&self, id: GoalId) -> Option<JobId> {
        self.goals[id.index()].key.job
    }

    pub fn is_reentrant(&self, id: GoalId) -> bool {
        self.goals[id.index()].reentrant
    }

    /// The goal's prerequisites, in declared order.
    pub fn prereqs(&self, id: GoalId) -> &[GoalId] {
        &self.goals[id.index()].prereqs
    }

    /// Append a prerequisite to a goal that has not started running.
    ///
    /// Panics if the goal has already started: a prerequisite list is frozen
    /// the moment its goal runs, and dependencies discovered mid-execution
    /// must be attached to freshly interned goals instead. Re-adding an
    /// existing prerequisite is a no-op.
    pub fn add_prereq(&mut self, goal: GoalId, prereq: GoalId) {
        let data = &mut self.goals[goal.index()];
        if data.status != Status::Pending {
            panic!(
                "cannot add prerequisite to goal `{}`: it already started (status {})",
                data.key.name, data.status
            );
        }
        if !data.prereqs.contains(&prereq) {
            data.prereqs.push(prereq);
        }
    }

    /// Like [`add_prereq`](Self::add_prereq), but silently skips goals that
    /// already started. Used when re-registering a job whose goal chain may
    /// include goals already run.
    pub(crate) fn chain_prereq(&mut self, goal: GoalId, prereq: GoalId) {
        if self.goals[goal.index()].status == Status::Pending {
            self.add_prereq(goal, prereq);
        }
    }

    pub(crate) fn barrier_spec(&self, id: GoalId) -> Option<BarrierSpec> {
        match &self.goals[id.index()].body {
            GoalBody::Barrier(spec) => Some(spec.clone()),
            _ => None,
        }
    }

    /// Take the task body out of a goal. Returns `None` for marker and
    /// barrier goals, and for task goals that already ran: the body can be
    /// taken exactly once.
    pub(crate) fn take_task(&mut self, id: GoalId) -> Option<Box<dyn Pass<X>>> {
        match &mut self.goals[id.index()].body {
            GoalBody::Task(task) => task.take(),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

impl<X: Extension> Default for GoalTable<X> {
    fn default() -> Self {
        Self::new()
    }
}
