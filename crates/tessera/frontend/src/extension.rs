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

//! The extension interface: how a concrete language front end plugs in
//!
//! An extension declares its artifact type and an ordered list of milestone
//! descriptors. The scheduler instantiates the milestones per job, chains
//! them into a strict total order, and appends its own `End` goal. The phase
//! set is open-ended: extensions add, rename, or reorder milestones freely,
//! and the core stays generic over the list.

use crate::job::JobId;
use crate::pass::Pass;

/// A concrete language front end.
pub trait Extension: Sized + 'static {
    /// The per-job artifact (typically the AST root). Opaque to the core.
    type Ast;

    /// Display name, used in logs.
    fn name(&self) -> &str;

    /// The ordered milestone descriptors applied to every job. The scheduler
    /// appends the final `End` milestone itself.
    fn milestones(&self) -> Vec<Milestone<Self>>;
}

/// Factory producing the task body for one milestone of one job.
pub type MilestoneFactory<X> = Box<dyn Fn(JobId) -> Box<dyn Pass<X>>>;

/// A named milestone descriptor: one phase in the per-job sequence.
pub struct Milestone<X: Extension> {
    name: String,
    reentrant: bool,
    factory: MilestoneFactory<X>,
}

impl<X: Extension> Milestone<X> {
    pub fn new(name: impl Into<String>, factory: impl Fn(JobId) -> Box<dyn Pass<X>> + 'static) -> Self {
        Self {
            name: name.into(),
            reentrant: false,
            factory: Box::new(factory),
        }
    }

    /// Permit the milestone's goals to be re-requested while running.
    pub fn reentrant(mut self) -> Self {
        self.reentrant = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn is_reentrant(&self) -> bool {
        self.reentrant
    }

    pub(crate) fn instantiate(&self, job: JobId) -> Box<dyn Pass<X>> {
        (self.factory)(job)
    }
}
