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

//! Goal-directed incremental pass scheduling for extensible compilers
//!
//! An [`Extension`] describes a language front end as an ordered list of
//! milestones. The [`Scheduler`] turns each source file into a [`Job`],
//! interns one goal per milestone per job, and satisfies goals on demand:
//! prerequisites first, then the goal's pass body, exactly once, with the
//! outcome cached. Cross-file dependencies discovered while a pass runs
//! re-enter the scheduler synchronously, and genuine dependency cycles are
//! reported as [`CyclicDependency`] instead of looping.
//!
//! ```
//! use tessera_frontend::{Extension, Milestone, Scheduler, VisitorPass};
//! use tessera_common::Source;
//!
//! struct Calc;
//!
//! impl Extension for Calc {
//!     type Ast = Vec<i64>;
//!
//!     fn name(&self) -> &str {
//!         "calc"
//!     }
//!
//!     fn milestones(&self) -> Vec<Milestone<Self>> {
//!         use tessera_frontend::{FnPass, Pass, PassContext};
//!         vec![Milestone::new("Parsed", |_job| {
//!             let pass = FnPass::new(|cx: &mut PassContext<'_, Calc>| {
//!                 cx.set_ast(vec![1, 2, 3]);
//!                 Ok(true)
//!             });
//!             Box::new(pass) as Box<dyn Pass<Calc>>
//!         })]
//!     }
//! }
//!
//! let mut scheduler = Scheduler::new(Calc);
//! assert!(scheduler.compile([Source::synthetic("input.calc")]));
//! ```

pub mod config;
pub mod error;
pub mod extension;
pub mod goal;
pub mod intern;
pub mod job;
pub mod lazy;
pub mod pass;
pub mod scheduler;
pub mod stats;

pub use config::SchedulerConfig;
pub use error::{AttemptResult, CyclicDependency};
pub use extension::{Extension, Milestone};
pub use goal::{BarrierScope, GoalId, GoalKey, GoalSpec, Status};
pub use intern::GoalTable;
pub use job::{Job, JobId};
pub use lazy::LazyRef;
pub use pass::{AstVisitor, FnPass, Pass, PassContext, VisitorPass};
pub use scheduler::{Scheduler, END_ALL_GOAL, END_MILESTONE};
pub use stats::{GoalStats, Stats};
