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

//! The goal-directed incremental scheduler
//!
//! The scheduler satisfies goals. To reach a goal it first attempts the
//! goal's prerequisites, in declared order, then runs the goal's task body
//! once; the resulting status is cached forever, so semantically identical
//! work requested from multiple call sites executes at most once. Cross-file
//! dependencies discovered mid-task re-enter the scheduler synchronously;
//! re-entry into a goal that is already running is diagnosed as a cyclic
//! dependency rather than recursing without bound.
//!
//! The model is single-threaded and cooperative: exactly one task body runs
//! at any instant, "suspension" is ordinary recursive descent, and there is
//! no cancellation beyond cycle unwinding.

use crate::config::SchedulerConfig;
use crate::error::{AttemptResult, CyclicDependency};
use crate::extension::Extension;
use crate::goal::{BarrierScope, GoalId, GoalKey, GoalSpec, Status};
use crate::intern::GoalTable;
use crate::job::{Job, JobId, JobSlot};
use crate::pass::{FnPass, PassContext};
use crate::stats::Stats;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tessera_common::{Diagnostic, ErrorSink, Source};
use tracing::{debug, error, info, warn};

/// Name of the final per-job milestone, appended by the scheduler itself.
pub const END_MILESTONE: &str = "End";

/// Name of the built-in terminal barrier over every requested job's `End`.
pub const END_ALL_GOAL: &str = "EndAll";

/// Drives an extension's goals over a set of jobs.
///
/// Owns the goal intern table and the job table for the lifetime of a
/// compilation run.
pub struct Scheduler<X: Extension> {
    extension: X,
    config: SchedulerConfig,
    goals: GoalTable<X>,
    jobs: Vec<JobSlot<X>>,
    job_ids: HashMap<Source, JobId>,
    /// Jobs the user named explicitly, in request order.
    command_line_jobs: Vec<JobId>,
    /// Jobs requested for full compilation (command-line jobs plus jobs
    /// loaded with the compile flag).
    should_compile: BTreeSet<JobId>,
    /// The goal whose task body is currently executing, if any.
    current_goal: Option<GoalId>,
    /// Goals on the active call stack, outermost first. Diagnostics only;
    /// cycle detection itself uses the status cell.
    stack: Vec<GoalId>,
    stats: Stats,
    /// Sink for diagnostics reported by job-less goals.
    errors: ErrorSink,
    /// True once any pass has failed.
    failed: bool,
    end_all: Option<GoalId>,
}

impl<X: Extension> Scheduler<X> {
    pub fn new(extension: X) -> Self {
        Self::with_config(extension, SchedulerConfig::default())
    }

    pub fn with_config(extension: X, config: SchedulerConfig) -> Self {
        Self {
            extension,
            config,
            goals: GoalTable::new(),
            jobs: Vec::new(),
            job_ids: HashMap::new(),
            command_line_jobs: Vec::new(),
            should_compile: BTreeSet::new(),
            current_goal: None,
            stack: Vec::new(),
            stats: Stats::new(),
            errors: ErrorSink::new(),
            failed: false,
            end_all: None,
        }
    }

    pub fn extension(&self) -> &X {
        &self.extension
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Diagnostics reported by goals that target no job.
    pub fn errors(&self) -> &ErrorSink {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut ErrorSink {
        &mut self.errors
    }

    /// True once any pass has failed anywhere in the run.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn goals(&self) -> &GoalTable<X> {
        &self.goals
    }

    /// Canonicalize a freshly constructed goal. Callers must always use the
    /// returned id; if an equal goal was interned before, the new spec's
    /// body is dropped.
    pub fn intern(&mut self, spec: GoalSpec<X>) -> GoalId {
        self.goals.intern(spec)
    }

    /// Append a prerequisite to a goal that has not started running.
    pub fn add_prereq(&mut self, goal: GoalId, prereq: GoalId) {
        self.goals.add_prereq(goal, prereq);
    }

    /// True iff the goal has been reached.
    pub fn reached(&self, goal: GoalId) -> bool {
        self.goals.status(goal) == Status::Success
    }

    pub fn current_goal(&self) -> Option<GoalId> {
        self.current_goal
    }

    /// The job targeted by the currently running goal, if any.
    pub fn current_job(&self) -> Option<JobId> {
        self.current_goal.and_then(|g| self.goals.job(g))
    }

    // ---- job table ------------------------------------------------------

    /// Register or retrieve the job for a source. Returns `None` if the
    /// source's compilation already completed: there is no further work, and
    /// a job is never recreated for a source.
    pub fn add_job(&mut self, source: Source) -> Option<JobId> {
        if let Some(&id) = self.job_ids.get(&source) {
            return match &self.jobs[id.index()] {
                JobSlot::Completed => None,
                JobSlot::Active(_) => Some(id),
            };
        }
        let id = JobId::new(self.jobs.len());
        debug!(
            "adding job for {} at the request of goal {:?}",
            source,
            self.current_goal.map(|g| self.goals.name(g).to_owned())
        );
        self.jobs.push(JobSlot::Active(Job::new(source.clone())));
        self.job_ids.insert(source, id);
        Some(id)
    }

    /// Register a job for a source and set up its milestone chain.
    ///
    /// With `compile` set, the job is requested for full compilation and the
    /// terminal barrier will wait for its `End`.
    pub fn load_source(&mut self, source: Source, compile: bool) -> Option<JobId> {
        let job = self.add_job(source)?;
        self.add_dependencies_for_job(job, compile);
        Some(job)
    }

    pub fn source_has_job(&self, source: &Source) -> bool {
        match self.job_ids.get(source) {
            Some(id) => matches!(self.jobs[id.index()], JobSlot::Active(_)),
            None => false,
        }
    }

    /// All jobs currently being compiled, in registration order. Completed
    /// jobs are excluded.
    pub fn jobs(&self) -> Vec<JobId> {
        (0..self.jobs.len())
            .map(JobId::new)
            .filter(|id| matches!(self.jobs[id.index()], JobSlot::Active(_)))
            .collect()
    }

    pub fn job(&self, id: JobId) -> Option<&Job<X>> {
        match &self.jobs[id.index()] {
            JobSlot::Active(job) => Some(job),
            JobSlot::Completed => None,
        }
    }

    pub fn job_mut(&mut self, id: JobId) -> Option<&mut Job<X>> {
        match &mut self.jobs[id.index()] {
            JobSlot::Active(job) => Some(job),
            JobSlot::Completed => None,
        }
    }

    pub fn command_line_jobs(&self) -> &[JobId] {
        &self.command_line_jobs
    }

    /// Whether the job should be compiled to completion.
    pub fn should_compile(&self, job: JobId) -> bool {
        if self.command_line_jobs.contains(&job) {
            return true;
        }
        if self.config.compile_command_line_only {
            return false;
        }
        self.should_compile.contains(&job)
    }

    /// Replace the job's slot with the completion sentinel, releasing the
    /// artifact. Requests for this source afterwards return "no further
    /// work".
    pub(crate) fn complete_job(&mut self, id: JobId) {
        if let JobSlot::Active(job) = &self.jobs[id.index()] {
            debug!("completed job {}", job.source());
        }
        self.jobs[id.index()] = JobSlot::Completed;
    }

    // ---- goal construction ----------------------------------------------

    /// The milestone goals for a job, in phase order, ending with
    /// `End(job)`. Interns every goal; the list may include goals already
    /// run if the job was registered before.
    pub fn goals_for(&mut self, job: JobId) -> Vec<GoalId> {
        let milestones = self.extension.milestones();
        let mut out = Vec::with_capacity(milestones.len() + 1);
        for milestone in &milestones {
            let mut spec = GoalSpec::task_boxed(milestone.name(), job, milestone.instantiate(job));
            if milestone.is_reentrant() {
                spec = spec.reentrant();
            }
            out.push(self.goals.intern(spec));
        }
        out.push(self.end_goal(job));
        out
    }

    /// The final milestone for a job: marks the job complete and releases
    /// its slot in the job table.
    pub fn end_goal(&mut self, job: JobId) -> GoalId {
        self.goals.intern(GoalSpec::task(
            END_MILESTONE,
            job,
            FnPass::new(|cx: &mut PassContext<'_, X>| {
                cx.complete_job();
                Ok(true)
            }),
        ))
    }

    /// The terminal goal: every job requested for compilation has reached
    /// `End`.
    pub fn end_all(&mut self) -> GoalId {
        match self.end_all {
            Some(goal) => goal,
            None => {
                let goal = self
                    .goals
                    .intern(GoalSpec::barrier(END_ALL_GOAL, END_MILESTONE, BarrierScope::CommandLine));
                self.end_all = Some(goal);
                goal
            }
        }
    }

    /// A named barrier: reached when every job in scope has reached the
    /// given milestone.
    pub fn barrier(&mut self, name: impl Into<String>, milestone: impl Into<String>, scope: BarrierScope) -> GoalId {
        self.goals.intern(GoalSpec::barrier(name, milestone, scope))
    }

    /// Chain the job's milestones into a strict total order: each milestone
    /// gains the previous not-yet-reached milestone as a prerequisite.
    /// Tolerant of re-registration: goals that already started are left
    /// untouched.
    pub fn add_dependencies_for_job(&mut self, job: JobId, compile: bool) {
        let goals = self.goals_for(job);
        let mut prev: Option<GoalId> = None;
        for goal in goals {
            if let Some(prev) = prev {
                self.goals.chain_prereq(goal, prev);
            }
            if !self.reached(goal) {
                prev = Some(goal);
            }
        }
        if compile {
            self.should_compile.insert(job);
        }
    }

    // ---- the core algorithm ---------------------------------------------

    /// Attempt a goal: resolve its prerequisites, run its task body at most
    /// once, cache the terminal status.
    ///
    /// Returns `Ok(true)` iff the goal ends in success. Re-requesting a goal
    /// that is already on the active call stack yields `Err`: a cyclic
    /// dependency, which unwinds to the top-level driver. A goal already
    /// terminal returns its cached result immediately; the task body never
    /// runs twice.
    pub fn attempt(&mut self, goal: GoalId) -> AttemptResult {
        debug_assert!(
            self.current_goal.map_or(true, |g| self.goals.status(g).is_running()),
            "current goal is not in a running state"
        );

        match self.goals.status(goal) {
            Status::Success => return Ok(true),
            Status::Fail => return Ok(false),
            Status::Running | Status::RunningRecursive | Status::RunningWillFail => {
                if self.goals.is_reentrant(goal) {
                    self.goals.set_status(goal, Status::RunningRecursive);
                    // Provisional answer: the goal is mid-run, so it has not
                    // been reached yet.
                    return Ok(false);
                }
                self.goals.set_status(goal, Status::RunningWillFail);
                let name = self.goals.name(goal).to_owned();
                warn!("goal {} re-entered while running: cyclic dependency", name);
                return Err(CyclicDependency::new(name, self.active_goal_names()));
            }
            Status::Pending => {}
        }

        self.goals.set_status(goal, Status::Running);
        let previous = self.current_goal.replace(goal);
        self.stack.push(goal);

        let outcome = self.resolve_and_run(goal);

        self.stack.pop();
        self.current_goal = previous;

        let name = self.goals.name(goal).to_owned();
        match outcome {
            Ok(task_ok) => {
                // Success only if the task reported it and no re-entry
                // invalidated the goal while it ran.
                let reached = task_ok && self.goals.status(goal) == Status::Running;
                if reached {
                    self.goals.set_status(goal, Status::Success);
                    self.stats.record_reached(&name);
                    if let Some(id) = self.goals.job(goal) {
                        if let Some(job) = self.job_mut(id) {
                            job.record_reached(&name);
                        }
                    }
                    debug!("completed pass for {}", name);
                } else {
                    self.goals.set_status(goal, Status::Fail);
                    self.failed = true;
                    self.stats.record_unreached(&name);
                    debug!("completed (unreached) pass for {}", name);
                }
                Ok(reached)
            }
            Err(cycle) => {
                // The cycle unwinds through this frame; leave the goal in a
                // determinate state before re-propagating.
                self.goals.set_status(goal, Status::Fail);
                self.failed = true;
                self.stats.record_unreached(&name);
                Err(cycle)
            }
        }
    }

    /// Top-level driver. A cyclic-dependency signal that escapes to this
    /// level is swallowed and reported as overall failure rather than
    /// crashing the run.
    pub fn run_to_completion(&mut self, goal: GoalId) -> bool {
        let okay = match self.attempt(goal) {
            Ok(okay) => okay,
            Err(cycle) => {
                warn!(
                    "compilation did not complete: {}; active goals: [{}]",
                    cycle,
                    cycle.stack.join(", ")
                );
                false
            }
        };
        info!(
            "finished all passes for {} -- {}",
            self.extension.name(),
            if okay { "okay" } else { "failed" }
        );
        okay
    }

    /// Run every requested job to its `End` goal.
    pub fn run(&mut self) -> bool {
        let end_all = self.end_all();
        self.run_to_completion(end_all)
    }

    /// Load the given sources as command-line jobs and compile them all.
    /// The main entry point. Returns true iff every requested job reached
    /// `End`.
    pub fn compile<I>(&mut self, sources: I) -> bool
    where
        I: IntoIterator<Item = Source>,
    {
        for source in sources {
            if let Some(job) = self.load_source(source.user_specified(), true) {
                if !self.command_line_jobs.contains(&job) {
                    self.command_line_jobs.push(job);
                }
            }
        }
        self.run()
    }

    // ---- internals ------------------------------------------------------

    fn resolve_and_run(&mut self, goal: GoalId) -> AttemptResult {
        if self.goals.barrier_spec(goal).is_some() {
            return self.run_barrier(goal);
        }

        // Prerequisites in declared order, short-circuiting on the first
        // failure: the task body never runs after a failed prerequisite.
        let prereqs = self.goals.prereqs(goal).to_vec();
        for prereq in prereqs {
            if !self.attempt(prereq)? {
                debug!(
                    "prerequisite {} failed; {} is unreachable",
                    self.goals.name(prereq),
                    self.goals.name(goal)
                );
                return Ok(false);
            }
        }

        self.run_task(goal)
    }

    /// Barrier resolution: attempt the named milestone for every job in
    /// scope. Unlike ordinary prerequisites this attempts all of them, so
    /// one file's failure does not stop unrelated jobs from being driven to
    /// completion, and it sweeps to a fixpoint because attempting a
    /// milestone can register new jobs the barrier must still cover.
    fn run_barrier(&mut self, goal: GoalId) -> AttemptResult {
        let Some(spec) = self.goals.barrier_spec(goal) else {
            return Ok(true);
        };
        let mut all_ok = true;

        let explicit = self.goals.prereqs(goal).to_vec();
        for prereq in explicit {
            all_ok &= self.attempt(prereq)?;
        }

        let mut attempted: HashSet<JobId> = HashSet::new();
        loop {
            let pending: Vec<JobId> = self
                .barrier_targets(spec.scope)
                .into_iter()
                .filter(|job| !attempted.contains(job))
                .collect();
            if pending.is_empty() {
                break;
            }
            for job in pending {
                attempted.insert(job);
                let target = self.milestone_goal(&spec.milestone, job);
                all_ok &= self.attempt(target)?;
            }
        }
        Ok(all_ok)
    }

    fn barrier_targets(&self, scope: BarrierScope) -> Vec<JobId> {
        match scope {
            BarrierScope::AllJobs => (0..self.jobs.len()).map(JobId::new).collect(),
            BarrierScope::CommandLine => {
                if self.config.compile_command_line_only {
                    self.command_line_jobs.clone()
                } else {
                    self.should_compile.iter().copied().collect()
                }
            }
        }
    }

    /// The interned goal for a milestone of a job, building the job's goal
    /// chain first if it was registered without one.
    fn milestone_goal(&mut self, milestone: &str, job: JobId) -> GoalId {
        let key = GoalKey {
            name: milestone.to_owned(),
            job: Some(job),
            param: None,
        };
        if let Some(id) = self.goals.lookup(&key) {
            return id;
        }
        self.add_dependencies_for_job(job, false);
        self.goals
            .lookup(&key)
            .unwrap_or_else(|| panic!("extension {} defines no milestone `{}`", self.extension.name(), milestone))
    }

    /// Run the goal's task body. All prerequisites are already satisfied.
    fn run_task(&mut self, goal: GoalId) -> AttemptResult {
        let name = self.goals.name(goal).to_owned();

        if self.config.disabled_passes.contains(&name) {
            debug!("skipping pass {}", name);
            return Ok(true);
        }

        debug!("running pass for {}", name);
        let job = self.goals.job(goal);
        if let Some(id) = job {
            if let Some(j) = self.job_mut(id) {
                j.snapshot_error_count();
            }
        }

        self.stats.record_attempt(&name);
        let start = Instant::now();

        let result = match self.goals.take_task(goal) {
            Some(mut task) => {
                let mut cx = PassContext {
                    scheduler: self,
                    goal,
                    job,
                };
                match panic::catch_unwind(AssertUnwindSafe(|| task.run(&mut cx))) {
                    Ok(result) => result,
                    Err(_) => {
                        // Deterministic failure policy for unexpected faults:
                        // the goal fails, the tables stay intact, and repeated
                        // top-level requests see the cached failure.
                        error!("pass {} aborted unexpectedly; failing the goal", name);
                        if let Some(j) = job.and_then(|id| self.job_mut(id)) {
                            j.errors_mut().report(Diagnostic::fatal(format!("pass {} aborted unexpectedly", name)));
                        }
                        Ok(false)
                    }
                }
            }
            // Marker goals have no body.
            None => Ok(true),
        };

        self.stats.record_time(&name, start.elapsed());

        if let Some(j) = job.and_then(|id| self.job_mut(id)) {
            j.note_reported_errors();
            if let Ok(ok) = &result {
                j.update_status(*ok);
            }
        }

        result
    }

    fn active_goal_names(&self) -> Vec<String> {
        self.stack.iter().map(|g| self.goals.name(*g).to_owned()).collect()
    }
}
