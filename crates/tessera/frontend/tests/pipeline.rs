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

//! End-to-end runs of a toy front end through the scheduler: milestone
//! chains, cross-file dependencies, partial failure, and job reclamation.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tessera_common::{Diagnostic, Source};
use tessera_frontend::{
    AttemptResult, Extension, FnPass, GoalKey, GoalSpec, LazyRef, Milestone, Pass, PassContext, Scheduler,
    SchedulerConfig,
};

/// A toy language: a program is a list of tokens. `use:<file>` imports
/// another file, `bad` fails the check pass, anything else is inert.
type Program = Vec<&'static str>;

struct Toy {
    programs: Rc<HashMap<&'static str, Program>>,
    log: Rc<RefCell<Vec<String>>>,
}

impl Toy {
    fn new(programs: &[(&'static str, Program)]) -> Self {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        Self {
            programs: Rc::new(programs.iter().cloned().collect()),
            log: Rc::new(RefCell::new(Vec::new())),
        }
    }

    fn log_lines(s: &Scheduler<Toy>) -> Vec<String> {
        s.extension().log.borrow().clone()
    }
}

impl Extension for Toy {
    type Ast = Vec<String>;

    fn name(&self) -> &str {
        "toy"
    }

    fn milestones(&self) -> Vec<Milestone<Self>> {
        let programs = Rc::clone(&self.programs);
        let log = Rc::clone(&self.log);
        let parsed = Milestone::new("Parsed", move |_job| {
            let programs = Rc::clone(&programs);
            let log = Rc::clone(&log);
            let pass = FnPass::new(move |cx: &mut PassContext<'_, Toy>| {
                let name = cx.job().unwrap().source().name();
                match programs.get(name.as_str()) {
                    Some(tokens) => {
                        cx.set_ast(tokens.iter().map(|t| t.to_string()).collect());
                        log.borrow_mut().push(format!("Parsed {name}"));
                        Ok(true)
                    }
                    None => {
                        cx.report(Diagnostic::error(format!("cannot read {name}")));
                        Ok(false)
                    }
                }
            });
            Box::new(pass) as Box<dyn Pass<Toy>>
        });

        let log = Rc::clone(&self.log);
        let checked = Milestone::new("Checked", move |_job| {
            let log = Rc::clone(&log);
            let pass = FnPass::new(move |cx: &mut PassContext<'_, Toy>| {
                let name = cx.job().unwrap().source().name();
                let tokens = cx.ast().unwrap().clone();
                let mut ok = true;
                for token in &tokens {
                    if token == "bad" {
                        cx.report(Diagnostic::error(format!("bad token in {name}")));
                        ok = false;
                    } else if let Some(dep) = token.strip_prefix("use:") {
                        // Cross-file dependency: make sure the imported file
                        // is at least parsed before this one checks.
                        if let Some(dep_job) = cx.load_source(Source::synthetic(dep), true) {
                            let key = GoalKey {
                                name: "Parsed".into(),
                                job: Some(dep_job),
                                param: None,
                            };
                            let dep_parsed = cx.scheduler().goals().lookup(&key).unwrap();
                            if !cx.attempt(dep_parsed)? {
                                ok = false;
                            }
                        }
                    }
                }
                log.borrow_mut().push(format!("Checked {name}"));
                Ok(ok)
            });
            Box::new(pass) as Box<dyn Pass<Toy>>
        });

        let log = Rc::clone(&self.log);
        let emitted = Milestone::new("Emitted", move |_job| {
            let log = Rc::clone(&log);
            let pass = FnPass::new(move |cx: &mut PassContext<'_, Toy>| {
                let name = cx.job().unwrap().source().name();
                log.borrow_mut().push(format!("Emitted {name}"));
                Ok(true)
            });
            Box::new(pass) as Box<dyn Pass<Toy>>
        });

        vec![parsed, checked, emitted]
    }
}

#[test]
fn test_compile_runs_milestones_in_order_and_reclaims_job() {
    let toy = Toy::new(&[("A.t", vec!["let", "x"])]);
    let mut s = Scheduler::new(toy);

    assert!(s.compile([Source::synthetic("A.t")]));
    assert!(!s.failed());
    assert_eq!(
        Toy::log_lines(&s),
        vec!["Parsed A.t", "Checked A.t", "Emitted A.t"]
    );

    // The job reached End, so its slot is reclaimed and the source reports
    // no further work.
    assert!(s.jobs().is_empty());
    assert!(!s.source_has_job(&Source::synthetic("A.t")));
    assert_eq!(s.add_job(Source::synthetic("A.t")), None);
}

#[test]
fn test_one_failing_file_does_not_block_the_other() {
    let toy = Toy::new(&[("A.t", vec!["let", "x"]), ("B.t", vec!["bad"])]);
    let mut s = Scheduler::new(toy);

    assert!(!s.compile([Source::synthetic("A.t"), Source::synthetic("B.t")]));
    assert!(s.failed());

    let log = Toy::log_lines(&s);
    // A ran to the end despite B's failure.
    assert!(log.contains(&"Emitted A.t".to_string()));
    // B stopped at the failing check; code generation never ran for it.
    assert!(log.contains(&"Checked B.t".to_string()));
    assert!(!log.contains(&"Emitted B.t".to_string()));

    let jobs = s.command_line_jobs().to_vec();
    assert_eq!(jobs.len(), 2);
    assert!(s.job(jobs[0]).is_none(), "A should be completed");
    let b = s.job(jobs[1]).expect("B should still be active");
    assert!(b.reported_errors());
    assert!(!b.status());
    assert!(b.has_reached("Parsed"));
    assert!(!b.has_reached("Checked"));
}

#[test]
fn test_import_spawns_job_mid_run_and_barrier_finishes_it() {
    let toy = Toy::new(&[("A.t", vec!["use:B.t", "x"]), ("B.t", vec!["y"])]);
    let mut s = Scheduler::new(toy);

    assert!(s.compile([Source::synthetic("A.t")]));

    let log = Toy::log_lines(&s);
    // B was registered while A's check ran and was still driven to the end
    // by the terminal barrier's sweep.
    assert!(log.contains(&"Emitted B.t".to_string()));
    // Memoization: B parses once even though both A's import and B's own
    // milestone chain request it.
    assert_eq!(log.iter().filter(|l| *l == "Parsed B.t").count(), 1);
    assert!(s.jobs().is_empty());
    assert_eq!(s.stats().get("Parsed").unwrap().attempts, 2); // A and B
}

#[test]
fn test_command_line_only_leaves_dependencies_unfinished() {
    let toy = Toy::new(&[("A.t", vec!["use:B.t"]), ("B.t", vec!["y"])]);
    let config = SchedulerConfig::new().compile_command_line_only(true);
    let mut s = Scheduler::with_config(toy, config);

    assert!(s.compile([Source::synthetic("A.t")]));

    let log = Toy::log_lines(&s);
    // B is parsed for A's benefit but never compiled to completion.
    assert!(log.contains(&"Parsed B.t".to_string()));
    assert!(!log.contains(&"Checked B.t".to_string()));
    assert!(!log.contains(&"Emitted B.t".to_string()));

    let remaining = s.jobs();
    assert_eq!(remaining.len(), 1);
    let b = s.job(remaining[0]).unwrap();
    assert_eq!(b.source().name(), "B.t");
    assert!(b.has_reached("Parsed"));
}

#[test]
fn test_disabled_pass_is_skipped_but_job_still_completes() {
    let toy = Toy::new(&[("A.t", vec!["x"])]);
    let config = SchedulerConfig::new().disable_pass("Emitted");
    let mut s = Scheduler::with_config(toy, config);

    assert!(s.compile([Source::synthetic("A.t")]));
    let log = Toy::log_lines(&s);
    assert!(!log.contains(&"Emitted A.t".to_string()));
    assert!(s.jobs().is_empty());

    // A skipped pass counts as reached without an attempt.
    let emitted = s.stats().get("Emitted").unwrap();
    assert_eq!(emitted.attempts, 0);
    assert_eq!(emitted.reached, 1);
}

#[test]
fn test_unreadable_source_fails_cleanly() {
    let toy = Toy::new(&[("A.t", vec!["x"])]);
    let mut s = Scheduler::new(toy);

    assert!(!s.compile([Source::synthetic("A.t"), Source::synthetic("missing.t")]));
    let jobs = s.command_line_jobs().to_vec();
    assert!(s.job(jobs[0]).is_none());
    let missing = s.job(jobs[1]).unwrap();
    assert!(missing.reported_errors());
    assert_eq!(missing.errors().error_count(), 1);
}

#[test]
fn test_lookup_goal_resolves_lazy_reference() {
    let toy = Toy::new(&[("B.t", vec!["y"])]);
    let mut s = Scheduler::new(toy);

    let cell: LazyRef<String> = LazyRef::new("symbol y in B.t");
    let resolved = cell.clone();
    let goal = s.intern(GoalSpec::lookup(
        "SymbolResolved",
        "B.t::y",
        FnPass::new(move |cx: &mut PassContext<'_, Toy>| {
            let job = cx.load_source(Source::synthetic("B.t"), false).unwrap();
            let key = GoalKey {
                name: "Parsed".into(),
                job: Some(job),
                param: None,
            };
            let parsed = cx.scheduler().goals().lookup(&key).unwrap();
            if !cx.attempt(parsed)? {
                return Ok(false);
            }
            let found = cx
                .scheduler()
                .job(job)
                .unwrap()
                .ast()
                .unwrap()
                .contains(&"y".to_string());
            if found {
                resolved.update("y".to_string());
            }
            Ok(found)
        }),
    ));

    assert!(!cell.known());
    assert_eq!(s.attempt(goal), Ok(true));
    assert!(cell.known());
    assert_eq!(cell.get(), "y");

    // A second request for the same qualified name is the same goal and
    // answers from cache.
    let again = s.intern(GoalSpec::lookup(
        "SymbolResolved",
        "B.t::y",
        FnPass::new(|_cx: &mut PassContext<'_, Toy>| -> AttemptResult {
            panic!("interned body must not replace the original")
        }),
    ));
    assert_eq!(again, goal);
    assert_eq!(s.attempt(again), Ok(true));
}

#[test]
fn test_stats_cover_the_whole_run() {
    let toy = Toy::new(&[("A.t", vec!["x"]), ("B.t", vec!["bad"])]);
    let mut s = Scheduler::new(toy);
    s.compile([Source::synthetic("A.t"), Source::synthetic("B.t")]);

    let stats = s.stats();
    assert_eq!(stats.get("Parsed").unwrap().attempts, 2);
    assert_eq!(stats.get("Checked").unwrap().reached, 1);
    assert_eq!(stats.get("Checked").unwrap().unreached, 1);
    // Emitted never ran for B: its prerequisite failed.
    assert_eq!(stats.get("Emitted").unwrap().attempts, 1);
    assert!(stats.totals().attempts >= 4);
    assert!(!stats.summary().is_empty());
}
