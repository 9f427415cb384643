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

//! Property tests over randomly generated goal graphs.

use proptest::prelude::*;
use proptest::sample::Index;
use std::cell::Cell;
use std::rc::Rc;
use tessera_common::Source;
use tessera_frontend::{Extension, FnPass, GoalSpec, Milestone, PassContext, Scheduler};

struct TestExt;

impl Extension for TestExt {
    type Ast = ();

    fn name(&self) -> &str {
        "test"
    }

    fn milestones(&self) -> Vec<Milestone<Self>> {
        Vec::new()
    }
}

#[derive(Debug, Clone)]
struct Dag {
    /// Edges point at lower-numbered goals only, so the graph is acyclic.
    prereqs: Vec<Vec<usize>>,
    /// Each goal's own task result.
    flags: Vec<bool>,
}

fn dag() -> impl Strategy<Value = Dag> {
    (1usize..12)
        .prop_flat_map(|n| {
            (0..n)
                .map(|i| {
                    let edges = if i == 0 {
                        Just(Vec::new()).boxed()
                    } else {
                        proptest::collection::vec(0usize..i, 0..=2usize).boxed()
                    };
                    (edges, any::<bool>())
                })
                .collect::<Vec<_>>()
        })
        .prop_map(|nodes| {
            let (prereqs, flags) = nodes.into_iter().unzip();
            Dag { prereqs, flags }
        })
}

proptest! {
    /// Over any acyclic goal graph: every task body runs at most once, a
    /// goal is reached iff its own task succeeds and all its prerequisites
    /// are reached, and repeated requests answer from cache.
    #[test]
    fn test_goals_run_once_and_compose_over_random_dags(dag in dag()) {
        let mut s = Scheduler::new(TestExt);
        let job = s.add_job(Source::synthetic("P.t")).unwrap();

        let mut runs = Vec::new();
        let mut ids = Vec::new();
        for (i, &flag) in dag.flags.iter().enumerate() {
            let counter = Rc::new(Cell::new(0usize));
            let c = Rc::clone(&counter);
            let id = s.intern(GoalSpec::task(
                format!("G{i}"),
                job,
                FnPass::new(move |_cx: &mut PassContext<'_, TestExt>| {
                    c.set(c.get() + 1);
                    Ok(flag)
                }),
            ));
            runs.push(counter);
            ids.push(id);
        }
        for (i, prereqs) in dag.prereqs.iter().enumerate() {
            for &p in prereqs {
                s.add_prereq(ids[i], ids[p]);
            }
        }

        // Reference model: reached iff own flag and all prereqs reached.
        let mut expected = vec![false; dag.flags.len()];
        for i in 0..dag.flags.len() {
            expected[i] = dag.flags[i] && dag.prereqs[i].iter().all(|&p| expected[p]);
        }

        for (i, &id) in ids.iter().enumerate() {
            prop_assert_eq!(s.attempt(id), Ok(expected[i]));
        }
        for (i, counter) in runs.iter().enumerate() {
            prop_assert!(counter.get() <= 1);
            if expected[i] {
                prop_assert_eq!(counter.get(), 1);
            }
        }

        // Second sweep: identical answers, no task re-runs.
        let counts: Vec<usize> = runs.iter().map(|c| c.get()).collect();
        for (i, &id) in ids.iter().enumerate() {
            prop_assert_eq!(s.attempt(id), Ok(expected[i]));
        }
        for (i, counter) in runs.iter().enumerate() {
            prop_assert_eq!(counter.get(), counts[i]);
        }
    }

    /// A prerequisite ring of any size, with or without chords, is reported
    /// as a cyclic dependency before any task body runs.
    #[test]
    fn test_cycles_fail_without_running_any_task(
        len in 2usize..8,
        chords in proptest::collection::vec((any::<Index>(), any::<Index>()), 0..4),
    ) {
        let mut s = Scheduler::new(TestExt);
        let job = s.add_job(Source::synthetic("P.t")).unwrap();
        let runs = Rc::new(Cell::new(0usize));

        let mut ids = Vec::new();
        for i in 0..len {
            let c = Rc::clone(&runs);
            ids.push(s.intern(GoalSpec::task(
                format!("G{i}"),
                job,
                FnPass::new(move |_cx: &mut PassContext<'_, TestExt>| {
                    c.set(c.get() + 1);
                    Ok(true)
                }),
            )));
        }
        for i in 0..len {
            s.add_prereq(ids[i], ids[(i + 1) % len]);
        }
        for (a, b) in &chords {
            let a = a.index(len);
            let b = b.index(len);
            if a != b {
                s.add_prereq(ids[a], ids[b]);
            }
        }

        prop_assert!(!s.run_to_completion(ids[0]));
        prop_assert_eq!(runs.get(), 0);
        prop_assert!(s.goals().status(ids[0]).is_terminal());
        prop_assert!(s.failed());
    }
}
