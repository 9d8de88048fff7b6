//! Bounded worker pool that plans many items concurrently.
//!
//! Items are independent, so workers pull from a shared cursor and send
//! outcomes back over a channel. A failing item never affects the others.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use stockpilot_core::{EngineConfig, EngineError, EngineResult, ItemId};

use crate::planner::{ItemInput, ItemPlan, Planner};
use crate::report::PlanningReport;

enum Outcome {
    Planned(EngineResult<ItemPlan>, Instant),
    Skipped,
}

#[derive(Debug)]
pub struct BatchPlanner {
    planner: Planner,
    max_workers: usize,
}

impl BatchPlanner {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let max_workers = config.max_workers;
        Ok(Self {
            planner: Planner::new(config)?,
            max_workers,
        })
    }

    pub fn from_planner(planner: Planner) -> Self {
        let max_workers = planner.config().max_workers;
        Self {
            planner,
            max_workers,
        }
    }

    pub fn planner(&self) -> &Planner {
        &self.planner
    }

    /// Plan every input and collect the results.
    ///
    /// With a `deadline`, items not yet started when it passes fail with
    /// `DeadlineExceeded`. Items already running are not interrupted: they
    /// run to completion before `plan` returns, so a call can overrun the
    /// deadline by one item's planning time, and their late results are
    /// discarded as `DeadlineExceeded` too. Duplicate item ids are rejected
    /// as a whole.
    pub fn plan(&self, inputs: &[ItemInput], deadline: Option<Duration>) -> PlanningReport {
        let started = Instant::now();
        let cutoff = deadline.map(|d| started + d);
        let mut report = PlanningReport::begin(self.planner.config().clone());

        let mut seen: HashMap<&ItemId, usize> = HashMap::new();
        for input in inputs {
            *seen.entry(&input.item_id).or_default() += 1;
        }
        let queue: Vec<&ItemInput> = inputs
            .iter()
            .filter(|input| seen[&input.item_id] == 1)
            .collect();
        for (item_id, count) in seen.iter().filter(|(_, count)| **count > 1) {
            warn!(item = %item_id, count, "duplicate item input rejected");
            report.record_failure(
                (*item_id).clone(),
                EngineError::invalid_input(format!(
                    "item {item_id} supplied {count} times in one batch"
                )),
            );
        }

        let workers = self.max_workers.clamp(1, queue.len().max(1));
        info!(
            run_id = %report.run_id,
            items = queue.len(),
            workers,
            model = self.planner.model_name(),
            "planning run started"
        );

        let cursor = AtomicUsize::new(0);
        let (tx, rx) = mpsc::channel::<(usize, Outcome)>();

        thread::scope(|scope| {
            let mut spawned = 0;
            for n in 0..workers {
                let tx = tx.clone();
                let (cursor, queue, planner) = (&cursor, &queue, &self.planner);
                let spawn = thread::Builder::new()
                    .name(format!("stockpilot-worker-{n}"))
                    .spawn_scoped(scope, move || work(planner, queue, cursor, cutoff, &tx));
                match spawn {
                    Ok(_) => spawned += 1,
                    Err(e) => warn!(worker = n, error = %e, "failed to spawn planning worker"),
                }
            }
            if spawned == 0 {
                warn!("no planning workers available; planning on the calling thread");
                work(&self.planner, &queue, &cursor, cutoff, &tx);
            }
            drop(tx);

            for (index, outcome) in rx {
                let item_id = queue[index].item_id.clone();
                match outcome {
                    Outcome::Planned(_, finished) if cutoff.is_some_and(|c| finished > c) => {
                        warn!(item = %item_id, "result arrived after deadline; discarded");
                        report.record_failure(item_id.clone(), EngineError::DeadlineExceeded { item_id });
                    }
                    Outcome::Planned(Ok(plan), _) => {
                        debug!(item = %item_id, "item planned");
                        report.record_plan(plan);
                    }
                    Outcome::Planned(Err(e), _) => {
                        warn!(item = %item_id, kind = e.kind(), error = %e, "item planning failed");
                        report.record_failure(item_id, e);
                    }
                    Outcome::Skipped => {
                        report.record_failure(item_id.clone(), EngineError::DeadlineExceeded { item_id });
                    }
                }
            }
        });

        let report = report.finish();
        info!(
            run_id = %report.run_id,
            succeeded = report.success_count(),
            failed = report.failure_count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "planning run finished"
        );
        report
    }
}

fn work(
    planner: &Planner,
    queue: &[&ItemInput],
    cursor: &AtomicUsize,
    cutoff: Option<Instant>,
    tx: &mpsc::Sender<(usize, Outcome)>,
) {
    loop {
        let index = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(input) = queue.get(index) else {
            break;
        };
        let outcome = if cutoff.is_some_and(|c| Instant::now() >= c) {
            Outcome::Skipped
        } else {
            Outcome::Planned(planner.plan_item(input), Instant::now())
        };
        if tx.send((index, outcome)).is_err() {
            break;
        }
    }
}
