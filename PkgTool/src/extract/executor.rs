//! Entry executors
//!
//! An executor runs an entry function over a range of indices and hands each
//! outcome to a completion callback in index order. The sequential executor
//! is the reference behavior; the parallel one spreads entries over a rayon
//! pool and reorders completions before reporting them.

use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::mpsc;

use rayon::prelude::*;

use super::entry::ExtractionOutcome;

/// Entry function shared with worker threads.
pub type EntryFn<'a> = &'a (dyn Fn(u32) -> ExtractionOutcome + Sync);

/// How entries of one package are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Executor {
    /// One entry at a time, in index order
    #[default]
    Sequential,
    /// Rayon pool; `None` uses one thread per available core
    Parallel {
        /// Worker thread count
        threads: Option<usize>,
    },
}

impl Executor {
    /// Run `entry_fn` for every index in `indices`.
    ///
    /// `on_complete` is called once per outcome, strictly in index order,
    /// regardless of the order in which workers finish. The returned outcomes
    /// are in index order as well.
    pub fn run(
        &self,
        indices: Range<u32>,
        entry_fn: EntryFn<'_>,
        on_complete: &mut dyn FnMut(&ExtractionOutcome),
    ) -> Vec<ExtractionOutcome> {
        match *self {
            Self::Sequential => run_sequential(indices, entry_fn, on_complete),
            Self::Parallel { threads } => run_parallel(indices, threads, entry_fn, on_complete),
        }
    }
}

fn run_sequential(
    indices: Range<u32>,
    entry_fn: EntryFn<'_>,
    on_complete: &mut dyn FnMut(&ExtractionOutcome),
) -> Vec<ExtractionOutcome> {
    indices
        .map(|index| {
            let outcome = entry_fn(index);
            on_complete(&outcome);
            outcome
        })
        .collect()
}

fn run_parallel(
    indices: Range<u32>,
    threads: Option<usize>,
    entry_fn: EntryFn<'_>,
    on_complete: &mut dyn FnMut(&ExtractionOutcome),
) -> Vec<ExtractionOutcome> {
    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!("Cannot build worker pool ({e}), extracting sequentially");
            return run_sequential(indices, entry_fn, on_complete);
        }
    };

    let (tx, rx) = mpsc::channel::<ExtractionOutcome>();
    let mut outcomes = Vec::with_capacity(indices.len());

    std::thread::scope(|scope| {
        let pool = &pool;
        let work = indices.clone();
        scope.spawn(move || {
            pool.install(|| {
                work.into_par_iter().for_each_with(tx, |tx, index| {
                    // Receiver outlives the workers; a send error is unreachable
                    let _ = tx.send(entry_fn(index));
                });
            });
        });

        // Completions arrive in any order; release them by index
        let mut pending = BTreeMap::new();
        let mut next = indices.start;
        for outcome in rx {
            pending.insert(outcome.entry_index, outcome);
            while let Some(outcome) = pending.remove(&next) {
                on_complete(&outcome);
                outcomes.push(outcome);
                next += 1;
            }
        }

        for (_, outcome) in pending {
            on_complete(&outcome);
            outcomes.push(outcome);
        }
    });

    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn slow_then_fail(index: u32) -> ExtractionOutcome {
        // Early indices finish last so reordering is exercised
        thread::sleep(Duration::from_millis(u64::from(20 - index.min(20))));
        if index % 7 == 3 {
            ExtractionOutcome::failure(index, "bad entry")
        } else {
            ExtractionOutcome::success(index)
        }
    }

    fn collect(executor: Executor, count: u32) -> (Vec<ExtractionOutcome>, Vec<u32>) {
        let mut seen = Vec::new();
        let outcomes = executor.run(0..count, &slow_then_fail, &mut |o| seen.push(o.entry_index));
        (outcomes, seen)
    }

    #[test]
    fn test_sequential_in_order() {
        let (outcomes, seen) = collect(Executor::Sequential, 12);
        assert_eq!(seen, (0..12).collect::<Vec<_>>());
        assert_eq!(outcomes.len(), 12);
        assert!(!outcomes[3].succeeded);
        assert!(!outcomes[10].succeeded);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let (sequential, _) = collect(Executor::Sequential, 25);
        let (parallel, seen) = collect(Executor::Parallel { threads: Some(4) }, 25);
        assert_eq!(parallel, sequential);
        assert_eq!(seen, (0..25).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_range() {
        let (outcomes, seen) = collect(Executor::Parallel { threads: None }, 0);
        assert!(outcomes.is_empty());
        assert!(seen.is_empty());
    }
}
