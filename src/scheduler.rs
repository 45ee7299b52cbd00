use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, anyhow};

/// Bounded worker pool for profile fetches.
///
/// `parallelism` lanes pull tasks in submission order from a bounded queue.
/// After a lane finishes a task it waits until `delay` has elapsed before it
/// starts the next one. [`Scheduler::run`] only returns once the producer is
/// done and every submitted task has finished, which is the drain barrier the
/// snapshot relies on.
#[derive(Debug, Clone)]
pub struct Scheduler {
    parallelism: usize,
    delay: Duration,
    queue_capacity: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub submitted: usize,
    pub completed: usize,
    /// Tasks among `completed` that panicked instead of returning.
    pub panicked: usize,
}

/// Producer handle passed to the closure given to [`Scheduler::run`].
#[derive(Debug)]
pub struct Submitter<T> {
    tx: SyncSender<T>,
    submitted: AtomicUsize,
}

impl<T> Submitter<T> {
    /// Blocks while the queue is full.
    pub fn submit(&self, task: T) -> Result<()> {
        self.tx
            .send(task)
            .map_err(|_| anyhow!("fetch queue closed"))?;
        self.submitted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    pub fn submitted(&self) -> usize {
        self.submitted.load(Ordering::Relaxed)
    }
}

impl Scheduler {
    pub fn new(parallelism: usize, delay: Duration, queue_capacity: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
            delay,
            queue_capacity: queue_capacity.max(1),
        }
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run `produce` on the calling thread while the lanes execute `work` for
    /// each submitted task. Returns the producer's value once everything drained.
    pub fn run<T, R, W, P>(&self, work: W, produce: P) -> Result<(R, DrainReport)>
    where
        T: Send,
        W: Fn(T) + Sync,
        P: FnOnce(&Submitter<T>) -> R,
    {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.parallelism)
            .thread_name(|idx| format!("fetch-lane-{idx}"))
            .build()
            .context("failed to build fetch pool")?;

        let (tx, rx) = mpsc::sync_channel::<T>(self.queue_capacity);
        let rx = Mutex::new(rx);
        let completed = AtomicUsize::new(0);
        let panicked = AtomicUsize::new(0);
        let work = &work;
        let rx = &rx;
        let completed_ref = &completed;
        let panicked_ref = &panicked;

        let (value, submitted) = pool.in_place_scope(|scope| {
            for lane in 0..self.parallelism {
                scope.spawn(move |_| {
                    let (done, failed) = run_lane(lane, rx, self.delay, work);
                    completed_ref.fetch_add(done, Ordering::Relaxed);
                    panicked_ref.fetch_add(failed, Ordering::Relaxed);
                });
            }

            let submitter = Submitter {
                tx,
                submitted: AtomicUsize::new(0),
            };
            let value = produce(&submitter);
            let submitted = submitter.submitted();
            // Closing the queue lets idle lanes exit once it is empty.
            drop(submitter);
            (value, submitted)
        });

        let report = DrainReport {
            submitted,
            completed: completed.load(Ordering::Relaxed),
            panicked: panicked.load(Ordering::Relaxed),
        };
        log::debug!(
            "scheduler drained: {} submitted, {} completed, {} panicked",
            report.submitted,
            report.completed,
            report.panicked
        );
        Ok((value, report))
    }
}

/// Returns how many tasks the lane ran and how many of those panicked.
fn run_lane<T, W>(
    lane: usize,
    rx: &Mutex<Receiver<T>>,
    delay: Duration,
    work: &W,
) -> (usize, usize)
where
    W: Fn(T),
{
    let mut done = 0;
    let mut panicked = 0;
    let mut last_finished: Option<Instant> = None;
    loop {
        let next = {
            let rx = rx.lock().unwrap_or_else(PoisonError::into_inner);
            rx.recv()
        };
        let Ok(task) = next else {
            break;
        };

        if let Some(finished) = last_finished {
            let elapsed = finished.elapsed();
            if elapsed < delay {
                thread::sleep(delay - elapsed);
            }
        }

        // A panic stays with its task; the lane keeps draining the queue.
        if panic::catch_unwind(AssertUnwindSafe(|| work(task))).is_err() {
            log::warn!("task on fetch lane {lane} panicked; continuing");
            panicked += 1;
        }
        done += 1;
        last_finished = Some(Instant::now());
    }
    log::trace!("lane {lane} finished after {done} tasks");
    (done, panicked)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn all_submitted_tasks_finish_before_run_returns() {
        let scheduler = Scheduler::new(2, Duration::ZERO, 4);
        let seen = Mutex::new(Vec::new());

        let (value, report) = scheduler
            .run(
                |task: u32| seen.lock().unwrap().push(task),
                |submitter| {
                    for task in 0..50 {
                        submitter.submit(task).unwrap();
                    }
                    "produced"
                },
            )
            .unwrap();

        assert_eq!(value, "produced");
        assert_eq!(
            report,
            DrainReport {
                submitted: 50,
                completed: 50,
                panicked: 0,
            }
        );
        let mut seen = seen.into_inner().unwrap();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn never_more_than_parallelism_tasks_in_flight() {
        let scheduler = Scheduler::new(2, Duration::ZERO, 1);
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (_, report) = scheduler
            .run(
                |_: usize| {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(5));
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                },
                |submitter| {
                    for task in 0..20 {
                        submitter.submit(task).unwrap();
                    }
                },
            )
            .unwrap();

        assert_eq!(report.completed, 20);
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn single_lane_preserves_submission_order() {
        let scheduler = Scheduler::new(1, Duration::ZERO, 2);
        let seen = Mutex::new(Vec::new());

        scheduler
            .run(
                |task: char| seen.lock().unwrap().push(task),
                |submitter| {
                    for task in ['a', 'b', 'c', 'd', 'e'] {
                        submitter.submit(task).unwrap();
                    }
                },
            )
            .unwrap();

        assert_eq!(seen.into_inner().unwrap(), vec!['a', 'b', 'c', 'd', 'e']);
    }

    #[test]
    fn lane_waits_between_consecutive_tasks() {
        let delay = Duration::from_millis(40);
        let scheduler = Scheduler::new(1, delay, 4);
        let starts = Mutex::new(Vec::new());

        scheduler
            .run(
                |_: u8| starts.lock().unwrap().push(Instant::now()),
                |submitter| {
                    for task in 0..3 {
                        submitter.submit(task).unwrap();
                    }
                },
            )
            .unwrap();

        let starts = starts.into_inner().unwrap();
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= delay);
        }
    }

    #[test]
    fn empty_run_drains_immediately() {
        let scheduler = Scheduler::new(2, Duration::from_secs(5), 1);
        let started = Instant::now();
        let (_, report) = scheduler.run(|_: ()| {}, |_| ()).unwrap();
        assert_eq!(report, DrainReport::default());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn zero_parallelism_is_clamped_to_one_lane() {
        let scheduler = Scheduler::new(0, Duration::ZERO, 0);
        assert_eq!(scheduler.parallelism(), 1);
        let (_, report) = scheduler
            .run(|_: u8| {}, |submitter| submitter.submit(1).unwrap())
            .unwrap();
        assert_eq!(report.completed, 1);
    }

    #[test]
    fn panicking_tasks_do_not_stall_the_pool() {
        let scheduler = Scheduler::new(2, Duration::ZERO, 1);
        let survivors = AtomicUsize::new(0);

        let (_, report) = scheduler
            .run(
                |task: u32| {
                    if task % 3 == 0 {
                        panic!("task {task} blew up");
                    }
                    survivors.fetch_add(1, Ordering::SeqCst);
                },
                |submitter| {
                    for task in 0..10 {
                        submitter.submit(task).unwrap();
                    }
                },
            )
            .unwrap();

        assert_eq!(report.submitted, 10);
        assert_eq!(report.completed, 10);
        assert_eq!(report.panicked, 4);
        assert_eq!(survivors.load(Ordering::SeqCst), 6);
    }

    #[test]
    fn every_task_panicking_still_returns() {
        let scheduler = Scheduler::new(2, Duration::ZERO, 1);
        let (_, report) = scheduler
            .run(
                |_: u8| panic!("boom"),
                |submitter| {
                    for task in 0..10 {
                        submitter.submit(task).unwrap();
                    }
                },
            )
            .unwrap();
        assert_eq!(report.completed, 10);
        assert_eq!(report.panicked, 10);
    }
}
