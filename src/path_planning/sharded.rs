//! Multi-threaded RRT* with sharded sampling
//!
//! Worker threads sample, find the nearest node and collision-check the
//! steered edge under a shared read lock, then hand the surviving
//! candidates to the calling thread over a bounded channel. Only the
//! calling thread takes the write lock, so insertion, rewiring and the goal
//! check stay serialised exactly as in the single-threaded planner.
//!
//! Nodes are never removed or moved, so a candidate computed against an
//! older snapshot of the tree is still a valid child of its nearest node.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockWriteGuard};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use log::{debug, info};

use crate::common::{PlanningError, PlanningResult, Point2D};
use crate::environment::ObstacleField;
use crate::path_planning::events::PlannerObserver;
use crate::path_planning::rrt_star::{CancelToken, PlanReport, PlanningRequest, RRTStar, RRTStarConfig};
use crate::path_planning::rrt_star::DefaultSampler;
use crate::path_planning::sampler::{goal_biased, Sampler};
use crate::path_planning::tree::NodeHandle;

/// Candidate from a worker; `None` when its resample attempts ran out
type Proposal = Option<(Point2D, NodeHandle)>;

/// Proposals buffered per worker
const QUEUE_DEPTH_PER_WORKER: usize = 4;

const RECV_TIMEOUT: Duration = Duration::from_millis(20);

pub struct ShardedRRTStar {
    session: RwLock<RRTStar>,
    workers: usize,
}

impl ShardedRRTStar {
    pub fn new(
        field: ObstacleField,
        request: PlanningRequest,
        config: RRTStarConfig,
        workers: usize,
    ) -> PlanningResult<Self> {
        if workers == 0 {
            return Err(PlanningError::InvalidConfiguration("workers must be > 0".to_string()));
        }
        let session = RRTStar::new(field, request, config)?;
        Ok(ShardedRRTStar { session: RwLock::new(session), workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Finished session, for edge and path inspection
    pub fn into_session(self) -> PlanningResult<RRTStar> {
        self.session.into_inner().map_err(|_| poisoned())
    }

    /// Same termination rules as [`RRTStar::run`]. Events are delivered on
    /// the calling thread.
    pub fn run<O: PlannerObserver + ?Sized>(&mut self, cancel: &CancelToken, observer: &mut O) -> PlanningResult<PlanReport> {
        let started = Instant::now();
        let samplers = self.worker_samplers()?;
        let attempts = self.lock()?.config().max_resample_attempts;
        self.lock()?.log_start();
        info!("sharded sampling over {} workers", self.workers);

        let session = &self.session;
        let stop = AtomicBool::new(false);
        let (tx, rx) = bounded::<Proposal>(self.workers * QUEUE_DEPTH_PER_WORKER);

        thread::scope(|scope| {
            for (worker, sampler) in samplers.into_iter().enumerate() {
                let tx = tx.clone();
                let stop = &stop;
                scope.spawn(move || {
                    let sent = propose_loop(session, stop, sampler, tx, attempts);
                    debug!("worker {} stopped after {} proposals", worker, sent);
                });
            }
            drop(tx);

            let result = drive(session, &rx, cancel, started, observer);

            // Unblock workers waiting on a full queue
            stop.store(true, Ordering::Relaxed);
            drop(rx);
            result
        })
    }

    fn lock(&self) -> PlanningResult<RwLockWriteGuard<'_, RRTStar>> {
        write(&self.session)
    }

    /// One sampler per worker; seeded runs derive a distinct seed per worker.
    fn worker_samplers(&self) -> PlanningResult<Vec<DefaultSampler>> {
        let guard = self.lock()?;
        let request = *guard.request();
        let config = guard.config();
        (0..self.workers)
            .map(|worker| {
                let seed = config.seed.map(|seed| seed.wrapping_add(worker as u64 + 1));
                goal_biased(request.bounds, request.goal, config.goal_sample_rate, seed)
            })
            .collect()
    }
}

fn poisoned() -> PlanningError {
    PlanningError::InvariantViolation("planner state lock poisoned".to_string())
}

fn write(session: &RwLock<RRTStar>) -> PlanningResult<RwLockWriteGuard<'_, RRTStar>> {
    session.write().map_err(|_| poisoned())
}

/// Writer side: apply proposals until the session reports a stop.
fn drive<O: PlannerObserver + ?Sized>(
    session: &RwLock<RRTStar>,
    rx: &Receiver<Proposal>,
    cancel: &CancelToken,
    started: Instant,
    observer: &mut O,
) -> PlanningResult<PlanReport> {
    loop {
        if let Some(report) = write(session)?.poll_stop(cancel, started, observer)? {
            return Ok(report);
        }
        match rx.recv_timeout(RECV_TIMEOUT) {
            Ok(proposal) => {
                write(session)?.apply(proposal, observer)?;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(PlanningError::InvariantViolation("all sampling workers exited".to_string()))
            }
        }
    }
}

/// Worker body. Returns the number of proposals sent.
fn propose_loop<S: Sampler>(
    session: &RwLock<RRTStar>,
    stop: &AtomicBool,
    mut sampler: S,
    tx: Sender<Proposal>,
    attempts: usize,
) -> usize {
    let mut sent = 0;
    while !stop.load(Ordering::Relaxed) {
        let proposal = {
            let guard = match session.read() {
                Ok(guard) => guard,
                Err(_) => return sent,
            };
            (0..attempts).find_map(|_| guard.candidate_from(sampler.sample()))
        };
        if tx.send(proposal).is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::AreaBounds;
    use crate::environment::Obstacle;
    use crate::path_planning::events::{EventRecorder, NullObserver};
    use crate::path_planning::rrt_star::StopReason;

    fn request() -> PlanningRequest {
        PlanningRequest::new(
            Point2D::new(100.0, 100.0),
            Point2D::new(600.0, 800.0),
            AreaBounds::from_size(1000.0, 1000.0),
        )
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = ShardedRRTStar::new(ObstacleField::empty(), request(), RRTStarConfig::default(), 0);
        assert!(matches!(result, Err(PlanningError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_sharded_run_finds_valid_path() {
        let field = ObstacleField::from_preset(0).unwrap();
        let config = RRTStarConfig { max_iterations: 20_000, seed: Some(17), ..Default::default() };
        let mut planner = ShardedRRTStar::new(field.clone(), request(), config, 4).unwrap();
        let mut recorder = EventRecorder::new();
        let report = planner.run(&CancelToken::new(), &mut recorder).unwrap();

        assert_eq!(report.stop, StopReason::GoalReached);
        let path = report.path.unwrap();
        assert_eq!(path.first(), Some(&Point2D::new(100.0, 100.0)));
        assert_eq!(path.last(), Some(&Point2D::new(600.0, 800.0)));
        for pair in path.points.windows(2) {
            assert!(!field.segment_collides(&pair[0], &pair[1]));
        }

        let session = planner.into_session().unwrap();
        assert!(session.tree().validate().is_ok());
        assert_eq!(recorder.insertions() + 2, session.tree().len());
    }

    #[test]
    fn test_sharded_run_honours_cancel() {
        let mut planner =
            ShardedRRTStar::new(ObstacleField::empty(), request(), RRTStarConfig::default(), 2).unwrap();
        let cancel = CancelToken::new();
        cancel.cancel();
        let report = planner.run(&cancel, &mut NullObserver).unwrap();
        assert_eq!(report.stop, StopReason::Cancelled);
        assert!(report.path.is_none());
    }

    #[test]
    fn test_sharded_run_exhausts_when_enclosed() {
        let field = ObstacleField::new(vec![
            Obstacle::rectangle(550.0, 750.0, 100.0, 10.0),
            Obstacle::rectangle(550.0, 840.0, 100.0, 10.0),
            Obstacle::rectangle(550.0, 750.0, 10.0, 100.0),
            Obstacle::rectangle(640.0, 750.0, 10.0, 100.0),
        ])
        .unwrap();
        let config = RRTStarConfig { max_iterations: 200, seed: Some(2), ..Default::default() };
        let mut planner = ShardedRRTStar::new(field, request(), config, 3).unwrap();
        let err = planner.run(&CancelToken::new(), &mut NullObserver).unwrap_err();
        assert!(matches!(err, PlanningError::PlanningExhausted { iterations: 200, .. }));
    }
}
