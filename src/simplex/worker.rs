//! This module handles running the solver to completion on a dedicated
//! worker thread.

use super::{
    problem::Inequality,
    tableau::{SimplexError, Step, Tableau},
    tags::VariableTag,
};
use crate::Frac;
use std::{
    sync::{
        atomic::{AtomicU8, Ordering},
        mpsc, Arc,
    },
    thread,
};
use tracing::{debug, error, instrument, warn};

/// How, if at all, the caller has asked the solver to stop.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CancellationState {
    NotCancelled,

    /// Stop pivoting and report termination through the event channel.
    Requested,

    /// Stop pivoting and emit nothing further. The receiving side is being
    /// torn down, so its endpoints must not be touched again.
    OnShutdown,
}

/// A shared tri-state cancellation flag: stored by the caller, polled by the
/// worker once per pivot.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicU8>);

impl CancellationFlag {
    const NOT_CANCELLED: u8 = 0;
    const REQUESTED: u8 = 1;
    const ON_SHUTDOWN: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the worker to stop and report a cancelled termination.
    pub fn cancel(&self) {
        self.0.store(Self::REQUESTED, Ordering::SeqCst);
    }

    /// Ask the worker to stop silently. Safe to call from a shutdown path
    /// where the event receiver has already been dropped.
    pub fn cancel_on_shutdown(&self) {
        self.0.store(Self::ON_SHUTDOWN, Ordering::SeqCst);
    }

    pub fn state(&self) -> CancellationState {
        match self.0.load(Ordering::SeqCst) {
            Self::REQUESTED => CancellationState::Requested,
            Self::ON_SHUTDOWN => CancellationState::OnShutdown,
            _ => CancellationState::NotCancelled,
        }
    }
}

/// An event emitted by the worker on its event channel.
#[derive(Clone, Debug, PartialEq)]
pub enum WorkerEvent {
    /// The monotonically increasing pivot count, emitted after each pivot.
    Progress(u64),

    /// The final event of a run. Nothing follows it.
    Terminated(Termination),
}

/// How a solver run ended.
#[derive(Clone, Debug, PartialEq)]
pub enum Termination {
    /// The optimum was reached; carries the solved `(tag, value)` pairs.
    Optimal(Vec<(VariableTag, Frac)>),

    /// The objective can grow without bound.
    Unbounded,

    /// Cancellation was requested before the optimum was reached.
    Cancelled,

    /// The solver hit an internal fault; carries a diagnostic.
    Failed(String),
}

/// Owns a tableau and drives it to termination, decoupled from the caller.
///
/// The worker is CPU-bound: its only suspension points are the event sends
/// and the (non-blocking) cancellation flag reads.
pub struct SimplexWorker {
    tableau: Tableau,
    events: mpsc::Sender<WorkerEvent>,
    cancellation: CancellationFlag,
}

impl SimplexWorker {
    /// Build a worker and the endpoints the caller keeps: the event receiver
    /// and a clone of the cancellation flag.
    pub fn new(
        inequalities: &[Inequality],
    ) -> (Self, mpsc::Receiver<WorkerEvent>, CancellationFlag) {
        let (events, receiver) = mpsc::channel();
        let cancellation = CancellationFlag::new();
        let worker = Self {
            tableau: Tableau::new(inequalities),
            events,
            cancellation: cancellation.clone(),
        };
        (worker, receiver, cancellation)
    }

    /// Run on a dedicated thread. The tableau moves with the worker; the
    /// caller keeps no reference to it.
    pub fn spawn(self) -> thread::JoinHandle<()> {
        thread::spawn(move || self.run())
    }

    /// Pivot until a terminal state, emitting progress along the way.
    ///
    /// The cancellation flag is polled immediately before each emission. A
    /// requested cancellation replaces the pending emission with the
    /// cancelled terminal event; a shutdown cancellation suppresses all
    /// further emissions, including failures.
    #[instrument(skip(self))]
    pub fn run(mut self) {
        let mut pivots: u64 = 0;

        loop {
            match self.tableau.step() {
                Ok(Step::Pivoted) => {
                    pivots += 1;
                    match self.cancellation.state() {
                        CancellationState::OnShutdown => return,
                        CancellationState::Requested => {
                            debug!(pivots, "cancellation requested");
                            self.emit(WorkerEvent::Terminated(Termination::Cancelled));
                            return;
                        }
                        CancellationState::NotCancelled => {
                            self.emit(WorkerEvent::Progress(pivots));
                        }
                    }
                }
                Ok(Step::Optimal) => {
                    match self.cancellation.state() {
                        CancellationState::OnShutdown => {}
                        CancellationState::Requested => {
                            self.emit(WorkerEvent::Terminated(Termination::Cancelled));
                        }
                        CancellationState::NotCancelled => {
                            debug!(pivots, "optimal");
                            let values = self.tableau.variable_values();
                            self.emit(WorkerEvent::Terminated(Termination::Optimal(values)));
                        }
                    }
                    return;
                }
                Err(err) => {
                    if self.cancellation.state() == CancellationState::OnShutdown {
                        return;
                    }
                    let termination = match &err {
                        SimplexError::Unbounded { .. } => {
                            warn!(%err, "problem is unbounded");
                            Termination::Unbounded
                        }
                        SimplexError::Internal(_) => {
                            error!(%err, "solver fault");
                            Termination::Failed(err.to_string())
                        }
                    };
                    self.emit(WorkerEvent::Terminated(termination));
                    return;
                }
            }
        }
    }

    fn emit(&self, event: WorkerEvent) {
        // A dropped receiver is not an error for the worker; it just means
        // nobody is listening any more.
        if self.events.send(event).is_err() {
            debug!("event receiver dropped");
        }
    }
}
