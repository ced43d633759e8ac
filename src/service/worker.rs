//! Periodic background task with an explicit lifecycle.
//!
//! A task moves `Idle -> Running -> Stopped` and never leaves `Stopped`.
//! `run` and `stop` are total over the state: calls that don't match a
//! transition are no-ops. Stopping only prevents further ticks; a tick that
//! already started runs to completion.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;

/// Work performed on every tick.
#[async_trait]
pub trait Job: fmt::Display + Send + Sync + 'static {
    async fn perform(&self);
}

/// Lifecycle state of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    Stopped,
}

/// Runs a `Job` every `period` on the tokio runtime.
pub struct PeriodicTask<J> {
    job: Arc<J>,
    period: Duration,
    run_immediately: bool,
    state: Mutex<TaskState>,
    shutdown_tx: broadcast::Sender<()>,
}

impl<J: Job> PeriodicTask<J> {
    pub fn new(job: Arc<J>, period: Duration) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            job,
            period,
            run_immediately: false,
            state: Mutex::new(TaskState::Idle),
            shutdown_tx,
        }
    }

    /// Also perform the job once right after `run`, before the first wait.
    pub fn run_immediately(mut self, enabled: bool) -> Self {
        self.run_immediately = enabled;
        self
    }

    pub fn job(&self) -> &Arc<J> {
        &self.job
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn state(&self) -> TaskState {
        *self.state.lock()
    }

    /// Start the background loop. Only the first call on an idle task does anything.
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&self) {
        let mut state = self.state.lock();
        if *state != TaskState::Idle {
            return;
        }
        *state = TaskState::Running;

        // Subscribe before spawning so an immediate stop is never missed.
        let shutdown = self.shutdown_tx.subscribe();
        tokio::spawn(run_loop(
            Arc::clone(&self.job),
            self.period,
            self.run_immediately,
            shutdown,
        ));
    }

    /// Ask the loop to exit at its next wait. Does not wait for it.
    pub fn stop(&self) {
        let mut state = self.state.lock();
        match *state {
            TaskState::Stopped => return,
            TaskState::Running => {
                // The loop may already be gone if the runtime shut down.
                let _ = self.shutdown_tx.send(());
            }
            TaskState::Idle => {}
        }
        *state = TaskState::Stopped;
    }
}

async fn run_loop<J: Job>(
    job: Arc<J>,
    period: Duration,
    run_immediately: bool,
    mut shutdown: broadcast::Receiver<()>,
) {
    log::info!("{} started", job);

    let stop_requested = !matches!(
        shutdown.try_recv(),
        Err(broadcast::error::TryRecvError::Empty)
    );
    if !stop_requested {
        if run_immediately {
            job.perform().await;
        }

        loop {
            tokio::select! {
                _ = tokio::time::sleep(period) => job.perform().await,
                // Either a stop signal or the owning task was dropped.
                _ = shutdown.recv() => break,
            }
        }
    }

    log::info!("{} stopped", job);
}
