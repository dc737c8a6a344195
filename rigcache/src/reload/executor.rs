//! Where the publish step of a concurrent reload runs.
//!
//! A host that mutates its own state from one thread (a game or render loop)
//! wants the snapshot swap to happen there too. [`MainThreadExecutor`] queues
//! publish jobs for a [`MainThreadPump`] owned by that thread; hosts without
//! such a thread use [`InlineExecutor`].

use futures::future::BoxFuture;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::ReloadError;

/// A publish step. Returns the generation it published.
pub type PublishJob = Box<dyn FnOnce() -> u64 + Send + 'static>;

/// Runs publish jobs on a designated context.
pub trait PublishExecutor: Send + Sync {
    /// Run `job` and resolve to its result.
    ///
    /// Fails with [`ReloadError::Orchestration`] if the job could not be run.
    fn execute(&self, job: PublishJob) -> BoxFuture<'static, Result<u64, ReloadError>>;
}

/// Runs the job on the task that awaits it.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl PublishExecutor for InlineExecutor {
    fn execute(&self, job: PublishJob) -> BoxFuture<'static, Result<u64, ReloadError>> {
        Box::pin(async move { Ok(job()) })
    }
}

type QueuedJob = (PublishJob, oneshot::Sender<u64>);

/// Sends jobs to a [`MainThreadPump`].
#[derive(Debug, Clone)]
pub struct MainThreadExecutor {
    sender: mpsc::UnboundedSender<QueuedJob>,
}

impl MainThreadExecutor {
    /// Create an executor and the pump that runs its jobs.
    pub fn channel() -> (Self, MainThreadPump) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, MainThreadPump { receiver })
    }
}

impl PublishExecutor for MainThreadExecutor {
    fn execute(&self, job: PublishJob) -> BoxFuture<'static, Result<u64, ReloadError>> {
        let (reply, result) = oneshot::channel();
        let queued = self.sender.send((job, reply)).map_err(|_| {
            ReloadError::Orchestration("publish executor has no running pump".to_string())
        });

        Box::pin(async move {
            queued?;
            result.await.map_err(|_| {
                ReloadError::Orchestration("publish job was dropped before it ran".to_string())
            })
        })
    }
}

/// Runs queued publish jobs on the thread that owns it.
#[derive(Debug)]
pub struct MainThreadPump {
    receiver: mpsc::UnboundedReceiver<QueuedJob>,
}

impl MainThreadPump {
    /// Run every job queued right now without blocking. Returns how many ran.
    ///
    /// Meant to be called once per host frame or tick.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            run_job(job);
            ran += 1;
        }
        ran
    }

    /// Block the current thread until one job arrives and run it.
    ///
    /// Returns `false` once every executor has been dropped. Must not be
    /// called from inside an async runtime.
    pub fn blocking_run_one(&mut self) -> bool {
        match self.receiver.blocking_recv() {
            Some(job) => {
                run_job(job);
                true
            }
            None => false,
        }
    }

    /// Run jobs as they arrive until every executor has been dropped.
    pub async fn run(&mut self) {
        while let Some(job) = self.receiver.recv().await {
            run_job(job);
        }
    }
}

fn run_job((job, reply): QueuedJob) {
    let generation = job();
    debug!(generation, "Publish job ran on pump thread");
    // The reload may have been dropped while waiting; the publish still stands.
    let _ = reply.send(generation);
}
