//! Reload-continuation handshake.
//!
//! After publishing, a concurrent reload reports that the cache is ready and
//! waits for the host's other reload participants before it resolves.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::Barrier;

use crate::error::ReloadError;

/// The host's reload stage.
pub trait ReloadStage: Send + Sync {
    /// Signal that this participant is done and wait for the others.
    fn mark_complete_awaiting_others(&self) -> BoxFuture<'_, Result<(), ReloadError>>;
}

/// A stage with no other participants.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateStage;

impl ReloadStage for ImmediateStage {
    fn mark_complete_awaiting_others(&self) -> BoxFuture<'_, Result<(), ReloadError>> {
        Box::pin(async { Ok(()) })
    }
}

/// A stage shared by a fixed number of participants.
///
/// Each participant calls [`ReloadStage::mark_complete_awaiting_others`]; all
/// of them resume once the last one arrives.
#[derive(Debug, Clone)]
pub struct StageBarrier {
    barrier: Arc<Barrier>,
}

impl StageBarrier {
    /// Create a barrier for `participants` callers.
    pub fn new(participants: usize) -> Self {
        Self {
            barrier: Arc::new(Barrier::new(participants)),
        }
    }
}

impl ReloadStage for StageBarrier {
    fn mark_complete_awaiting_others(&self) -> BoxFuture<'_, Result<(), ReloadError>> {
        Box::pin(async move {
            self.barrier.wait().await;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_immediate_stage_resolves() {
        assert!(ImmediateStage.mark_complete_awaiting_others().await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_barrier_waits_for_all_participants() {
        let stage = StageBarrier::new(2);
        let arrived = Arc::new(AtomicUsize::new(0));

        let first = {
            let stage = stage.clone();
            let arrived = Arc::clone(&arrived);
            tokio::spawn(async move {
                stage.mark_complete_awaiting_others().await.unwrap();
                arrived.fetch_add(1, Ordering::SeqCst);
            })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(arrived.load(Ordering::SeqCst), 0);

        stage.mark_complete_awaiting_others().await.unwrap();
        first.await.unwrap();
        assert_eq!(arrived.load(Ordering::SeqCst), 1);
    }
}
