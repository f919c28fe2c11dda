use std::sync::Arc;

use futures_util::future::select_all;
use tokio::sync::watch;

/// Cooperative stop signal. Cancelling is idempotent; a child token observes
/// its ancestors, but cancelling the child leaves them untouched.
#[derive(Clone)]
pub struct CancelToken {
    // Ancestors first, own sender last.
    chain: Vec<Arc<watch::Sender<bool>>>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            chain: vec![Arc::new(tx)],
        }
    }

    pub fn child(&self) -> Self {
        let (tx, _rx) = watch::channel(false);
        let mut chain = self.chain.clone();
        chain.push(Arc::new(tx));
        Self { chain }
    }

    pub fn cancel(&self) {
        if let Some(own) = self.chain.last() {
            own.send_replace(true);
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.chain.iter().any(|tx| *tx.borrow())
    }

    /// Resolves once this token or any ancestor is cancelled.
    pub async fn cancelled(&self) {
        let waits = self.chain.iter().map(|tx| {
            let mut rx = tx.subscribe();
            Box::pin(async move {
                let _ = rx.wait_for(|cancelled| *cancelled).await;
            })
        });
        select_all(waits).await;
    }
}
