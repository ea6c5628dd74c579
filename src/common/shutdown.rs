//! Cooperative shutdown coordinator.

use tokio::sync::watch;

/// One-shot shutdown signal shared between background tasks.
///
/// Tasks call [`Shutdown::wait`] inside their select loops; any holder may
/// call [`Shutdown::shutdown`] exactly once to terminate them all.
pub struct Shutdown {
    sender: watch::Sender<bool>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender,
        }
    }

    /// Signal termination to every waiting task.
    pub fn shutdown(&self) {
        let _ = self.sender.send(true);
    }

    /// Wait until the shutdown signal is raised.
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        if *receiver.borrow() {
            return;
        }
        while receiver.changed().await.is_ok() {
            if *receiver.borrow() {
                return;
            }
        }
    }
}
