//! Cancellation signal for the stream loop.

use tokio::sync::watch;

/// Create a linked trigger/signal pair. The signal is cheap to clone.
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger(tx), ShutdownSignal(rx))
}

#[derive(Debug)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn raise(&self) {
        self.0.send_replace(true);
    }
}

#[derive(Debug, Clone)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl ShutdownSignal {
    pub fn is_raised(&self) -> bool {
        *self.0.borrow()
    }

    /// Resolves once the trigger is raised. Never resolves if the trigger was
    /// dropped without raising.
    pub async fn raised(&mut self) {
        if self.0.wait_for(|raised| *raised).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
