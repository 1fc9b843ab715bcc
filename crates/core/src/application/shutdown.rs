// Suite Shutdown Token

use std::sync::Arc;
use tokio::sync::watch;

/// Cancellation signal checked by the suite between runs
#[derive(Clone)]
pub struct ShutdownToken {
    rx: watch::Receiver<bool>,
    /// Sender owned by a `never` token, so its channel stays open
    _sender: Option<Arc<watch::Sender<bool>>>,
}

impl ShutdownToken {
    /// Check if shutdown was requested
    pub fn is_shutdown(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait for shutdown signal
    pub async fn wait(&mut self) {
        let _ = self.rx.changed().await;
    }

    /// Token that is never triggered
    pub fn never() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            rx,
            _sender: Some(Arc::new(tx)),
        }
    }
}

/// Shutdown sender
pub struct ShutdownSender {
    tx: watch::Sender<bool>,
}

impl ShutdownSender {
    /// Ask the running suite to stop after the current run
    pub fn shutdown(&self) {
        let _ = self.tx.send(true);
    }
}

/// Create a shutdown channel
pub fn shutdown_channel() -> (ShutdownSender, ShutdownToken) {
    let (tx, rx) = watch::channel(false);
    (ShutdownSender { tx }, ShutdownToken { rx, _sender: None })
}
