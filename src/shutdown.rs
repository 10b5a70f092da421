//! Cooperative cancellation.
//!
//! The first Ctrl+C flips a watch flag. The pipeline checks it before starting
//! each volume, issue and article, so work in flight finishes and whatever was
//! harvested is still written out. A second Ctrl+C exits immediately.

use tokio::sync::watch;
use tracing::warn;

/// Read side of the cancellation flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// A flag that can be triggered through the returned sender.
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A flag that is never triggered.
    #[cfg(test)]
    pub fn never() -> Self {
        Self::channel().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Install the Ctrl+C handler and return the flag it controls.
pub fn install_ctrl_c_handler() -> Shutdown {
    let (tx, shutdown) = Shutdown::channel();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received Ctrl+C; finishing in-flight pages then writing output (press again to quit)");
            let _ = tx.send(true);

            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Second Ctrl+C; exiting immediately");
                std::process::exit(130);
            }
        }
    });

    shutdown
}
