// one Ctrl-C listener shared by every merge in a run

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

/// Latches once the user interrupts. Clones share the same latch.
#[derive(Debug, Clone)]
pub struct Interrupt {
    latch: Arc<watch::Sender<bool>>,
}

impl Interrupt {
    /// An interrupt that only fires through [`Interrupt::trigger`].
    pub fn new() -> Self {
        let (latch, _) = watch::channel(false);
        Interrupt {
            latch: Arc::new(latch),
        }
    }

    /// Takes over Ctrl-C for the rest of the process. The handler is installed before this
    /// returns, so an interrupt arriving any time afterwards is latched, even between merges.
    /// Must be called from within a tokio runtime.
    pub fn ctrl_c() -> Result<Self> {
        let interrupt = Interrupt::new();

        #[cfg(unix)]
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
            .context("could not listen for interrupts")?;
        #[cfg(windows)]
        let mut signal =
            tokio::signal::windows::ctrl_c().context("could not listen for interrupts")?;

        let latch = interrupt.clone();
        tokio::spawn(async move {
            while signal.recv().await.is_some() {
                log::warn!("interrupted");
                latch.trigger();
            }
        });
        Ok(interrupt)
    }

    pub fn trigger(&self) {
        self.latch.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.latch.borrow()
    }

    /// Resolves once the interrupt has fired, immediately if it already has.
    pub async fn triggered(&self) {
        let mut receiver = self.latch.subscribe();
        // the sender lives as long as `self`, so this only returns once triggered
        let _ = receiver.wait_for(|fired| *fired).await;
    }
}

impl Default for Interrupt {
    fn default() -> Self {
        Interrupt::new()
    }
}
