//! Run deadline and early stop

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::info;

/// Cooperative stop request shared by every component of a run
#[derive(Debug, Clone)]
pub struct StopSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl StopSignal {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn stop(&self) {
        if !self.sender.send_replace(true) {
            info!("Stop requested");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.sender.borrow()
    }

    /// Resolves once `stop` has been called
    pub async fn stopped(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives in `self`, so this only returns once stopped
        let _ = receiver.wait_for(|stopped| *stopped).await;
    }
}

/// Upper bound on the generation phase of a run.
///
/// Generators stop scheduling once it expires and abandon in-flight work;
/// counters collected so far are kept as-is.
#[derive(Debug, Clone)]
pub struct RunDeadline {
    started_at: Instant,
    expires_at: Instant,
    stop: StopSignal,
}

impl RunDeadline {
    /// Start the clock now
    pub fn start(max_duration: Duration, stop: StopSignal) -> Self {
        let started_at = Instant::now();
        Self {
            started_at,
            expires_at: started_at + max_duration,
            stop,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.started_at)
    }

    pub fn remaining(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    pub fn is_expired(&self) -> bool {
        self.stop.is_stopped() || Instant::now() >= self.expires_at
    }

    /// `now + limit`, never past the deadline
    pub fn clamp(&self, limit: Duration) -> Instant {
        (Instant::now() + limit).min(self.expires_at)
    }

    /// Resolves at the deadline or on an early stop, whichever comes first
    pub async fn expired(&self) {
        tokio::select! {
            _ = sleep_until(self.expires_at) => {}
            _ = self.stop.stopped() => {}
        }
    }
}
