use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};

/// Decides when the next request to an external source may go out.
#[async_trait]
pub trait Pacer: Send + Sync {
    /// Waits until the caller may dispatch its request
    async fn wait_turn(&self);
}

/// No spacing at all. Meant for local fixtures and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unpaced;

#[async_trait]
impl Pacer for Unpaced {
    async fn wait_turn(&self) {}
}

/// Keeps at least `spacing` between two consecutive dispatches, no matter how
/// many callers are waiting concurrently. The first dispatch is immediate.
#[derive(Debug)]
pub struct FixedSpacing {
    spacing: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl FixedSpacing {
    pub fn new(spacing: Duration) -> Self {
        Self {
            spacing,
            next_slot: Mutex::new(None),
        }
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }
}

#[async_trait]
impl Pacer for FixedSpacing {
    async fn wait_turn(&self) {
        // Reserve a slot under the lock, sleep outside it.
        let slot = {
            let mut next_slot = self.next_slot.lock().await;
            let now = Instant::now();
            let slot = match *next_slot {
                Some(reserved) if reserved > now => reserved,
                _ => now,
            };
            *next_slot = Some(slot + self.spacing);
            slot
        };
        sleep_until(slot).await;
    }
}
