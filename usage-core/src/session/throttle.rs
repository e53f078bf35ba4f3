//! Hit rate limiting.

use web_time::{Duration, Instant};

const REPLENISH_INTERVAL: Duration = Duration::from_secs(1);

/// Token bucket: starts full, regains one drop per elapsed second
///
/// Hits that find the bucket empty are dropped, not queued.
#[derive(Debug)]
pub struct ThrottlingBucket {
    capacity: u32,
    drops: u32,
    last_replenish: Instant,
}

impl ThrottlingBucket {
    pub fn new(capacity: u32) -> Self {
        Self::starting_at(capacity, Instant::now())
    }

    fn starting_at(capacity: u32, now: Instant) -> Self {
        Self {
            capacity,
            drops: capacity,
            last_replenish: now,
        }
    }

    /// Take a drop if one is available
    pub fn try_take(&mut self) -> bool {
        self.try_take_at(Instant::now())
    }

    fn try_take_at(&mut self, now: Instant) -> bool {
        self.replenish(now);
        if self.drops > 0 {
            self.drops -= 1;
            true
        } else {
            false
        }
    }

    fn replenish(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_replenish);
        let secs = elapsed.as_secs();
        if secs == 0 {
            return;
        }
        let gained = u32::try_from(secs).unwrap_or(u32::MAX);
        self.drops = self.drops.saturating_add(gained).min(self.capacity);
        // Keep the fractional second for the next replenish
        self.last_replenish += REPLENISH_INTERVAL * gained;
    }

    /// Drops currently available
    pub fn available(&self) -> u32 {
        self.drops
    }
}
