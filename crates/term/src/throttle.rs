/// Fixed-rate frame clock.
///
/// Frames fall on a grid of `interval_ms` ticks. When the host falls behind,
/// the missed ticks are dropped instead of queued, so a slow frame never
/// causes a burst of catch-up frames.
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval_ms: u64,
    next_due_ms: u64,
    started: bool,
    skipped: u64,
}

impl FrameClock {
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(1),
            next_due_ms: 0,
            started: false,
            skipped: 0,
        }
    }

    /// Clock for a target frame rate; 0 is treated as 1 fps.
    pub fn from_fps(fps: u32) -> Self {
        Self::new(1000 / fps.max(1) as u64)
    }

    /// Decide whether a frame is due at `now_ms`.
    ///
    /// - The first call always renders.
    /// - Otherwise a frame is due once the current deadline has passed; every
    ///   whole tick missed beyond it is counted in [`FrameClock::skipped`].
    pub fn should_render(&mut self, now_ms: u64) -> bool {
        if !self.started {
            self.started = true;
            self.next_due_ms = now_ms + self.interval_ms;
            return true;
        }

        if now_ms < self.next_due_ms {
            return false;
        }

        let missed = (now_ms - self.next_due_ms) / self.interval_ms;
        self.skipped += missed;
        self.next_due_ms += (missed + 1) * self.interval_ms;
        true
    }

    /// Milliseconds until the next frame is due (0 when already due).
    pub fn time_until_next(&self, now_ms: u64) -> u64 {
        if !self.started {
            return 0;
        }
        self.next_due_ms.saturating_sub(now_ms)
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Ticks dropped because the host was late.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}
