//! Frame-driven clock and the resize debounce.

/// Quiet period before a burst of resizes triggers a star rebuild.
pub const RESIZE_DEBOUNCE_MS: f64 = 200.0;

/// Elapsed animation time, fed from frame timestamps.
///
/// Stopping freezes the elapsed time; starting again continues from where
/// it left off instead of jumping over the paused interval.
#[derive(Debug, Clone)]
pub struct AnimationClock {
    elapsed_ms: f64,
    running: bool,
}

impl AnimationClock {
    pub fn new() -> Self {
        Self {
            elapsed_ms: 0.0,
            running: true,
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Add a frame delta. Ignored while stopped.
    pub fn advance(&mut self, delta_ms: f64) {
        if self.running && delta_ms.is_finite() && delta_ms > 0.0 {
            self.elapsed_ms += delta_ms;
        }
    }

    /// Elapsed time in seconds.
    pub fn elapsed(&self) -> f64 {
        self.elapsed_ms / 1000.0
    }
}

impl Default for AnimationClock {
    fn default() -> Self {
        Self::new()
    }
}

/// A re-armable deadline that fires once.
#[derive(Debug, Clone)]
pub struct Debounce {
    wait_ms: f64,
    deadline: Option<f64>,
}

impl Debounce {
    pub fn new(wait_ms: f64) -> Self {
        Self {
            wait_ms,
            deadline: None,
        }
    }

    /// Push the deadline out to `now_ms + wait`.
    pub fn arm(&mut self, now_ms: f64) {
        self.deadline = Some(now_ms + self.wait_ms);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Returns `true` exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        match self.deadline {
            Some(deadline) if now_ms >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

impl Default for Debounce {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE_MS)
    }
}
