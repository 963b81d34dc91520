//! Receive-side debounce for the serial pad

/// Accepts an event only if `window_ms` have passed since the last accepted
/// one. Rejected events are dropped, never queued.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window_ms: u64,
    last_accepted_ms: Option<u64>,
}

impl Debouncer {
    pub fn new(window_ms: u64) -> Self {
        Self {
            window_ms,
            last_accepted_ms: None,
        }
    }

    /// Decide on an event observed at `now_ms`; accepting it restarts the window
    pub fn accept(&mut self, now_ms: u64) -> bool {
        let open = match self.last_accepted_ms {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.window_ms,
        };
        if open {
            self.last_accepted_ms = Some(now_ms);
        }
        open
    }
}
