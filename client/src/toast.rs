pub const TOAST_DURATION_MS: f64 = 2000.0;

/// Single-slot transient notification. A new message replaces the current
/// one and restarts its visibility window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToastState {
    message: String,
    shown_at: Option<f64>,
    generation: u64,
}

impl ToastState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `message` starting at `now` (ms). Returns the generation the
    /// caller passes back to [`ToastState::expire`] when its timer fires.
    pub fn show(&mut self, message: impl Into<String>, now: f64) -> u64 {
        self.message = message.into();
        self.shown_at = Some(now);
        self.generation += 1;
        self.generation
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn visible_at(&self, now: f64) -> bool {
        self.shown_at
            .is_some_and(|shown| now >= shown && now - shown < TOAST_DURATION_MS)
    }

    pub fn is_visible(&self) -> bool {
        self.shown_at.is_some()
    }

    /// Hide the toast if `generation` is still the latest one shown.
    /// Timers from replaced messages are ignored.
    pub fn expire(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.shown_at.is_none() {
            return false;
        }
        self.shown_at = None;
        true
    }

    pub fn hide(&mut self) {
        self.shown_at = None;
    }
}
