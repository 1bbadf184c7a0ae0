//! User reaction state: the single-shot auto-advance flag
//!
//! "Like" arms the flag; it is consumed the moment a completion is
//! handled. Advancing itself is unconditional, so the flag only informs
//! UX wording today (a hook for a future recommendation policy).

#[derive(Debug, Default)]
pub struct ReactionController {
    auto_advance_requested: bool,
}

impl ReactionController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thumbs up: arm the single-shot flag.
    pub fn like(&mut self) {
        self.auto_advance_requested = true;
    }

    /// Thumbs down clears any pending like.
    pub fn clear(&mut self) {
        self.auto_advance_requested = false;
    }

    /// Consume the flag; it never survives a completion.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.auto_advance_requested)
    }

    pub fn is_requested(&self) -> bool {
        self.auto_advance_requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes_the_flag() {
        let mut r = ReactionController::new();
        assert!(!r.take());
        r.like();
        assert!(r.is_requested());
        assert!(r.take());
        assert!(!r.take());
    }

    #[test]
    fn clear_disarms_a_pending_like() {
        let mut r = ReactionController::new();
        r.like();
        r.clear();
        assert!(!r.take());
    }
}
