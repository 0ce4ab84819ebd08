use std::time::{Duration, Instant};

/// Delay between two revealed characters.
pub const TYPING_DELAY: Duration = Duration::from_millis(25);

/// Progressive reveal of a text, one character per `delay`.
///
/// The effect only depends on the time elapsed since `started`, so a slow
/// frame catches up instead of slowing the animation down.
#[derive(Debug, Clone)]
pub struct TypingEffect {
    text: String,
    started: Instant,
    delay: Duration,
}

impl TypingEffect {
    pub fn new(text: String, started: Instant) -> Self {
        Self::with_delay(text, started, TYPING_DELAY)
    }

    pub fn with_delay(text: String, started: Instant, delay: Duration) -> Self {
        Self { text, started, delay }
    }

    /// Number of characters visible at `now`.
    pub fn visible_chars(&self, now: Instant) -> usize {
        let total = self.text.chars().count();
        if self.delay.is_zero() {
            return total;
        }
        let elapsed = now.saturating_duration_since(self.started);
        let revealed = elapsed.as_nanos() / self.delay.as_nanos();
        usize::try_from(revealed).map_or(total, |revealed| revealed.min(total))
    }

    /// Prefix of the text visible at `now` (UTF-8 safe).
    pub fn visible(&self, now: Instant) -> &str {
        let count = self.visible_chars(now);
        match self.text.char_indices().nth(count) {
            Some((end, _)) => &self.text[..end],
            None => &self.text,
        }
    }

    pub fn is_done(&self, now: Instant) -> bool {
        self.visible_chars(now) == self.text.chars().count()
    }
}
