use std::time::{Duration, Instant};

/// Delay between attaching a modal and starting its fade-in.
pub const OPEN_DELAY: Duration = Duration::from_millis(10);
/// Length of the fade-out before the modal is detached.
pub const CLOSE_DELAY: Duration = Duration::from_millis(400);

/// Visibility of a modal dialog.
///
/// Transitions with a delay carry their deadline; call [`Modal::tick`] when
/// it passes (see [`Modal::deadline`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modal {
    #[default]
    Closed,
    /// Attached, waiting to become active.
    Opening { until: Instant },
    Open,
    /// Inactive, waiting to be detached.
    Closing { until: Instant },
}

impl Modal {
    /// Re-opening while closing cancels the pending detach.
    pub fn open(&mut self, now: Instant) {
        if matches!(self, Self::Closed | Self::Closing { .. }) {
            *self = Self::Opening { until: now + OPEN_DELAY };
        }
    }

    pub fn close(&mut self, now: Instant) {
        if matches!(self, Self::Opening { .. } | Self::Open) {
            *self = Self::Closing { until: now + CLOSE_DELAY };
        }
    }

    /// Completes a transition whose deadline has passed.
    /// Returns true if the state changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match *self {
            Self::Opening { until } if now >= until => *self = Self::Open,
            Self::Closing { until } if now >= until => *self = Self::Closed,
            _ => return false,
        }
        true
    }

    pub fn deadline(&self) -> Option<Instant> {
        match *self {
            Self::Opening { until } | Self::Closing { until } => Some(until),
            Self::Closed | Self::Open => None,
        }
    }

    /// Present in the layout (any state but `Closed`).
    pub fn is_attached(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    /// Fully shown and interactive.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Open)
    }
}
