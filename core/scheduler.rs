use crate::detector::FileRecord;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescanState {
    Idle,
    PendingRescan { deadline: Instant },
}

/// Trailing-edge debounce for rescans.
///
/// Every mutation pushes the deadline out to `now + delay`; a rescan becomes due only once
/// the document has been quiet for the whole window. Time is always passed in, so the
/// state machine never sleeps or reads the clock itself.
#[derive(Debug, Clone)]
pub struct RescanScheduler {
    delay: Duration,
    state: RescanState,
}

impl RescanScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: RescanState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> RescanState {
        self.state
    }

    pub fn notify_mutation(&mut self, now: Instant) {
        if self.state == RescanState::Idle {
            log::trace!("Change observed, rescan pending");
        }
        self.state = RescanState::PendingRescan {
            deadline: now + self.delay,
        };
    }

    /// Returns `true` exactly once per quiet period, moving back to `Idle`.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            RescanState::PendingRescan { deadline } if now >= deadline => {
                self.state = RescanState::Idle;
                true
            }
            _ => false,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        match self.state {
            RescanState::Idle => None,
            RescanState::PendingRescan { deadline } => Some(deadline),
        }
    }

    /// How long a caller may block before the next `poll` could return `true`.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_deadline()
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

/// Owned stand-in for the "save all" control: present once files were found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trigger {
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Created,
    Updated { previous: usize },
    Unchanged,
}

/// Decides what happens to the trigger after a rescan.
///
/// An empty result never tears an existing trigger down.
pub fn reconcile(previous: Option<Trigger>, records: &[FileRecord]) -> (Option<Trigger>, Reconciliation) {
    if records.is_empty() {
        return (previous, Reconciliation::Unchanged);
    }
    let current = Trigger {
        count: records.len(),
    };
    match previous {
        None => (Some(current), Reconciliation::Created),
        Some(prior) => (
            Some(current),
            Reconciliation::Updated {
                previous: prior.count,
            },
        ),
    }
}
