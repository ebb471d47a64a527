use std::sync::Arc;
use std::time::Duration;

use crate::sequence::{RequestSequence, Ticket};

/// Waits out a quiet period; only the newest caller gets through.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    sequence: Arc<RequestSequence>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            sequence: Arc::new(RequestSequence::new()),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Sleep for the quiet period. Returns the caller's ticket if no newer
    /// call arrived meanwhile, `None` if it was superseded.
    pub async fn settle(&self) -> Option<Ticket> {
        let ticket = self.sequence.issue();
        tokio::time::sleep(self.delay).await;
        self.sequence.is_latest(ticket).then_some(ticket)
    }

    /// Whether `ticket` is still the newest input
    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.sequence.is_latest(ticket)
    }

    /// Drop whatever is pending
    pub fn cancel(&self) {
        self.sequence.cancel();
    }
}
