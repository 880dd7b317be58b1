//! Per-type request sequence numbers.

use serde::{Deserialize, Serialize};

/// The three request/response exchanges multiplexed over the channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Detect,
    Estimate,
    TryOn,
}

impl RequestKind {
    fn slot(self) -> usize {
        match self {
            RequestKind::Detect => 0,
            RequestKind::Estimate => 1,
            RequestKind::TryOn => 2,
        }
    }
}

/// Issues a monotonic sequence number per request kind and decides whether a
/// response still belongs to the latest request of its kind.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    latest: [u64; 3],
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number for a new request of `kind`. The first is 1.
    pub fn next(&mut self, kind: RequestKind) -> u64 {
        let slot = &mut self.latest[kind.slot()];
        *slot += 1;
        *slot
    }

    /// Latest issued sequence number for `kind`, 0 if none.
    pub fn latest(&self, kind: RequestKind) -> u64 {
        self.latest[kind.slot()]
    }

    /// Whether a response echoing `seq` answers the latest request of `kind`.
    ///
    /// Responses that do not echo a sequence number are accepted as-is.
    pub fn is_current(&self, kind: RequestKind, seq: Option<u64>) -> bool {
        match seq {
            Some(seq) => seq >= self.latest(kind),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequences_are_independent_per_kind() {
        let mut seq = RequestSequencer::new();
        assert_eq!(seq.next(RequestKind::Estimate), 1);
        assert_eq!(seq.next(RequestKind::Estimate), 2);
        assert_eq!(seq.next(RequestKind::TryOn), 1);
        assert_eq!(seq.latest(RequestKind::Detect), 0);
    }

    #[test]
    fn test_older_response_is_stale() {
        let mut seq = RequestSequencer::new();
        seq.next(RequestKind::Estimate);
        seq.next(RequestKind::Estimate);
        assert!(!seq.is_current(RequestKind::Estimate, Some(1)));
        assert!(seq.is_current(RequestKind::Estimate, Some(2)));
    }

    #[test]
    fn test_unsequenced_response_is_current() {
        let mut seq = RequestSequencer::new();
        seq.next(RequestKind::TryOn);
        seq.next(RequestKind::TryOn);
        assert!(seq.is_current(RequestKind::TryOn, None));
    }
}
