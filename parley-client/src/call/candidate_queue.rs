use heapless::Deque;
use parley_core::IceCandidate;
use tracing::warn;

pub const CANDIDATE_QUEUE_CAPACITY: usize = 64;

/// Remote candidates received before a remote description is set.
///
/// Bounded; candidates beyond capacity are rejected and counted.
pub struct CandidateQueue {
    pending: Deque<IceCandidate, CANDIDATE_QUEUE_CAPACITY>,
    overflowed: usize,
}

impl Default for CandidateQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self {
            pending: Deque::new(),
            overflowed: 0,
        }
    }

    /// Returns the candidate back if the queue is full.
    pub fn push(&mut self, candidate: IceCandidate) -> Result<(), IceCandidate> {
        self.pending.push_back(candidate).inspect_err(|_| {
            self.overflowed += 1;
            warn!(
                "Candidate queue full ({} pending), dropping candidate",
                CANDIDATE_QUEUE_CAPACITY
            );
        })
    }

    /// Empties the queue in arrival order.
    pub fn drain(&mut self) -> Vec<IceCandidate> {
        let mut drained = Vec::with_capacity(self.pending.len());
        while let Some(candidate) = self.pending.pop_front() {
            drained.push(candidate);
        }
        drained
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn overflowed(&self) -> usize {
        self.overflowed
    }
}
