mod call_event;
mod call_session;
mod call_state;
mod candidate_queue;
mod coordinator;

pub use call_event::CallEvent;
pub use call_state::CallState;
pub use candidate_queue::{CANDIDATE_QUEUE_CAPACITY, CandidateQueue};
pub use coordinator::{Coordinator, spawn_signal_pump};
