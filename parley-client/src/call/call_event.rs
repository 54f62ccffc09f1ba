use crate::CallError;
use crate::call::CallState;
use crate::media::RemoteTrack;

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum CallEvent {
    StateChanged(CallState),
    RemoteMedia(RemoteTrack),
    /// A relay message was dropped without affecting the call.
    Dropped(CallError),
    /// The membership ended, with the error that ended it if any.
    Closed(Option<CallError>),
}
