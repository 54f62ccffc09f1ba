pub use parley_core::{ConnectionId, RoomId, SignalMessage};

pub mod model {
    pub use parley_core::model::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use parley_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use parley_client::*;
}
