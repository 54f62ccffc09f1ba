mod relay_client;
mod signaling_output;

pub use relay_client::RelayClient;
pub use signaling_output::SignalingOutput;
