pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";

/// Path the relay serves its WebSocket endpoint on.
pub const DEFAULT_WS_PATH: &str = "/ws";
