pub mod cli;
pub mod content_range;
pub mod handshake;
pub mod state;
pub mod version;
