//! Framed TCP transport, session coordinator, and protocol participant for
//! the encrypted group chat.

pub mod client;
pub mod server;
pub mod wire;
