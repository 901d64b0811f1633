//! Length-by-delimiter JSON framing over TCP.

pub mod codec;
pub mod frame;

pub use codec::{send_frame, RecvBuffer, WireError};
pub use frame::{ClientFrame, ServerFrame};

/// The exact bytes the server sends a rejected connection when every slot is
/// taken. Not a JSON frame, just a plain textual rejection.
pub const SERVER_FULL_MESSAGE: &[u8] = b"Server is full!";
