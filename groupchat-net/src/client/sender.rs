//! The dedicated socket-writer task: the only task that ever touches the
//! write half of the client's connection, draining frames queued by the
//! reader (protocol replies) and the writer (chat messages) over one
//! channel so the two never race for the socket.

use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::mpsc;

use crate::wire::send_frame;

pub async fn run(mut writer: OwnedWriteHalf, mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>) {
    while let Some(bytes) = outgoing.recv().await {
        if let Err(error) = send_frame(&mut writer, &bytes).await {
            tracing::debug!(%error, "failed to send frame, socket writer shutting down");
            return;
        }
    }
}
