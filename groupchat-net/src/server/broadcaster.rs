//! `broadcast`: fan out a frame to every occupied slot except an optional
//! originator. Send failures are logged, not propagated; the owning
//! worker notices on its next `recv_frame` and tears down its own slot.

use crate::server::registry::ServerState;
use crate::wire::send_frame;

pub async fn broadcast(state: &mut ServerState, bytes: &[u8], except: Option<usize>) {
    for (idx, slot) in state.slots.iter_mut().enumerate() {
        if Some(idx) == except {
            continue;
        }
        let Some(writer) = slot.writer.as_mut() else {
            continue;
        };
        if let Err(error) = send_frame(writer, bytes).await {
            tracing::warn!(slot = idx, %error, "broadcast write failed, leaving teardown to the owning worker");
        }
    }
}

/// Sends a frame to a single slot. Used for replies that only the
/// originator should see, such as `S2C_INDIVIDUAL_KEY_RESET`.
pub async fn send_to(state: &mut ServerState, slot_idx: usize, bytes: &[u8]) {
    let Some(writer) = state.slots[slot_idx].writer.as_mut() else {
        return;
    };
    if let Err(error) = send_frame(writer, bytes).await {
        tracing::warn!(slot = slot_idx, %error, "direct send failed, leaving teardown to the owning worker");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::registry::ServerState;
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, TcpStream};

    async fn connected_pair() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let connect = TcpStream::connect(addr);
        let (accept_res, connect_res) = tokio::join!(listener.accept(), connect);
        (accept_res.unwrap().0, connect_res.unwrap())
    }

    #[tokio::test]
    async fn reaches_every_slot_except_the_excluded_one() {
        let mut state = ServerState::new();

        let (server_a, mut client_a) = connected_pair().await;
        let (server_b, mut client_b) = connected_pair().await;

        let idx_a = state.claim_slot(server_a.into_split().1).unwrap();
        let idx_b = state.claim_slot(server_b.into_split().1).unwrap();

        broadcast(&mut state, b"hi", Some(idx_a)).await;

        let mut buf = [0u8; 16];
        let n = client_b.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"hi\n");

        // client_a should not have received anything; confirm nothing is
        // pending by writing a sentinel from the other side through a second
        // broadcast with no exclusion and checking ordering instead of
        // blocking forever on a read that would never arrive.
        broadcast(&mut state, b"all", None).await;
        let n = client_a.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"all\n");
        let _ = idx_b;
    }
}
