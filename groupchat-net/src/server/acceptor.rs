//! TCP accept loop: claims a slot for each new connection and hands it off
//! to `handler::run`, or rejects it if the server is at capacity.

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;

use crate::server::handler;
use crate::server::registry::ServerState;

pub async fn run(listener: TcpListener, state: Arc<Mutex<ServerState>>) {
    loop {
        let (stream, addr) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(error) => {
                tracing::warn!(%error, "accept failed");
                continue;
            }
        };
        tracing::debug!(%addr, "accepted connection");

        // Check capacity before splitting the stream: a full table is
        // rejected on the whole socket, never touching the slot table.
        let has_room = {
            let guard = state.lock().await;
            guard.slots.iter().any(|slot| slot.is_empty())
        };
        if !has_room {
            tracing::info!(%addr, "rejecting connection: server is full");
            let (_read_half, write_half) = stream.into_split();
            handler::reject_full(write_half).await;
            continue;
        }

        let (read_half, write_half) = stream.into_split();
        let mut guard = state.lock().await;
        let slot_idx = guard
            .claim_slot(write_half)
            .expect("room was just confirmed under the same lock ordering");
        drop(guard);

        let state = Arc::clone(&state);
        tokio::spawn(async move {
            handler::run(state, read_half, slot_idx).await;
        });
    }
}
