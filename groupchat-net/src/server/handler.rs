//! Per-connection lifecycle: the join handshake, the frame-dispatch serving
//! loop, and disconnect teardown.
//!
//! One task runs this per accepted TCP connection. It owns the read half of
//! the socket for the lifetime of the connection; the write half lives in
//! the connection's `Slot`, written to by this task, by `broadcaster`, and
//! by `coordinator` while the shared `ServerState` lock is held.

use std::sync::Arc;

use groupchat_core::GroupMember;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::Mutex;

use crate::server::broadcaster::broadcast;
use crate::server::coordinator;
use crate::server::registry::ServerState;
use crate::wire::frame::{
    ClientFrame, GroupMembersListPayload, JoinPayload, ServerFrame, UserEvent,
    UserNotificationPayload,
};
use crate::wire::{send_frame, RecvBuffer, WireError, SERVER_FULL_MESSAGE};

/// Drives one accepted connection from the join handshake through to
/// disconnect. `slot_idx` is the slot the acceptor already claimed for this
/// connection's write half.
pub async fn run(state: Arc<Mutex<ServerState>>, mut reader: OwnedReadHalf, slot_idx: usize) {
    let mut recv_buf = RecvBuffer::new();

    let username = match perform_join(&state, &mut reader, &mut recv_buf, slot_idx).await {
        Some(username) => username,
        None => {
            release_slot(&state, slot_idx).await;
            return;
        }
    };

    tracing::info!(slot = slot_idx, %username, "participant joined");
    serve(&state, &mut reader, &mut recv_buf, slot_idx).await;
    disconnect(&state, slot_idx, username).await;
}

/// Reads exactly one `C2S_AUTHENTICATE_AND_JOIN` frame and admits the
/// connection, or returns `None` if the handshake fails for any reason
/// (malformed frame, connection closed, duplicate username).
async fn perform_join(
    state: &Arc<Mutex<ServerState>>,
    reader: &mut OwnedReadHalf,
    recv_buf: &mut RecvBuffer,
    slot_idx: usize,
) -> Option<String> {
    let bytes = match recv_buf.recv_frame(reader).await {
        Ok(bytes) => bytes,
        Err(error) => {
            tracing::debug!(slot = slot_idx, %error, "connection closed before join");
            return None;
        }
    };

    let join = match serde_json::from_slice::<ClientFrame>(&bytes) {
        Ok(ClientFrame::AuthenticateAndJoin(JoinPayload {
            username,
            public_key,
        })) => (username, public_key),
        Ok(_) => {
            tracing::debug!(slot = slot_idx, "first frame was not a join frame");
            return None;
        }
        Err(error) => {
            tracing::debug!(slot = slot_idx, %error, "join frame failed to parse");
            return None;
        }
    };
    let (username, public_key) = join;

    let mut guard = state.lock().await;
    if guard.slot_index_for_username(&username).is_some() {
        tracing::debug!(slot = slot_idx, %username, "rejecting duplicate username");
        return None;
    }

    guard.slots[slot_idx].username = Some(username.clone());
    guard.slots[slot_idx].public_key = Some(public_key);
    guard
        .group
        .push(GroupMember::new(username.clone(), public_key));

    let members = guard.group.clone();
    let notification = ServerFrame::UserNotification(UserNotificationPayload {
        event: UserEvent::Joined,
        username: username.clone(),
    });
    broadcast(&mut guard, &notification.to_json_bytes(), Some(slot_idx)).await;

    let members_list =
        ServerFrame::GroupMembersList(GroupMembersListPayload { members }).to_json_bytes();
    broadcast(&mut guard, &members_list, None).await;

    coordinator::abort(&mut guard);
    if guard.group.len() == 1 {
        coordinator::send_individual_key_reset(&mut guard, slot_idx).await;
    } else {
        coordinator::schedule_epoch_start(Arc::clone(state));
    }

    Some(username)
}

/// Dispatches frames until the connection closes or breaks.
async fn serve(
    state: &Arc<Mutex<ServerState>>,
    reader: &mut OwnedReadHalf,
    recv_buf: &mut RecvBuffer,
    slot_idx: usize,
) {
    loop {
        let bytes = match recv_buf.recv_frame(reader).await {
            Ok(bytes) => bytes,
            Err(WireError::ConnectionClosed) => {
                tracing::debug!(slot = slot_idx, "connection closed");
                return;
            }
            Err(error) => {
                tracing::debug!(slot = slot_idx, %error, "connection broken");
                return;
            }
        };

        let frame = match serde_json::from_slice::<ClientFrame>(&bytes) {
            Ok(frame) => frame,
            Err(error) => {
                tracing::debug!(slot = slot_idx, %error, "dropping malformed frame");
                continue;
            }
        };

        dispatch(state, slot_idx, frame).await;
    }
}

async fn dispatch(state: &Arc<Mutex<ServerState>>, slot_idx: usize, frame: ClientFrame) {
    let mut guard = state.lock().await;
    match frame {
        ClientFrame::AuthenticateAndJoin(_) => {
            tracing::debug!(slot = slot_idx, "dropping repeated join frame");
        }
        ClientFrame::SendGroupMessage(payload) => {
            let Some(sender) = guard.slots[slot_idx].username.clone() else {
                return;
            };
            let out = ServerFrame::BroadcastGroupMessage(crate::wire::frame::BroadcastGroupMessagePayload {
                sender,
                ciphertext: payload.ciphertext,
            })
            .to_json_bytes();
            broadcast(&mut guard, &out, Some(slot_idx)).await;
        }
        ClientFrame::IntermediateValue(payload) => {
            coordinator::handle_intermediate_value(&mut guard, slot_idx, payload.intermediate_value)
                .await;
        }
        ClientFrame::Round2Completed => {
            coordinator::handle_round2_completed(&mut guard, slot_idx).await;
        }
    }
}

async fn disconnect(state: &Arc<Mutex<ServerState>>, slot_idx: usize, username: String) {
    let mut guard = state.lock().await;
    guard.slots[slot_idx].clear();
    guard.group.retain(|m| m.username != username);
    coordinator::abort(&mut guard);

    tracing::info!(slot = slot_idx, %username, "participant disconnected");
    let notification = ServerFrame::UserNotification(UserNotificationPayload {
        event: UserEvent::Disconnected,
        username,
    });
    broadcast(&mut guard, &notification.to_json_bytes(), None).await;

    let members_list = ServerFrame::GroupMembersList(GroupMembersListPayload {
        members: guard.group.clone(),
    })
    .to_json_bytes();
    broadcast(&mut guard, &members_list, None).await;

    match guard.group.len() {
        0 => {}
        1 => {
            let sole_idx = guard
                .slot_index_for_username(&guard.group[0].username.clone())
                .expect("remaining member always has a live slot");
            coordinator::send_individual_key_reset(&mut guard, sole_idx).await;
        }
        _ => coordinator::schedule_epoch_start(Arc::clone(state)),
    }
}

async fn release_slot(state: &Arc<Mutex<ServerState>>, slot_idx: usize) {
    let mut guard = state.lock().await;
    guard.slots[slot_idx].clear();
}

/// Writes the literal "Server is full!" rejection and closes the socket.
/// Called by the acceptor when every slot is occupied.
pub async fn reject_full(mut writer: tokio::net::tcp::OwnedWriteHalf) {
    if let Err(error) = send_frame(&mut writer, SERVER_FULL_MESSAGE).await {
        tracing::debug!(%error, "failed writing server-full rejection");
    }
}
