//! Key-exchange coordinator: the server-side state machine driving the
//! two-round Burmester-Desmedt group key agreement.
//!
//! The machine has three conceptual states -- `Idle`, `AwaitingRound1`,
//! `AwaitingRound2` -- represented implicitly by `ServerState::epoch`
//! (`in_progress`, `round1_completed`, `round2_completed`) rather than as an
//! explicit enum, since every transition is a pure function of those
//! counters against the current group size.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;

use crate::server::broadcaster::{broadcast, send_to};
use crate::server::registry::ServerState;
use crate::wire::frame::{
    IndividualKeyResetPayload, IntermediateValueEntry, ServerFrame, StartRound1Payload,
    StartRound2Payload,
};

/// Pragmatic delay between a membership change and starting the next epoch,
/// giving every participant time to receive the updated members list first.
const MEMBERSHIP_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Unconditionally aborts any in-progress epoch: resets the shared counters
/// and every slot's per-round progress flags. Idempotent when no epoch is
/// running.
pub fn abort(state: &mut ServerState) {
    if state.epoch.in_progress {
        tracing::info!("aborting in-progress key exchange epoch due to membership change");
    }
    state.epoch.reset();
    for slot in state.slots.iter_mut() {
        slot.clear_epoch_progress();
    }
}

/// Schedules an epoch start after the membership-settle delay. Safe to call
/// more than once in quick succession: whichever timer fires first starts
/// the epoch, and every later one finds `in_progress` already true and does
/// nothing.
pub fn schedule_epoch_start(state: Arc<Mutex<ServerState>>) {
    tokio::spawn(async move {
        sleep(MEMBERSHIP_SETTLE_DELAY).await;
        let mut guard = state.lock().await;
        if !guard.epoch.in_progress && guard.group.len() >= 2 {
            start_epoch(&mut guard).await;
        }
    });
}

async fn start_epoch(state: &mut ServerState) {
    state.epoch.in_progress = true;
    state.epoch.round1_completed = 0;
    state.epoch.round2_completed = 0;
    for slot in state.slots.iter_mut() {
        slot.clear_epoch_progress();
    }

    let group_size = state.group.len() as u32;
    tracing::info!(group_size, "starting key exchange round 1");
    let frame = ServerFrame::StartKeyExchangeRound1(StartRound1Payload { group_size });
    broadcast(state, &frame.to_json_bytes(), None).await;
}

/// `AwaitingRound1` transition: `C2S_INTERMEDIATE_VALUE` from `slot_idx`.
/// Frames arriving outside `AwaitingRound1` are logged and dropped, as are
/// duplicate contributions from a slot that already completed round 1.
pub async fn handle_intermediate_value(state: &mut ServerState, slot_idx: usize, value: u64) {
    let awaiting_round1 =
        state.epoch.in_progress && state.epoch.round1_completed < state.group.len();
    if !awaiting_round1 || state.slots[slot_idx].round1_completed {
        tracing::debug!(slot = slot_idx, "dropping out-of-round intermediate value");
        return;
    }

    state.slots[slot_idx].intermediate_value = Some(value);
    state.slots[slot_idx].round1_completed = true;
    state.epoch.round1_completed += 1;

    if state.epoch.round1_completed == state.group.len() {
        start_round2(state).await;
    }
}

async fn start_round2(state: &mut ServerState) {
    let mut entries = Vec::with_capacity(state.group.len());
    for member in &state.group {
        let idx = match state.slot_index_for_username(&member.username) {
            Some(idx) => idx,
            None => {
                // A contributor left between completing round 1 and the
                // server noticing; the disconnect path will have already
                // called `abort`, so this epoch is already dead. Bail out
                // without broadcasting a stale round 2 list.
                tracing::debug!("round2 entry skipped: member left mid-transition");
                return;
            }
        };
        let Some(value) = state.slots[idx].intermediate_value else {
            return;
        };
        entries.push(IntermediateValueEntry {
            username: member.username.clone(),
            intermediate_value: value,
        });
    }

    tracing::info!("starting key exchange round 2");
    let frame = ServerFrame::StartKeyExchangeRound2(StartRound2Payload {
        intermediate_values: entries,
    });
    broadcast(state, &frame.to_json_bytes(), None).await;
}

/// `AwaitingRound2` transition: `C2S_ROUND2_COMPLETED` from `slot_idx`.
pub async fn handle_round2_completed(state: &mut ServerState, slot_idx: usize) {
    let awaiting_round2 =
        state.epoch.in_progress && state.epoch.round1_completed == state.group.len();
    if !awaiting_round2 {
        tracing::debug!(slot = slot_idx, "dropping out-of-round round2-completed");
        return;
    }

    state.epoch.round2_completed += 1;
    if state.epoch.round2_completed == state.group.len() {
        tracing::info!("key exchange epoch completed");
        state.epoch.reset();
        for slot in state.slots.iter_mut() {
            slot.clear_epoch_progress();
        }
        broadcast(state, &ServerFrame::KeyExchangeCompleted.to_json_bytes(), None).await;
    }
}

/// Sent to the sole remaining participant instead of starting an epoch: a
/// group of one never runs the key exchange.
pub async fn send_individual_key_reset(state: &mut ServerState, slot_idx: usize) {
    let frame = ServerFrame::IndividualKeyReset(IndividualKeyResetPayload {
        message: "you are the only participant left; generate a fresh key".to_string(),
    });
    send_to(state, slot_idx, &frame.to_json_bytes()).await;
}
