//! Session registry: a fixed-capacity table of session slots, the group
//! list they back, and the key-exchange epoch counters. All three are
//! guarded by one coarse lock (`ServerState`'s owner holds an
//! `Arc<Mutex<ServerState>>`).

use groupchat_core::GroupMember;
use tokio::net::tcp::OwnedWriteHalf;

/// Fixed session table size.
pub const MAX_CLIENTS: usize = 30;

/// One pre-allocated session container. Empty when `writer` is `None`.
#[derive(Default)]
pub struct Slot {
    pub writer: Option<OwnedWriteHalf>,
    pub username: Option<String>,
    pub public_key: Option<u64>,
    pub round1_completed: bool,
    pub intermediate_value: Option<u64>,
}

impl Slot {
    pub fn is_empty(&self) -> bool {
        self.writer.is_none()
    }

    /// True once the join handshake has populated `username`.
    pub fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    pub fn clear(&mut self) {
        *self = Slot::default();
    }

    pub fn clear_epoch_progress(&mut self) {
        self.round1_completed = false;
        self.intermediate_value = None;
    }
}

/// Key-exchange epoch counters.
#[derive(Default)]
pub struct Epoch {
    pub in_progress: bool,
    pub round1_completed: usize,
    pub round2_completed: usize,
}

impl Epoch {
    pub fn reset(&mut self) {
        self.in_progress = false;
        self.round1_completed = 0;
        self.round2_completed = 0;
    }
}

/// All server-side mutable state shared across the acceptor and every
/// connection worker.
#[derive(Default)]
pub struct ServerState {
    pub slots: Vec<Slot>,
    pub group: Vec<GroupMember>,
    pub epoch: Epoch,
}

impl ServerState {
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(MAX_CLIENTS);
        slots.resize_with(MAX_CLIENTS, Slot::default);
        Self {
            slots,
            group: Vec::new(),
            epoch: Epoch::default(),
        }
    }

    /// Linear scan for the first empty slot, claiming it by storing `writer`
    /// there. Returns `None` if every slot is occupied.
    pub fn claim_slot(&mut self, writer: OwnedWriteHalf) -> Option<usize> {
        let idx = self.slots.iter().position(Slot::is_empty)?;
        self.slots[idx].writer = Some(writer);
        Some(idx)
    }

    pub fn slot_index_for_username(&self, username: &str) -> Option<usize> {
        self.slots
            .iter()
            .position(|s| s.username.as_deref() == Some(username))
    }

    /// Invariant check: non-empty slots equal the group list length.
    #[cfg(test)]
    pub fn non_empty_slot_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}
