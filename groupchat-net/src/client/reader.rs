//! The async reader task: consumes `ServerFrame`s off the socket, updates
//! participant state, and writes transcript lines to the `Ui`. Replies
//! required by the key-exchange protocol are pushed onto `outgoing` for the
//! dedicated socket-writer task to send.

use std::sync::{Arc, Mutex};

use groupchat_core::cipher;
use tokio::net::tcp::OwnedReadHalf;
use tokio::sync::mpsc;

use crate::client::participant::SharedParticipant;
use crate::client::ui::{Severity, Ui};
use crate::wire::frame::{ClientFrame, IntermediateValuePayload, ServerFrame, UserEvent};
use crate::wire::{RecvBuffer, WireError};

/// Runs the reader loop, continuing from an already-primed `recv_buf` so
/// bytes buffered while reading the post-join frame (a chunked read can
/// pull in part of the next frame too) are never dropped.
pub async fn run(
    mut reader: OwnedReadHalf,
    participant: SharedParticipant,
    ui: Arc<Mutex<dyn Ui>>,
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    mut recv_buf: RecvBuffer,
) {
    loop {
        let bytes = match recv_buf.recv_frame(&mut reader).await {
            Ok(bytes) => bytes,
            Err(WireError::ConnectionClosed) => {
                ui.lock().unwrap().status("disconnected from server");
                return;
            }
            Err(error) => {
                ui.lock()
                    .unwrap()
                    .append(Severity::Error, &format!("connection broken: {error}"));
                return;
            }
        };

        let frame = match serde_json::from_slice::<ServerFrame>(&bytes) {
            Ok(frame) => frame,
            Err(error) => {
                ui.lock()
                    .unwrap()
                    .debug(&format!("dropping malformed server frame: {error}"));
                continue;
            }
        };

        handle(frame, &participant, &ui, &outgoing);
    }
}

/// Applies one server frame to participant state and the transcript.
/// Exposed so the initial post-join frame (read before the reader loop
/// starts) can be applied through the same path as every later one.
pub fn handle(
    frame: ServerFrame,
    participant: &SharedParticipant,
    ui: &Arc<Mutex<dyn Ui>>,
    outgoing: &mpsc::UnboundedSender<Vec<u8>>,
) {
    match frame {
        ServerFrame::UserNotification(payload) => {
            let verb = match payload.event {
                UserEvent::Joined => "joined",
                UserEvent::Disconnected => "left",
            };
            ui.lock()
                .unwrap()
                .append(Severity::System, &format!("{} {verb}", payload.username));
        }
        ServerFrame::GroupMembersList(payload) => {
            let mut state = participant.lock().unwrap();
            state.set_members(payload.members);
            ui.lock().unwrap().status("membership updated, awaiting key exchange");
        }
        ServerFrame::StartKeyExchangeRound1(_payload) => {
            let value = {
                let mut state = participant.lock().unwrap();
                state.compute_round1_value()
            };
            let value = match value {
                Ok(value) => value,
                Err(error) => {
                    ui.lock()
                        .unwrap()
                        .debug(&format!("round1 start received but {error}"));
                    return;
                }
            };
            let frame = ClientFrame::IntermediateValue(IntermediateValuePayload {
                intermediate_value: value,
            });
            let _ = outgoing.send(frame.to_json_bytes());
        }
        ServerFrame::StartKeyExchangeRound2(payload) => {
            let derived = {
                let mut state = participant.lock().unwrap();
                // Align by username rather than trusting the server's list
                // order, per the round-2 entry ordering resolution.
                let mut values = Vec::with_capacity(state.members.len());
                for member in &state.members {
                    if let Some(entry) = payload
                        .intermediate_values
                        .iter()
                        .find(|entry| entry.username == member.username)
                    {
                        values.push(entry.intermediate_value);
                    }
                }
                state.compute_shared_secret(&values)
            };
            if let Err(error) = derived {
                ui.lock()
                    .unwrap()
                    .debug(&format!("round2 values rejected: {error}"));
                return;
            }
            let _ = outgoing.send(ClientFrame::Round2Completed.to_json_bytes());
        }
        ServerFrame::KeyExchangeCompleted => {
            participant.lock().unwrap().mark_established();
            ui.lock().unwrap().status("secure group channel established");
        }
        ServerFrame::IndividualKeyReset(payload) => {
            participant.lock().unwrap().individual_key_reset();
            ui.lock().unwrap().append(Severity::System, &payload.message);
        }
        ServerFrame::BroadcastGroupMessage(payload) => {
            let secret = participant.lock().unwrap().established_secret();
            let Some(secret) = secret else {
                ui.lock()
                    .unwrap()
                    .debug("received a group message with no established shared secret");
                return;
            };
            match cipher::decrypt(&payload.ciphertext, secret) {
                Ok(plaintext) => ui
                    .lock()
                    .unwrap()
                    .append(Severity::Chat, &format!("{}: {plaintext}", payload.sender)),
                Err(error) => ui
                    .lock()
                    .unwrap()
                    .append(Severity::Error, &format!("failed to decrypt message from {}: {error}", payload.sender)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::participant::ParticipantState;
    use crate::wire::frame::{IntermediateValueEntry, StartRound2Payload};
    use groupchat_core::GroupMember;

    #[derive(Default)]
    struct RecordingUi {
        debug_lines: Vec<String>,
    }

    impl Ui for RecordingUi {
        fn status(&mut self, _text: &str) {}
        fn append(&mut self, _severity: Severity, _text: &str) {}
        fn read_line(&mut self) -> Option<String> {
            None
        }
        fn debug(&mut self, text: &str) {
            self.debug_lines.push(text.to_string());
        }
    }

    #[test]
    fn round2_aligns_intermediate_values_by_username_not_list_order() {
        let mut alice = ParticipantState::new("alice");
        let mut bob = ParticipantState::new("bob");
        let members = vec![
            GroupMember::new("alice", alice.public_key),
            GroupMember::new("bob", bob.public_key),
        ];
        alice.set_members(members.clone());
        bob.set_members(members.clone());
        let a_value = alice.compute_round1_value().unwrap();
        let b_value = bob.compute_round1_value().unwrap();

        // The server lists bob before alice here, the reverse of
        // `members`' order; alignment must still be correct.
        let round2 = ServerFrame::StartKeyExchangeRound2(StartRound2Payload {
            intermediate_values: vec![
                IntermediateValueEntry {
                    username: "bob".into(),
                    intermediate_value: b_value,
                },
                IntermediateValueEntry {
                    username: "alice".into(),
                    intermediate_value: a_value,
                },
            ],
        });

        // Bob's own array is built in his own members-list order (alice,
        // bob) regardless of the order the server sent; this is the
        // reference value alice's reconstruction must agree with.
        let bob_secret = bob.compute_shared_secret(&[a_value, b_value]).unwrap();

        let participant: SharedParticipant = Arc::new(Mutex::new(alice));
        let ui: Arc<Mutex<dyn Ui>> = Arc::new(Mutex::new(RecordingUi::default()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle(round2, &participant, &ui, &tx);

        let sent = rx.try_recv().expect("round2-completed was queued");
        let frame: ClientFrame = serde_json::from_slice(&sent).unwrap();
        assert!(matches!(frame, ClientFrame::Round2Completed));

        assert_eq!(participant.lock().unwrap().shared_secret, Some(bob_secret));
    }

    #[test]
    fn round1_with_membership_missing_self_reports_debug_and_sends_nothing() {
        let participant: SharedParticipant = Arc::new(Mutex::new(ParticipantState::new("ghost")));
        participant.lock().unwrap().set_members(vec![
            GroupMember::new("alice", 10),
            GroupMember::new("bob", 20),
        ]);
        let ui_concrete = Arc::new(Mutex::new(RecordingUi::default()));
        let ui: Arc<Mutex<dyn Ui>> = ui_concrete.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();

        handle(
            ServerFrame::StartKeyExchangeRound1(crate::wire::frame::StartRound1Payload {
                group_size: 2,
            }),
            &participant,
            &ui,
            &tx,
        );

        assert!(rx.try_recv().is_err());
        assert_eq!(
            ui_concrete.lock().unwrap().debug_lines.len(),
            1,
            "the failure must be surfaced on the debug channel, not silently dropped"
        );
    }

    #[test]
    fn broadcast_message_is_ignored_before_key_exchange_completed() {
        let mut alice = ParticipantState::new("alice");
        let mut bob = ParticipantState::new("bob");
        let members = vec![
            GroupMember::new("alice", alice.public_key),
            GroupMember::new("bob", bob.public_key),
        ];
        alice.set_members(members.clone());
        bob.set_members(members);
        let a_value = alice.compute_round1_value().unwrap();
        let b_value = bob.compute_round1_value().unwrap();
        let secret = alice.compute_shared_secret(&[a_value, b_value]).unwrap();

        let ciphertext = cipher::encrypt("hi", secret);
        let message = ServerFrame::BroadcastGroupMessage(crate::wire::frame::BroadcastGroupMessagePayload {
            sender: "bob".into(),
            ciphertext,
        });

        let participant: SharedParticipant = Arc::new(Mutex::new(alice));
        let ui_concrete = Arc::new(Mutex::new(RecordingUi::default()));
        let ui: Arc<Mutex<dyn Ui>> = ui_concrete.clone();
        let (tx, _rx) = mpsc::unbounded_channel();

        // The secret is already derived from round 2, but the epoch has not
        // been confirmed complete yet; the message must be dropped.
        handle(message, &participant, &ui, &tx);

        assert_eq!(
            ui_concrete.lock().unwrap().debug_lines.len(),
            1,
            "a message arriving before S2C_KEY_EXCHANGE_COMPLETED must not be decrypted"
        );

        handle(ServerFrame::KeyExchangeCompleted, &participant, &ui, &tx);
        assert!(participant.lock().unwrap().established_secret().is_some());
    }
}
