//! The blocking UI-input loop: reads lines from the synchronous `Ui`,
//! encrypts them, and hands the resulting frame to the socket-writer task.
//! Runs via `tokio::task::spawn_blocking` so a blocking `read_line` never
//! stalls the async runtime.

use std::sync::{Arc, Mutex};

use groupchat_core::cipher;
use tokio::sync::mpsc;

use crate::client::participant::SharedParticipant;
use crate::client::ui::{Severity, Ui};
use crate::wire::frame::{ClientFrame, SendGroupMessagePayload};

pub fn run(participant: SharedParticipant, ui: Arc<Mutex<dyn Ui>>, outgoing: mpsc::UnboundedSender<Vec<u8>>) {
    loop {
        let line = {
            let mut guard = ui.lock().unwrap();
            guard.read_line()
        };
        let Some(line) = line else {
            return;
        };
        if line.is_empty() {
            continue;
        }

        ui.lock().unwrap().append(Severity::Chat, &format!("You: {line}"));

        let secret = participant.lock().unwrap().established_secret();
        let Some(secret) = secret else {
            ui.lock()
                .unwrap()
                .append(Severity::Error, "no shared secret established yet; message dropped");
            continue;
        };

        let ciphertext = cipher::encrypt(&line, secret);
        let frame = ClientFrame::SendGroupMessage(SendGroupMessagePayload { ciphertext });
        if outgoing.send(frame.to_json_bytes()).is_err() {
            return;
        }
    }
}
