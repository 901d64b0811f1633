//! The client side: a three-task split around one `ParticipantState` -- an
//! async reader, a blocking UI-input writer, and a dedicated socket-writer
//! that's the sole owner of the write half.

pub mod cli;
pub mod participant;
pub mod reader;
pub mod sender;
pub mod ui;
pub mod writer;

pub use participant::{ParticipantState, SharedParticipant};
pub use ui::{Severity, StdioUi, Ui};
