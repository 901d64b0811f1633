//! The coordinator/participant server split: `acceptor` takes connections,
//! `handler` drives each one, `coordinator` runs the key-exchange epoch
//! state machine, `broadcaster` fans frames out, and `registry` holds the
//! shared session table.

pub mod acceptor;
pub mod broadcaster;
pub mod cli;
pub mod coordinator;
pub mod handler;
pub mod registry;

pub use registry::ServerState;
