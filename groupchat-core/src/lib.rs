//! Crypto core for the encrypted group chat protocol: modular arithmetic,
//! the Burmester-Desmedt group key exchange, and the symmetric layer keyed by
//! its output. No networking lives here; see `groupchat-net`.

pub mod bd;
pub mod cipher;
pub mod errors;
pub mod keys;
pub mod member;
pub mod modmath;
pub mod params;

pub use bd::{intermediate_value, shared_secret};
pub use errors::CoreError;
pub use keys::{gen_private, gen_public};
pub use member::GroupMember;
pub use modmath::{mod_exp, mod_inverse};
pub use params::{G, P};
