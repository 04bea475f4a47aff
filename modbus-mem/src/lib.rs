//! Device memory of a Modbus slave.
//!
//! The memory consists of four independent banks (coils, discrete inputs, holding registers and
//! input registers). Every bank reserves its first slot as an unused sentinel, so the protocol
//! address `A` is always stored at the internal index `A + 1`.

mod access;
mod bank;
mod error;
mod kind;
mod layout;
mod map;
mod notify;

pub mod slice;

pub use access::{Access, Data};
pub use bank::{Bank, Element};
pub use error::Error;
pub use kind::{BankKind, Discrete, Register, Selector};
pub use layout::{Layout, MAX_USABLE};
pub use map::{DeviceMap, WritePolicy};
pub use notify::{Hook, HookId, Observer};
