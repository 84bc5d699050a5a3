//! Read and write rules for advertisements.
//!
//! Everything here is pure: the functions take the facts they need and
//! return a decision, leaving storage and transport to the callers.

pub mod access;
pub mod quota;
pub mod visibility;

pub use access::{Action, Capability, Gate, ADVERTISEMENT_GATE};
pub use quota::{QuotaExceeded, MAX_OPEN_ADVERTISEMENTS};
pub use visibility::Visibility;
