//! Channels
//!
//! Outbound chat destinations that call events are relayed into.

pub mod room;

pub use room::*;
