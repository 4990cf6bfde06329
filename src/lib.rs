//! stenotype
//!
//! Telephony call-control toolkit: builds TwiML call-control documents,
//! validates webhook signatures, places and ends calls over the REST API and
//! relays call transcriptions into a chat room.

pub mod channels;
pub mod cli;
pub mod config;
pub mod logging;
pub mod server;
pub mod voice;
