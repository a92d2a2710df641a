//! Command protocol.
//!
//! Request/response handling over a word-oriented link: one command code and
//! one data word per transaction.

mod handler;
mod link;

pub use handler::{status_word, HandlerState, ProtocolHandler};
pub use link::LinkInput;
