//! Subscription streams handed to clients

mod streams;

pub use streams::{MessageStream, StateStream};
