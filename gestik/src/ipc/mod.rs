//! S-expression frame stream: input parsing, event output, and the
//! line-oriented server that drives a session.

pub mod dispatch;
pub mod server;

pub use server::{EventInjector, FrameServer};
