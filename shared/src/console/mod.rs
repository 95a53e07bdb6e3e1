//! Admin console WebSocket protocol types

pub mod ws;

pub use ws::*;
