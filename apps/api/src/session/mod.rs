//! Session identity: persisted ids and tokens, the bootstrap flow that
//! resolves them, and the event bus that announces transitions.

pub mod bootstrap;
pub mod events;
pub mod handlers;
pub mod store;
