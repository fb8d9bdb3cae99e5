pub mod chat;
pub mod client;
pub mod form;
pub mod places;
pub mod scheduler;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use client::{ClientConfig, RundezvousClient};
