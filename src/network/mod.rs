pub mod behavior;
pub mod client;
pub mod handle;
#[cfg(test)]
mod mock;
pub mod topics;
pub mod transport;

pub use client::{NetworkSettings, P2PClient, parse_bootstrap_peers};
pub use handle::{ChatTransport, NetworkHandle};
#[cfg(test)]
pub use mock::MockTransport;
