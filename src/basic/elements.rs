//! Device records of the network model.
//!
//! Devices refer to their buses by [`BusId`] only; the [`Network`](super::network::Network)
//! resolves ids to global indices.
mod branch;
mod bus;
mod capability;
mod injection;

pub use branch::*;
pub use bus::*;
pub use capability::*;
pub use injection::*;
