//! # Orbit Uplink Crate
//!
//! Client-side piece transfer for the Orbit network. The uplink asks the
//! satellite for placement candidates and a bandwidth allocation, then
//! drives a streaming session against each chosen storage node through
//! [`psclient::PieceStore`], signing a receipt for every chunk moved.

pub mod psclient;

pub use psclient::{Config, Error, PieceRanger, PieceStore};
